use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_COUNTRY: &str = "Country";
pub const COL_CITY: &str = "City";
pub const COL_LAT: &str = "lat";
pub const COL_LNG: &str = "lng";
pub const COL_AQI_VALUE: &str = "AQI Value";
pub const COL_AQI_CATEGORY: &str = "AQI Category";
pub const COL_PM25: &str = "PM2.5 AQI Value";
pub const COL_CO: &str = "CO AQI Value";
pub const COL_OZONE: &str = "Ozone AQI Value";
pub const COL_NO2: &str = "NO2 AQI Value";

/// Columns every source table must carry, in the order they are reported
/// when missing.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_COUNTRY,
    COL_CITY,
    COL_LAT,
    COL_LNG,
    COL_AQI_VALUE,
    COL_AQI_CATEGORY,
    COL_PM25,
    COL_CO,
    COL_OZONE,
    COL_NO2,
];

// ---------------------------------------------------------------------------
// AqiCategory
// ---------------------------------------------------------------------------

/// Severity bucket as supplied by the source data. Serialized with the
/// source labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitive,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitive,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Label used in the source table.
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown AQI category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for AqiCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AqiCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Hemisphere
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hemisphere {
    Northern,
    Southern,
}

impl Hemisphere {
    /// `0.0` belongs to the northern hemisphere.
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude >= 0.0 {
            Hemisphere::Northern
        } else {
            Hemisphere::Southern
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::Northern => f.write_str("Northern"),
            Hemisphere::Southern => f.write_str("Southern"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pollutant
// ---------------------------------------------------------------------------

/// The four pollutant sub-indices, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pollutant {
    Co,
    Ozone,
    No2,
    Pm25,
}

impl Pollutant {
    pub const ALL: [Pollutant; 4] = [
        Pollutant::Co,
        Pollutant::Ozone,
        Pollutant::No2,
        Pollutant::Pm25,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Pollutant::Co => COL_CO,
            Pollutant::Ozone => COL_OZONE,
            Pollutant::No2 => COL_NO2,
            Pollutant::Pm25 => COL_PM25,
        }
    }

    /// Read this pollutant's sub-index from a record.
    pub fn value_in(self, record: &Record) -> Option<f64> {
        match self {
            Pollutant::Co => record.co_aqi_value,
            Pollutant::Ozone => record.ozone_aqi_value,
            Pollutant::No2 => record.no2_aqi_value,
            Pollutant::Pm25 => record.pm25_aqi_value,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// One city measurement. `None` marks a value missing in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi_value: Option<i64>,
    /// `None` when the source label is empty or not one of the known six.
    pub category: Option<AqiCategory>,
    pub pm25_aqi_value: Option<f64>,
    pub co_aqi_value: Option<f64>,
    pub ozone_aqi_value: Option<f64>,
    pub no2_aqi_value: Option<f64>,
    /// Derived from `latitude` at load time.
    pub hemisphere: Hemisphere,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The cleaned table. Never mutated after construction; share it through
/// `Arc<Dataset>`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Sorted unique country names.
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
