use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// EPA breakpoints.
fn category_for(aqi: i64) -> &'static str {
    match aqi {
        i64::MIN..=50 => "Good",
        51..=100 => "Moderate",
        101..=150 => "Unhealthy for Sensitive Groups",
        151..=200 => "Unhealthy",
        201..=300 => "Very Unhealthy",
        _ => "Hazardous",
    }
}

/// One output row, serialized with the source column names.
#[derive(Serialize)]
struct Row {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "AQI Value")]
    aqi_value: i64,
    #[serde(rename = "AQI Category")]
    aqi_category: &'static str,
    #[serde(rename = "CO AQI Value")]
    co: i64,
    #[serde(rename = "Ozone AQI Value")]
    ozone: i64,
    #[serde(rename = "NO2 AQI Value")]
    no2: i64,
    #[serde(rename = "PM2.5 AQI Value")]
    pm25: Option<i64>,
    lat: f64,
    lng: f64,
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // (country, centre lat, centre lng, typical AQI)
    let countries: [(&str, f64, f64, f64); 8] = [
        ("United States of America", 39.0, -98.0, 55.0),
        ("China", 33.0, 108.0, 130.0),
        ("India", 22.0, 79.0, 170.0),
        ("Brazil", -12.0, -51.0, 50.0),
        ("Germany", 51.0, 10.0, 45.0),
        ("Nigeria", 9.0, 8.0, 110.0),
        ("Australia", -25.0, 134.0, 30.0),
        ("Ecuador", 0.0, -78.5, 40.0),
    ];
    let cities_per_country = 25;

    let mut rows = Vec::new();
    for &(country, lat, lng, typical) in &countries {
        for i in 0..cities_per_country {
            let aqi = rng.gauss(typical, typical * 0.35).round().clamp(1.0, 500.0) as i64;
            let pm25 = (aqi as f64 * rng.gauss(0.95, 0.05)).round().max(0.0) as i64;
            rows.push(Row {
                country: country.to_string(),
                city: format!("{country} City {i}"),
                aqi_value: aqi,
                aqi_category: category_for(aqi),
                co: rng.gauss(1.5, 1.0).round().max(0.0) as i64,
                ozone: rng.gauss(35.0, 12.0).round().max(0.0) as i64,
                no2: rng.gauss(4.0, 4.0).round().max(0.0) as i64,
                // Every 10th city lacks a PM2.5 reading.
                pm25: (i % 10 != 9).then_some(pm25),
                lat: lat + rng.gauss(0.0, 4.0),
                lng: lng + rng.gauss(0.0, 6.0),
            });
        }
    }
    // A row without a country, dropped on load.
    rows.push(Row {
        country: String::new(),
        city: "Nowhere".to_string(),
        aqi_value: 20,
        aqi_category: "Good",
        co: 1,
        ozone: 20,
        no2: 0,
        pm25: Some(20),
        lat: 0.0,
        lng: 0.0,
    });

    write_csv("sample_aqi.csv", &rows)?;
    write_parquet("sample_aqi.parquet", &rows)?;

    println!(
        "Wrote {} rows ({} countries) to sample_aqi.csv and sample_aqi.parquet",
        rows.len(),
        countries.len()
    );
    Ok(())
}

fn write_csv(output_path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path).context("creating CSV output")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_parquet(output_path: &str, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Country", DataType::Utf8, true),
        Field::new("City", DataType::Utf8, false),
        Field::new("AQI Value", DataType::Int64, false),
        Field::new("AQI Category", DataType::Utf8, false),
        Field::new("CO AQI Value", DataType::Int64, false),
        Field::new("Ozone AQI Value", DataType::Int64, false),
        Field::new("NO2 AQI Value", DataType::Int64, false),
        Field::new("PM2.5 AQI Value", DataType::Int64, true),
        Field::new("lat", DataType::Float64, false),
        Field::new("lng", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter(
            rows.iter()
                .map(|r| Some(r.country.as_str()).filter(|c| !c.is_empty())),
        )),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.city.as_str()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.aqi_value))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.aqi_category))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.co))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.ozone))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.no2))),
        Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.pm25))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.lat))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.lng))),
    ];

    let batch =
        RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(output_path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}
