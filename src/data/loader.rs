use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::error::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{AqiCategory, Dataset, Hemisphere, Record, REQUIRED_COLUMNS};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read or parsed.
    #[error("{source_name}: data unavailable: {cause}")]
    DataUnavailable {
        source_name: String,
        #[source]
        cause: BoxError,
    },
    /// One or more required columns are absent.
    #[error("missing required columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}

fn unavailable(source_name: &str, cause: impl Into<BoxError>) -> LoadError {
    LoadError::DataUnavailable {
        source_name: source_name.to_string(),
        cause: cause.into(),
    }
}

fn schema_mismatch(missing: impl IntoIterator<Item = usize>) -> LoadError {
    LoadError::SchemaMismatch {
        missing: missing
            .into_iter()
            .map(|i| REQUIRED_COLUMNS[i].to_string())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an air quality table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the source column names (also the fallback)
/// * `.json`    – `[{ "Country": "...", "lat": 1.0, ... }, ...]`
/// * `.parquet` – one column per source column
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let source_name = path.display().to_string();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, &source_name),
        "json" => load_json(path, &source_name),
        _ => {
            let file =
                std::fs::File::open(path).map_err(|e| unavailable(&source_name, e))?;
            load_csv_reader(file, &source_name)
        }
    }?;

    log::info!("Loaded {} records from {source_name}", dataset.len());
    Ok(dataset)
}

/// Load a CSV table from any reader. `source_name` only labels errors.
pub fn load_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| unavailable(source_name, e))?
        .clone();

    let lookup: Vec<Option<usize>> = REQUIRED_COLUMNS
        .iter()
        .map(|col| headers.iter().position(|h| h == *col))
        .collect();
    let missing: Vec<usize> = lookup
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_none())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(schema_mismatch(missing));
    }
    let positions: Vec<usize> = lookup.into_iter().flatten().collect();

    let mut cleaner = Cleaner::new(source_name);
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| unavailable(source_name, e))?;
        let cells = positions
            .iter()
            .map(|&idx| match record.get(idx) {
                Some(text) => Cell::Text(text.to_string()),
                None => Cell::Missing,
            })
            .collect();
        cleaner.push(RawRow { row, cells })?;
    }
    Ok(cleaner.finish())
}

// ---------------------------------------------------------------------------
// Cleaning shared by every format
// ---------------------------------------------------------------------------

/// A single source cell before type coercion.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Missing,
    Text(String),
    Number(f64),
}

/// One source row, cells ordered like `REQUIRED_COLUMNS`.
struct RawRow {
    row: usize,
    cells: Vec<Cell>,
}

struct Cleaner<'s> {
    source_name: &'s str,
    records: Vec<Record>,
    dropped: usize,
}

impl<'s> Cleaner<'s> {
    fn new(source_name: &'s str) -> Self {
        Cleaner {
            source_name,
            records: Vec::new(),
            dropped: 0,
        }
    }

    /// Coerce a raw row and keep it if it names a country.
    fn push(&mut self, raw: RawRow) -> Result<(), LoadError> {
        let RawRow { row, cells } = raw;
        let source_name = self.source_name;
        let [country, city, lat, lng, aqi, category, pm25, co, ozone, no2]: [Cell; 10] =
            cells.try_into().map_err(|_| {
                unavailable(source_name, format!("row {row}: wrong number of cells"))
            })?;

        let Some(country) = text(country).filter(|c| !c.is_empty()) else {
            self.dropped += 1;
            return Ok(());
        };

        let num = |cell: Cell, col: usize| -> Result<Option<f64>, LoadError> {
            number(cell).map_err(|bad| {
                unavailable(
                    source_name,
                    format!(
                        "row {row}, column '{}': '{bad}' is not a number",
                        REQUIRED_COLUMNS[col]
                    ),
                )
            })
        };

        // Rows that cannot be placed on the map are skipped, not fatal.
        let (Some(latitude), Some(longitude)) = (num(lat, 2)?, num(lng, 3)?) else {
            log::warn!("{source_name}: row {row} ({country}) has no coordinates, skipping");
            self.dropped += 1;
            return Ok(());
        };
        let aqi_value = num(aqi, 4)?.map(|v| {
            if v.fract() != 0.0 {
                log::debug!("row {row}: rounding AQI value {v}");
            }
            v.round() as i64
        });
        let category = text(category)
            .filter(|label| !label.is_empty())
            .and_then(|label| match label.parse::<AqiCategory>() {
                Ok(cat) => Some(cat),
                Err(e) => {
                    log::debug!("row {row}: {e}");
                    None
                }
            });

        self.records.push(Record {
            country,
            city: text(city).unwrap_or_default(),
            latitude,
            longitude,
            aqi_value,
            category,
            pm25_aqi_value: num(pm25, 6)?,
            co_aqi_value: num(co, 7)?,
            ozone_aqi_value: num(ozone, 8)?,
            no2_aqi_value: num(no2, 9)?,
            hemisphere: Hemisphere::from_latitude(latitude),
        });
        Ok(())
    }

    fn finish(self) -> Dataset {
        if self.dropped > 0 {
            log::info!(
                "{}: dropped {} rows without a country or coordinates",
                self.source_name,
                self.dropped
            );
        }
        Dataset::from_records(self.records)
    }
}

/// Trimmed text of a cell; empty text counts as present here and is
/// filtered by the caller where it matters.
fn text(cell: Cell) -> Option<String> {
    match cell {
        Cell::Missing => None,
        Cell::Text(s) => Some(s.trim().to_string()),
        Cell::Number(v) => Some(v.to_string()),
    }
}

/// Numeric value of a cell. Blank text and NaN are missing; anything else
/// that does not parse is returned as the offending text.
fn number(cell: Cell) -> Result<Option<f64>, String> {
    match cell {
        Cell::Missing => Ok(None),
        Cell::Number(v) if v.is_nan() => Ok(None),
        Cell::Number(v) => Ok(Some(v)),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("nan") {
                return Ok(None);
            }
            s.parse::<f64>().map(Some).map_err(|_| s.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Country": "India", "City": "Delhi", "lat": 28.6, "lng": 77.2,
///     "AQI Value": 180, "AQI Category": "Unhealthy", ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path, source_name: &str) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| unavailable(source_name, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| unavailable(source_name, e))?;
    let records = root
        .as_array()
        .ok_or_else(|| unavailable(source_name, "expected top-level JSON array"))?;

    let mut missing = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());
    for (row, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| unavailable(source_name, format!("row {row} is not a JSON object")))?;
        let cells = REQUIRED_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| match obj.get(*col) {
                Some(val) => json_to_cell(val),
                None => {
                    missing.insert(i);
                    Cell::Missing
                }
            })
            .collect();
        rows.push(RawRow { row, cells });
    }
    if !missing.is_empty() {
        return Err(schema_mismatch(missing));
    }

    let mut cleaner = Cleaner::new(source_name);
    for raw in rows {
        cleaner.push(raw)?;
    }
    Ok(cleaner.finish())
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::Missing,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n
            .as_f64()
            .map_or_else(|| Cell::Text(n.to_string()), Cell::Number),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per source column.
///
/// String columns may be Utf8, LargeUtf8 or Utf8View; numeric columns any
/// of Int32/Int64/Float32/Float64. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, source_name: &str) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| unavailable(source_name, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| unavailable(source_name, e))?;

    let schema = builder.schema().clone();
    let missing: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .enumerate()
        .filter(|(_, col)| schema.index_of(col).is_err())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(schema_mismatch(missing));
    }

    let reader = builder.build().map_err(|e| unavailable(source_name, e))?;
    let mut cleaner = Cleaner::new(source_name);
    let mut row = 0;

    for batch_result in reader {
        let batch = batch_result.map_err(|e| unavailable(source_name, e))?;
        let columns: Vec<ArrayRef> = REQUIRED_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let array = batch.column_by_name(col).ok_or_else(|| schema_mismatch([i]))?;
                decode_dictionary(array).map_err(|e| unavailable(source_name, e))
            })
            .collect::<Result<_, _>>()?;

        for batch_row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .map(|col| arrow_cell(col, batch_row))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| unavailable(source_name, format!("row {row}: {e}")))?;
            cleaner.push(RawRow { row, cells })?;
            row += 1;
        }
    }

    Ok(cleaner.finish())
}

/// Categorical columns (pandas `category` dtype) arrive dictionary-encoded;
/// expand them to their value type once per batch.
fn decode_dictionary(col: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    match col.data_type() {
        DataType::Dictionary(_, value_type) => cast(col.as_ref(), value_type),
        _ => Ok(Arc::clone(col)),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<Cell, String> {
    if col.is_null(row) {
        return Ok(Cell::Missing);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => Cell::Text(col.as_string_view().value(row).to_string()),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        other => return Err(format!("unsupported column type {other:?}")),
    };
    Ok(cell)
}
