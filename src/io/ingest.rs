//! CSV ingest and cleaning.
//!
//! This module turns a registration-activity CSV into a `CleanedDataset`:
//! every row with an absent cell (in any column) is dropped, and the model
//! year of each surviving row is parsed.
//!
//! Design goals:
//! - **Strict table shape**: ragged rows, a missing header or a missing
//!   `model_year` column are `DataFormat` errors, with no partial result
//! - **All-or-nothing row filter**: one absent cell anywhere drops the row
//! - **Deterministic behavior**: output order follows input order
//! - **Separation of concerns**: no aggregation or fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::domain::{CleanedDataset, IngestStats, MODEL_YEAR_COLUMN, RawRow, RawTable, RegistrationRecord};
use crate::error::{AppError, ErrorKind};

/// Cell values treated as absent, in addition to blank cells.
///
/// These are the conventional NA markers emitted by spreadsheet and dataframe
/// tools when exporting nulls.
const NA_MARKERS: [&str; 14] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A", "#NA",
    "#N/A N/A",
];

/// Read and clean a dataset file.
pub fn load_dataset(path: &Path) -> Result<CleanedDataset, AppError> {
    let table = read_table_path(path)?;
    let dataset = clean(&table)?;

    info!(
        "loaded '{}': rows_read={} rows_dropped={} rows_used={}",
        path.display(),
        dataset.stats.rows_read,
        dataset.stats.rows_dropped,
        dataset.stats.rows_used
    );
    if dataset.stats.rows_dropped > 0 {
        warn!(
            "dropped {} of {} rows with at least one missing field",
            dataset.stats.rows_dropped, dataset.stats.rows_read
        );
    }

    Ok(dataset)
}

/// Open `path` and parse it as CSV.
pub fn read_table_path(path: &Path) -> Result<RawTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open CSV '{}': {e}", path.display()),
        )
    })?;
    read_table(file)
}

/// Parse CSV from any reader into a `RawTable`.
///
/// The first record is the header. Every subsequent record must have exactly
/// as many fields as the header.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_format(format!("Failed to read CSV headers: {e}")))?
        .clone();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::data_format("CSV has no header row."));
    }

    let headers: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data_format(format!("CSV parse error on line {line}: {e}")))?;

        let cells = record
            .iter()
            .map(|cell| if is_missing(cell) { None } else { Some(cell.to_string()) })
            .collect();
        rows.push(RawRow { line, cells });
    }

    Ok(RawTable { headers, rows })
}

/// Drop every row with an absent cell and parse model years.
///
/// An empty result is valid; it is the forecaster's job to reject it.
pub fn clean(table: &RawTable) -> Result<CleanedDataset, AppError> {
    let year_idx = table.column_index(MODEL_YEAR_COLUMN).ok_or_else(|| {
        AppError::data_format(format!(
            "Missing required column: `{MODEL_YEAR_COLUMN}` (e.g. a `Model Year` header)."
        ))
    })?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut rows_dropped = 0usize;

    for row in &table.rows {
        if !row.is_complete() {
            rows_dropped += 1;
            continue;
        }

        let fields: Vec<String> = row.cells.iter().flatten().cloned().collect();
        let raw_year = &fields[year_idx];
        let model_year = parse_model_year(raw_year).ok_or_else(|| {
            AppError::data_format(format!(
                "Invalid model year '{raw_year}' on line {} (expected an integer year).",
                row.line
            ))
        })?;

        records.push(RegistrationRecord { model_year, fields });
    }

    let stats = IngestStats {
        rows_read: table.rows.len(),
        rows_dropped,
        rows_used: records.len(),
    };

    Ok(CleanedDataset {
        headers: table.headers.clone(),
        records,
        stats,
    })
}

/// Normalize a header to `snake_case` so that `Model Year`, `model_year` and
/// `MODEL-YEAR` all address the same column.
pub fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, column lookup silently fails.
    let name = name.trim().trim_start_matches('\u{feff}');

    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || NA_MARKERS.contains(&cell)
}

fn parse_model_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }

    // Some exports write integer columns as floats (`2019.0`) once a null has
    // been seen in the column. Accept those, but only when integral.
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}Model Year,Make,Electric Range,County\n\
                       2020,TESLA,308,King\n\
                       2021,NISSAN,,Pierce\n\
                       2019.0,KIA,239,NA\n\
                       2022,FORD,230,Snohomish\n";

    #[test]
    fn headers_are_normalized() {
        assert_eq!(normalize_header_name("\u{feff} Model Year "), "model_year");
        assert_eq!(normalize_header_name("Clean Alternative Fuel Vehicle Type"), "clean_alternative_fuel_vehicle_type");
        assert_eq!(normalize_header_name("DOL-Vehicle  ID"), "dol_vehicle_id");
    }

    #[test]
    fn clean_drops_rows_with_any_missing_field() {
        let table = read_table(CSV.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["model_year", "make", "electric_range", "county"]);
        assert_eq!(table.rows.len(), 4);

        let dataset = clean(&table).unwrap();
        let years: Vec<i32> = dataset.records.iter().map(|r| r.model_year).collect();
        assert_eq!(years, vec![2020, 2022]);
        assert_eq!(
            dataset.stats,
            IngestStats {
                rows_read: 4,
                rows_dropped: 2,
                rows_used: 2
            }
        );
        assert_eq!(dataset.records[0].fields, vec!["2020", "TESLA", "308", "King"]);
    }

    #[test]
    fn integral_float_years_are_accepted() {
        let csv = "model_year,make\n2019.0,KIA\n";
        let dataset = clean(&read_table(csv.as_bytes()).unwrap()).unwrap();
        assert_eq!(dataset.records[0].model_year, 2019);
    }

    #[test]
    fn ragged_rows_are_a_data_format_error() {
        let csv = "model_year,make\n2020,TESLA\n2021\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn missing_model_year_column_is_a_data_format_error() {
        let table = read_table("make,model\nTESLA,MODEL 3\n".as_bytes()).unwrap();
        let err = clean(&table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn non_integer_year_is_a_data_format_error() {
        let table = read_table("model_year,make\n2020.5,TESLA\n".as_bytes()).unwrap();
        let err = clean(&table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.message().contains("line 2"));
    }

    #[test]
    fn empty_input_is_a_data_format_error() {
        let err = read_table("".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn fully_incomplete_table_cleans_to_empty_dataset() {
        let table = read_table("model_year,make\n2020,\n,KIA\n".as_bytes()).unwrap();
        let dataset = clean(&table).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.stats.rows_dropped, 2);
    }
}
