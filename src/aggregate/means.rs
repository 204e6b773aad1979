//! Numeric aggregates (means and histograms) over a cleaned dataset.

use std::collections::{BTreeMap, HashMap};

use crate::aggregate::counts::resolve_columns;
use crate::domain::CleanedDataset;
use crate::error::AppError;

/// Mean of a numeric column for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: Vec<String>,
    pub mean: f64,
    pub n: u64,
}

/// Equal-width histogram of a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `bins.len()` equal-width buckets over `[min, max]`; the last bucket is closed.
    pub bins: Vec<u64>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        if self.bins.is_empty() {
            0.0
        } else {
            (self.max - self.min) / self.bins.len() as f64
        }
    }
}

/// Mean of `value_column` per distinct tuple of `group_columns`.
///
/// Ordered by descending mean, ties by ascending key.
pub fn mean_by(
    dataset: &CleanedDataset,
    group_columns: &[&str],
    value_column: &str,
) -> Result<Vec<GroupMean>, AppError> {
    let group_idx = resolve_columns(dataset, group_columns)?;
    let value_idx = resolve_columns(dataset, &[value_column])?[0];

    let mut acc: HashMap<Vec<&str>, (f64, u64)> = HashMap::new();
    for record in &dataset.records {
        let v = parse_numeric(&record.fields[value_idx], value_column)?;
        let key: Vec<&str> = group_idx.iter().map(|&i| record.fields[i].as_str()).collect();
        let entry = acc.entry(key).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    let mut out: Vec<GroupMean> = acc
        .into_iter()
        .map(|(key, (sum, n))| GroupMean {
            key: key.into_iter().map(str::to_string).collect(),
            mean: sum / n as f64,
            n,
        })
        .collect();
    out.sort_by(|a, b| {
        b.mean
            .partial_cmp(&a.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(out)
}

/// Mean of `value_column` per model year, ascending by year.
pub fn mean_by_year(dataset: &CleanedDataset, value_column: &str) -> Result<BTreeMap<i32, f64>, AppError> {
    let value_idx = resolve_columns(dataset, &[value_column])?[0];

    let mut acc: BTreeMap<i32, (f64, u64)> = BTreeMap::new();
    for record in &dataset.records {
        let v = parse_numeric(&record.fields[value_idx], value_column)?;
        let entry = acc.entry(record.model_year).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    Ok(acc.into_iter().map(|(year, (sum, n))| (year, sum / n as f64)).collect())
}

/// Histogram of `value_column` with `bins` equal-width buckets.
///
/// Returns `None` for an empty dataset or `bins == 0`.
pub fn histogram(dataset: &CleanedDataset, value_column: &str, bins: usize) -> Result<Option<Histogram>, AppError> {
    let value_idx = resolve_columns(dataset, &[value_column])?[0];
    let values = dataset
        .records
        .iter()
        .map(|r| parse_numeric(&r.fields[value_idx], value_column))
        .collect::<Result<Vec<f64>, AppError>>()?;

    if values.is_empty() || bins == 0 {
        return Ok(None);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let mut counts = vec![0u64; bins];
    let span = max - min;
    for v in values {
        let i = if span > 0.0 {
            (((v - min) / span) * bins as f64).floor() as usize
        } else {
            0
        };
        counts[i.min(bins - 1)] += 1;
    }

    Ok(Some(Histogram {
        min,
        max,
        mean,
        bins: counts,
    }))
}

fn parse_numeric(cell: &str, column: &str) -> Result<f64, AppError> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::data_format(format!(
            "Non-numeric value '{cell}' in column `{column}`."
        ))),
    }
}
