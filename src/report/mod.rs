//! Reporting utilities: the exploratory summary and formatted terminal output.

use std::collections::BTreeMap;

use crate::aggregate::{
    GroupCount, GroupMean, Histogram, group_counts, histogram, mean_by, mean_by_year, top_models_for_top_makes,
    value_counts, yearly_counts,
};
use crate::domain::{CleanedDataset, IngestStats, YearlyCounts};
use crate::error::AppError;

pub mod format;

pub use format::*;

/// Normalized column names of the registration dataset used by the summary.
pub mod columns {
    pub const COUNTY: &str = "county";
    pub const CITY: &str = "city";
    pub const MAKE: &str = "make";
    pub const MODEL: &str = "model";
    pub const ELECTRIC_RANGE: &str = "electric_range";
    pub const EV_TYPE: &str = "clean_alternative_fuel_vehicle_type";
}

/// An aggregate that may be unavailable (e.g. the column is absent).
pub type Section<T> = Result<T, String>;

/// Exploratory aggregates over a cleaned dataset.
#[derive(Debug, Clone)]
pub struct ExploratorySummary {
    pub stats: IngestStats,
    pub top_n: usize,
    pub yearly: YearlyCounts,
    pub ev_types: Section<Vec<(String, u64)>>,
    pub counties: Section<Vec<(String, u64)>>,
    pub cities: Section<Vec<GroupCount>>,
    pub makes: Section<Vec<(String, u64)>>,
    pub top_models: Section<Vec<GroupCount>>,
    pub range_by_model: Section<Vec<GroupMean>>,
    pub range_by_year: Section<BTreeMap<i32, f64>>,
    pub range_histogram: Section<Option<Histogram>>,
}

/// Number of most popular makes whose models are ranked.
const TOP_MAKES: usize = 5;

/// Compute every exploratory aggregate.
///
/// Missing columns turn a section into a note. A malformed numeric cell is a
/// hard `DataFormat` error.
pub fn build_summary(dataset: &CleanedDataset, top_n: usize, bins: usize) -> Result<ExploratorySummary, AppError> {
    use columns::*;

    let top_makes: Vec<String> = section(dataset, &[MAKE], || value_counts(dataset, MAKE))?
        .map(|v| v.into_iter().take(TOP_MAKES).map(|(make, _)| make).collect())
        .unwrap_or_default();

    let range_by_model = section(dataset, &[MAKE, MODEL, ELECTRIC_RANGE], || {
        mean_by(dataset, &[MAKE, MODEL], ELECTRIC_RANGE)
    })?
    .map(|mut v| {
        v.retain(|g| top_makes.contains(&g.key[0]));
        v.truncate(top_n);
        v
    });

    Ok(ExploratorySummary {
        stats: dataset.stats,
        top_n,
        yearly: yearly_counts(dataset),
        ev_types: section(dataset, &[EV_TYPE], || value_counts(dataset, EV_TYPE))?,
        counties: section(dataset, &[COUNTY], || value_counts(dataset, COUNTY))?.map(|v| take(v, top_n)),
        cities: section(dataset, &[COUNTY, CITY], || group_counts(dataset, &[COUNTY, CITY]))?
            .map(|v| take(v, top_n)),
        makes: section(dataset, &[MAKE], || value_counts(dataset, MAKE))?.map(|v| take(v, top_n)),
        top_models: section(dataset, &[MAKE, MODEL], || {
            top_models_for_top_makes(dataset, MAKE, MODEL, TOP_MAKES, top_n)
        })?,
        range_by_model,
        range_by_year: section(dataset, &[ELECTRIC_RANGE], || mean_by_year(dataset, ELECTRIC_RANGE))?,
        range_histogram: section(dataset, &[ELECTRIC_RANGE], || histogram(dataset, ELECTRIC_RANGE, bins))?,
    })
}

/// Run `compute` when every column in `required` exists; otherwise return a note.
fn section<T>(
    dataset: &CleanedDataset,
    required: &[&str],
    compute: impl FnOnce() -> Result<T, AppError>,
) -> Result<Section<T>, AppError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| dataset.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Ok(Err(format!("column(s) not present: {}", missing.join(", "))));
    }
    compute().map(Ok)
}

fn take<T>(mut v: Vec<T>, n: usize) -> Vec<T> {
    v.truncate(n);
    v
}
