use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized name of the only column the forecast core reads.
pub const MODEL_YEAR_COLUMN: &str = "model_year";

/// Number of future years projected when the user does not say otherwise.
pub const DEFAULT_HORIZON: usize = 6;

/// Largest accepted horizon.
pub const MAX_HORIZON: usize = 50;

/// Solver patience: the evaluation budget is `patience * (params + 1)`.
pub const DEFAULT_PATIENCE: usize = 200;

/// Fixed part of the starting grid for the growth rate `b`.
///
/// The log-linear estimate (when one exists) is always tried first; these
/// follow in order. Negative and zero rates are included so that flat or
/// declining series still get a sensible start.
pub const DEFAULT_START_RATES: [f64; 7] = [0.05, 0.1, 0.25, 0.5, 1.0, 0.0, -0.1];

/// Below this many training years the fit still runs but is flagged.
pub const RECOMMENDED_MIN_TRAINING_YEARS: usize = 4;

/// One CSV row before cleaning. `None` marks an absent cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

/// A parsed table with normalized headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// A single registration event that survived cleaning.
///
/// `fields` holds every cell of the row (in header order), all present.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRecord {
    pub model_year: i32,
    pub fields: Vec<String>,
}

/// Row accounting for a cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_used: usize,
}

/// Records with no absent cell, plus the headers needed to address columns.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub headers: Vec<String>,
    pub records: Vec<RegistrationRecord>,
    pub stats: IngestStats,
}

impl CleanedDataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Registrations per model year, always iterated in ascending year order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearlyCounts {
    counts: BTreeMap<i32, u64>,
}

impl YearlyCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` registrations to `year`.
    pub fn add(&mut self, year: i32, n: u64) {
        *self.counts.entry(year).or_insert(0) += n;
    }

    pub fn get(&self, year: i32) -> Option<u64> {
        self.counts.get(&year).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn min_year(&self) -> Option<i32> {
        self.counts.keys().next().copied()
    }

    pub fn max_year(&self) -> Option<i32> {
        self.counts.keys().next_back().copied()
    }

    /// Ascending `(year, count)` pairs.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i32, u64)> + '_ {
        self.counts.iter().map(|(&y, &c)| (y, c))
    }

    /// Entries with `year < cutoff_year`.
    pub fn before(&self, cutoff_year: i32) -> YearlyCounts {
        YearlyCounts {
            counts: self.counts.range(..cutoff_year).map(|(&y, &c)| (y, c)).collect(),
        }
    }

    /// Frequency view: descending count, ties by ascending year.
    ///
    /// This is for reporting only; fitting always uses [`YearlyCounts::iter`].
    pub fn by_frequency(&self) -> Vec<(i32, u64)> {
        let mut out: Vec<(i32, u64)> = self.iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }

    pub fn to_year_counts(&self) -> Vec<YearCount> {
        self.iter().map(|(year, count)| YearCount { year, count }).collect()
    }
}

/// Duplicate years are summed.
impl FromIterator<(i32, u64)> for YearlyCounts {
    fn from_iter<I: IntoIterator<Item = (i32, u64)>>(iter: I) -> Self {
        let mut out = YearlyCounts::new();
        for (year, count) in iter {
            out.add(year, count);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Parameters of `f(t) = a * exp(b * t)` with `t` in years since the base year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub a: f64,
    pub b: f64,
}

/// Options for a single forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// First year excluded from training (partial-year data).
    pub cutoff_year: i32,
    /// Number of projected years, starting at `cutoff_year`.
    pub horizon: usize,
    /// Solver evaluation budget multiplier.
    pub patience: usize,
    /// Growth-rate starting points tried after the log-linear estimate.
    pub start_rates: Vec<f64>,
}

impl ForecastConfig {
    pub fn new(cutoff_year: i32, horizon: usize) -> Self {
        Self {
            cutoff_year,
            horizon,
            patience: DEFAULT_PATIENCE,
            start_rates: DEFAULT_START_RATES.to_vec(),
        }
    }
}

/// How a single solver start ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub index: usize,
    pub a0: f64,
    pub b0: f64,
    pub converged: bool,
    pub termination: String,
    pub evaluations: usize,
    /// Unweighted sum of squared residuals at the final parameters.
    pub sse: f64,
    pub params: Option<FitParams>,
}

/// Fit quality and solver bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub n_points: usize,
    pub sse: f64,
    pub rmse: f64,
    pub evaluations: usize,
    pub termination: String,
    pub starts_tried: usize,
    pub starts_converged: usize,
    /// Grid index of the start the final parameters came from.
    #[serde(default)]
    pub best_start: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Everything a successful forecast produces.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub cutoff_year: i32,
    pub horizon: usize,
    /// Minimum training year (`t = 0`).
    pub base_year: i32,
    pub training: YearlyCounts,
    pub params: FitParams,
    pub forecast: Vec<YearValue>,
    pub diagnostics: FitDiagnostics,
    pub starts: Vec<StartOutcome>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment, and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub forecast: ForecastConfig,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// A saved forecast (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub cutoff_year: i32,
    pub horizon: usize,
    pub base_year: i32,
    pub params: FitParams,
    pub diagnostics: FitDiagnostics,
    pub training: Vec<YearCount>,
    pub forecast: Vec<YearValue>,
}
