//! Synthetic registration dataset generation.
//!
//! The generated CSV has the same shape as the public EV population export,
//! so every command can be exercised without downloading it. Yearly volumes
//! follow `exp(growth * (year - start_year))` with log-normal noise; each
//! record draws its vehicle and location from small weighted catalogs.

use std::path::Path;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{AppError, ErrorKind};
use crate::models::year_span;

/// Header row, in the order the public export uses.
pub const SAMPLE_HEADERS: [&str; 8] = [
    "Clean Alternative Fuel Vehicle Type",
    "DOL Vehicle Type",
    "Model Year",
    "Make",
    "Model",
    "Electric Range",
    "County",
    "City",
];

const BEV: &str = "Battery Electric Vehicle (BEV)";
const PHEV: &str = "Plug-in Hybrid Electric Vehicle (PHEV)";

struct Vehicle {
    make: &'static str,
    model: &'static str,
    ev_type: &'static str,
    dol_type: &'static str,
    range: f64,
    weight: u32,
}

static VEHICLES: [Vehicle; 10] = [
    Vehicle { make: "TESLA", model: "MODEL Y", ev_type: BEV, dol_type: "Passenger", range: 291.0, weight: 22 },
    Vehicle { make: "TESLA", model: "MODEL 3", ev_type: BEV, dol_type: "Passenger", range: 220.0, weight: 18 },
    Vehicle { make: "NISSAN", model: "LEAF", ev_type: BEV, dol_type: "Passenger", range: 150.0, weight: 10 },
    Vehicle { make: "CHEVROLET", model: "BOLT EV", ev_type: BEV, dol_type: "Passenger", range: 259.0, weight: 8 },
    Vehicle { make: "CHEVROLET", model: "VOLT", ev_type: PHEV, dol_type: "Passenger", range: 53.0, weight: 5 },
    Vehicle { make: "KIA", model: "NIRO", ev_type: BEV, dol_type: "Passenger", range: 239.0, weight: 7 },
    Vehicle { make: "FORD", model: "F-150", ev_type: BEV, dol_type: "Truck", range: 320.0, weight: 6 },
    Vehicle { make: "RIVIAN", model: "R1T", ev_type: BEV, dol_type: "Truck", range: 314.0, weight: 4 },
    Vehicle { make: "TOYOTA", model: "PRIUS PRIME", ev_type: PHEV, dol_type: "Passenger", range: 25.0, weight: 9 },
    Vehicle { make: "BMW", model: "X5", ev_type: PHEV, dol_type: "Passenger", range: 30.0, weight: 5 },
];

static PLACES: [(&str, &str, u32); 8] = [
    ("King", "Seattle", 30),
    ("King", "Bellevue", 14),
    ("Snohomish", "Everett", 10),
    ("Pierce", "Tacoma", 11),
    ("Clark", "Vancouver", 9),
    ("Thurston", "Olympia", 6),
    ("Kitsap", "Bremerton", 5),
    ("Spokane", "Spokane", 7),
];

/// Knobs for [`generate_sample`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Target record count; yearly rounding makes the actual count approximate.
    pub records: usize,
    pub seed: u64,
    pub start_year: i32,
    pub end_year: i32,
    /// Probability that a row gets one blank cell.
    pub missing_rate: f64,
    /// Underlying exponential growth rate per year.
    pub growth_rate: f64,
    /// Standard deviation of the log-normal noise on yearly volumes.
    pub volume_noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            records: 5_000,
            seed: 42,
            start_year: 2011,
            end_year: 2024,
            missing_rate: 0.01,
            growth_rate: 0.35,
            volume_noise: 0.1,
        }
    }
}

/// A generated table; `None` is a blank cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.records == 0 {
        return Err(config_err("Sample record count must be > 0."));
    }
    if config.end_year < config.start_year {
        return Err(config_err(format!(
            "Sample end year {} is before start year {}.",
            config.end_year, config.start_year
        )));
    }
    if !(0.0..1.0).contains(&config.missing_rate) {
        return Err(config_err("Missing rate must be in [0, 1)."));
    }
    if !(config.growth_rate.is_finite() && config.volume_noise.is_finite() && config.volume_noise >= 0.0) {
        return Err(config_err("Invalid growth or noise settings."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.volume_noise)
        .map_err(|e| config_err(format!("Noise distribution error: {e}")))?;
    let vehicle_pick = WeightedIndex::new(VEHICLES.iter().map(|v| v.weight))
        .map_err(|e| config_err(format!("Vehicle weights: {e}")))?;
    let place_pick = WeightedIndex::new(PLACES.iter().map(|p| p.2))
        .map_err(|e| config_err(format!("Place weights: {e}")))?;

    let rows_per_year = yearly_volumes(config, &noise, &mut rng);

    let mut rows = Vec::with_capacity(rows_per_year.iter().map(|(_, n)| n).sum());
    for (year, n) in rows_per_year {
        for _ in 0..n {
            let v = &VEHICLES[vehicle_pick.sample(&mut rng)];
            let (county, city, _) = PLACES[place_pick.sample(&mut rng)];
            // Rated range drifts a little between model years.
            let range = (v.range * (1.0 + 0.05 * noise.sample(&mut rng))).round().max(0.0);

            let mut row: Vec<Option<String>> = vec![
                Some(v.ev_type.to_string()),
                Some(v.dol_type.to_string()),
                Some(year.to_string()),
                Some(v.make.to_string()),
                Some(v.model.to_string()),
                Some(format!("{range:.0}")),
                Some(county.to_string()),
                Some(city.to_string()),
            ];
            if rng.gen_bool(config.missing_rate) {
                let blank = rng.gen_range(0..row.len());
                row[blank] = None;
            }
            rows.push(row);
        }
    }

    Ok(SampleData {
        headers: SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
    })
}

/// Records per model year: at least one per year, scaled to `config.records`.
fn yearly_volumes(config: &SampleConfig, noise: &Normal<f64>, rng: &mut StdRng) -> Vec<(i32, usize)> {
    let weights: Vec<(i32, f64)> = (config.start_year..=config.end_year)
        .map(|year| {
            let t = year_span(year, config.start_year);
            (year, (config.growth_rate * t + noise.sample(rng)).exp())
        })
        .collect();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();

    weights
        .into_iter()
        .map(|(year, w)| (year, ((config.records as f64 * w / total).round() as usize).max(1)))
        .collect()
}

/// Write a sample as CSV; blank cells become empty fields.
pub fn write_sample_csv(path: &Path, sample: &SampleData) -> Result<(), AppError> {
    let io_err = |e: csv::Error| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to write sample CSV '{}': {e}", path.display()),
        )
    };

    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;
    writer.write_record(&sample.headers).map_err(io_err)?;
    for row in &sample.rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(io_err)?;
    }
    writer.flush().map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to flush sample CSV '{}': {e}", path.display()),
        )
    })
}

fn config_err(msg: impl Into<String>) -> AppError {
    AppError::new(ErrorKind::Config, msg)
}
