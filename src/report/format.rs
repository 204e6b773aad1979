//! Plain-text rendering of runs and exploratory summaries.
//!
//! All formatting lives here so the aggregation and fitting code stays free of
//! presentation concerns. Output is deterministic (no timestamps), which keeps
//! it usable in snapshot tests.

use crate::domain::{ForecastOutcome, IngestStats, YearlyCounts};
use crate::models::doubling_time;
use crate::report::{ExploratorySummary, Section};

/// Dataset accounting, the yearly series, and the chosen fit.
pub fn format_run_summary(stats: &IngestStats, yearly: &YearlyCounts, outcome: &ForecastOutcome) -> String {
    let mut out = String::new();

    out.push_str("=== evf - EV registration growth forecast ===\n");
    out.push_str(&format_stats(stats));
    out.push_str(&format!(
        "Model years: {} distinct | registrations={}\n",
        yearly.len(),
        yearly.total()
    ));
    out.push_str(&format!(
        "Training: {}..{} ({} years, cutoff {} excluded)\n",
        outcome.base_year,
        outcome.cutoff_year - 1,
        outcome.training.len(),
        outcome.cutoff_year
    ));

    out.push_str("\nFit: f(t) = a * exp(b * t), t = year - ");
    out.push_str(&format!("{}\n", outcome.base_year));
    out.push_str(&format!("- a: {:.6}\n", outcome.params.a));
    out.push_str(&format!("- b: {:.6}\n", outcome.params.b));
    match doubling_time(&outcome.params) {
        Some(years) => out.push_str(&format!("- doubling time: {years:.2} years\n")),
        None => out.push_str("- doubling time: n/a (not growing)\n"),
    }

    let d = &outcome.diagnostics;
    out.push_str("\nDiagnostics:\n");
    out.push_str(&format!(
        "- points={} SSE={:.3} RMSE={:.3}\n",
        d.n_points, d.sse, d.rmse
    ));
    out.push_str(&format!(
        "- solver: {} after {} evaluations | starts converged {}/{}\n",
        d.termination, d.evaluations, d.starts_converged, d.starts_tried
    ));
    for w in &d.warnings {
        out.push_str(&format!("! {w}\n"));
    }
    out.push('\n');

    out
}

/// Year-by-year forecast table.
pub fn format_forecast_table(outcome: &ForecastOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Forecast ({} years from {}):\n",
        outcome.horizon, outcome.cutoff_year
    ));
    push_row(&mut out, format!("{:<6} {:>16}", "year", "registrations"));
    push_row(&mut out, format!("{:-<6} {:-<16}", "", ""));
    for p in &outcome.forecast {
        push_row(&mut out, format!("{:<6} {:>16.1}", p.year, p.value));
    }
    out
}

/// Every section of an exploratory summary, in a fixed order.
pub fn format_exploratory_summary(summary: &ExploratorySummary) -> String {
    let mut out = String::new();

    out.push_str("=== evf - EV registration summary ===\n");
    out.push_str(&format_stats(&summary.stats));

    out.push_str("\nRegistrations by model year:\n");
    push_row(&mut out, format!("{:<6} {:>10}", "year", "count"));
    push_row(&mut out, format!("{:-<6} {:-<10}", "", ""));
    for (year, count) in summary.yearly.iter() {
        push_row(&mut out, format!("{year:<6} {count:>10}"));
    }

    out.push_str("\nModel years by frequency:\n");
    push_row(&mut out, format!("{:<6} {:>10}", "year", "count"));
    push_row(&mut out, format!("{:-<6} {:-<10}", "", ""));
    for (year, count) in summary.yearly.by_frequency() {
        push_row(&mut out, format!("{year:<6} {count:>10}"));
    }

    section(&mut out, "EV types", &summary.ev_types, |out, rows| {
        count_table(out, "type", rows, 40);
    });
    section(&mut out, &format!("Top {} counties", summary.top_n), &summary.counties, |out, rows| {
        count_table(out, "county", rows, 24);
    });
    section(&mut out, &format!("Top {} cities", summary.top_n), &summary.cities, |out, rows| {
        let rows: Vec<(String, u64)> = rows.iter().map(|g| (g.key.join(" / "), g.count)).collect();
        count_table(out, "county / city", &rows, 40);
    });
    section(&mut out, &format!("Top {} makes", summary.top_n), &summary.makes, |out, rows| {
        count_table(out, "make", rows, 24);
    });
    section(&mut out, "Top models of the leading makes", &summary.top_models, |out, rows| {
        let rows: Vec<(String, u64)> = rows.iter().map(|g| (g.key.join(" "), g.count)).collect();
        count_table(out, "make model", &rows, 40);
    });
    section(&mut out, "Mean electric range by model", &summary.range_by_model, |out, rows| {
        push_row(out, format!("{:<40} {:>10} {:>8}", "make model", "mean", "n"));
        push_row(out, format!("{:-<40} {:-<10} {:-<8}", "", "", ""));
        for g in rows {
            push_row(
                out,
                format!("{:<40} {:>10.1} {:>8}", truncate(&g.key.join(" "), 40), g.mean, g.n),
            );
        }
    });
    section(&mut out, "Mean electric range by model year", &summary.range_by_year, |out, rows| {
        push_row(out, format!("{:<6} {:>10}", "year", "mean"));
        push_row(out, format!("{:-<6} {:-<10}", "", ""));
        for (year, mean) in rows {
            push_row(out, format!("{year:<6} {mean:>10.1}"));
        }
    });
    section(&mut out, "Electric range distribution", &summary.range_histogram, |out, hist| {
        let Some(hist) = hist else {
            out.push_str("(no values)\n");
            return;
        };
        out.push_str(&format!(
            "min={:.1} max={:.1} mean={:.1}\n",
            hist.min, hist.max, hist.mean
        ));
        let width = hist.bin_width();
        let peak = hist.bins.iter().copied().max().unwrap_or(0).max(1);
        let last = hist.bins.len() - 1;
        for (i, &n) in hist.bins.iter().enumerate() {
            let lo = hist.min + width * i as f64;
            let close = if i == last { ']' } else { ')' };
            let bar = "#".repeat(((n as f64 / peak as f64) * 30.0).round() as usize);
            push_row(out, format!("[{:>8.1}, {:>8.1}{close} {n:>8} {bar}", lo, lo + width));
        }
    });

    out
}

fn format_stats(stats: &IngestStats) -> String {
    format!(
        "Rows: read={} | dropped (missing values)={} | used={}\n",
        stats.rows_read, stats.rows_dropped, stats.rows_used
    )
}

fn section<T>(out: &mut String, title: &str, data: &Section<T>, render: impl FnOnce(&mut String, &T)) {
    out.push('\n');
    out.push_str(title);
    out.push_str(":\n");
    match data {
        Ok(value) => render(out, value),
        Err(note) => out.push_str(&format!("(skipped: {note})\n")),
    }
}

fn count_table(out: &mut String, label: &str, rows: &[(String, u64)], width: usize) {
    push_row(out, format!("{label:<width$} {:>10}", "count"));
    push_row(out, format!("{:-<width$} {:-<10}", "", ""));
    for (key, count) in rows {
        push_row(out, format!("{:<width$} {count:>10}", truncate(key, width)));
    }
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitDiagnostics, FitParams, YearValue};
    use crate::io::ingest::{clean, read_table};
    use crate::report::build_summary;

    fn outcome() -> ForecastOutcome {
        ForecastOutcome {
            cutoff_year: 2023,
            horizon: 2,
            base_year: 2020,
            training: [(2020, 100), (2021, 200), (2022, 400)].into_iter().collect(),
            params: FitParams {
                a: 100.0,
                b: std::f64::consts::LN_2,
            },
            forecast: vec![
                YearValue { year: 2023, value: 800.0 },
                YearValue { year: 2024, value: 1600.0 },
            ],
            diagnostics: FitDiagnostics {
                n_points: 3,
                sse: 0.0,
                rmse: 0.0,
                evaluations: 4,
                termination: "ResidualsZero".to_string(),
                starts_tried: 8,
                starts_converged: 8,
                best_start: 0,
                warnings: vec!["only 3 training years".to_string()],
            },
            starts: Vec::new(),
        }
    }

    #[test]
    fn forecast_table_golden() {
        let txt = format_forecast_table(&outcome());
        let expected = concat!(
            "Forecast (2 years from 2023):\n",
            "year      registrations\n",
            "------ ----------------\n",
            "2023              800.0\n",
            "2024             1600.0\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn run_summary_reports_fit_and_warnings() {
        let o = outcome();
        let stats = IngestStats {
            rows_read: 710,
            rows_dropped: 10,
            rows_used: 700,
        };
        let txt = format_run_summary(&stats, &o.training, &o);
        assert!(txt.contains("read=710 | dropped (missing values)=10 | used=700"));
        assert!(txt.contains("Training: 2020..2022 (3 years, cutoff 2023 excluded)"));
        assert!(txt.contains("- a: 100.000000"));
        assert!(txt.contains("- doubling time: 1.00 years"));
        assert!(txt.contains("! only 3 training years"));
    }

    #[test]
    fn exploratory_summary_lists_sections_and_notes() {
        let csv = "Model Year,Make,Model,Electric Range\n\
                   2020,TESLA,MODEL 3,200\n\
                   2021,TESLA,MODEL 3,220\n\
                   2021,KIA,NIRO,100\n";
        let ds = clean(&read_table(csv.as_bytes()).unwrap()).unwrap();
        let summary = build_summary(&ds, 3, 2).unwrap();
        let txt = format_exploratory_summary(&summary);

        assert!(txt.contains("Top 3 makes:\nmake"));
        assert!(txt.contains("TESLA                             2"));
        assert!(txt.contains("Top 3 counties:\n(skipped: column(s) not present: county)"));
        assert!(txt.contains("min=100.0 max=220.0 mean=173.3"));
        assert!(txt.contains("[   100.0,    160.0)        1"));
        assert!(txt.contains("[   160.0,    220.0]        2"));

        let by_frequency = concat!(
            "Model years by frequency:\n",
            "year        count\n",
            "------ ----------\n",
            "2021            2\n",
            "2020            1\n",
        );
        assert!(txt.contains(by_frequency), "{txt}");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("CHEVROLET", 5), "CHEV.");
        assert_eq!(truncate("KIA", 5), "KIA");
    }
}
