//! Interactive dataset picker.
//!
//! Used when no dataset path came from `--data` or `EVF_DATASET`: list the
//! `*.csv` files under the working directory and let the user choose one.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{AppError, ErrorKind};

/// How deep below the working directory to look for CSV files.
const SEARCH_DEPTH: usize = 4;

/// Resolve the dataset path, prompting on the terminal when `given` is `None`.
pub fn resolve_dataset_path(given: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = given {
        return validate_csv_path(path);
    }
    let files = discover_csv_files(Path::new("."));
    let stdin = io::stdin();
    choose_csv(&files, stdin.lock(), io::stdout())
}

/// Prompt loop over an explicit candidate list.
///
/// Accepts a list number or a path; `q` cancels.
pub fn choose_csv<R: BufRead, W: Write>(files: &[PathBuf], mut input: R, mut output: W) -> Result<PathBuf, AppError> {
    if files.is_empty() {
        return Err(config_err(
            "No .csv files found. Pass one with `--data <file.csv>` or set EVF_DATASET.",
        ));
    }
    let io_err = |e: io::Error| AppError::new(ErrorKind::Io, format!("Dataset prompt failed: {e}"));

    writeln!(output, "Found {} CSV file(s):", files.len()).map_err(io_err)?;
    for (idx, path) in files.iter().enumerate() {
        writeln!(output, "{:>3}) {}", idx + 1, display_path(path)).map_err(io_err)?;
    }

    loop {
        write!(output, "Dataset number (1-{}) or path, q to quit: ", files.len()).map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(config_err("No dataset selected (end of input)."));
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(config_err("Canceled."));
        }

        let attempt = match line.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => validate_csv_path(&files[n - 1]),
            Ok(n) => Err(config_err(format!("No entry {n} in the list."))),
            Err(_) => validate_csv_path(Path::new(line)),
        };
        match attempt {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(output, "{err}").map_err(io_err)?,
        }
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_file() {
        return Err(AppError::new(
            ErrorKind::Io,
            format!("Dataset not found or not a file: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(config_err(format!("Expected a .csv file, got {}", path.display())));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root`, sorted by displayed path.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out.sort_by_key(|p| display_path(p));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if !matches!(name, ".git" | "target" | "debug") {
                walk(&path, depth + 1, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

fn config_err(msg: impl Into<String>) -> AppError {
    AppError::new(ErrorKind::Config, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("evf-picker-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        dir
    }

    #[test]
    fn discovers_csv_files_sorted() {
        let dir = scratch_dir("discover");
        fs::write(dir.join("b.csv"), "Model Year\n").unwrap();
        fs::write(dir.join("nested").join("a.CSV"), "Model Year\n").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = discover_csv_files(&dir);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| has_csv_extension(p)));
        assert!(files[0].ends_with("b.csv"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn choose_by_number_after_a_bad_entry() {
        let dir = scratch_dir("choose");
        let csv = dir.join("ev.csv");
        fs::write(&csv, "Model Year\n").unwrap();

        let mut shown = Vec::new();
        let picked = choose_csv(&[csv.clone()], "7\n1\n".as_bytes(), &mut shown).unwrap();
        assert_eq!(picked, csv);
        assert!(String::from_utf8(shown).unwrap().contains("No entry 7 in the list."));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn quit_and_empty_list_are_config_errors() {
        let err = choose_csv(&[], "1\n".as_bytes(), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let dir = scratch_dir("quit");
        let csv = dir.join("ev.csv");
        fs::write(&csv, "Model Year\n").unwrap();
        let err = choose_csv(&[csv], "q\n".as_bytes(), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let _ = fs::remove_dir_all(&dir);
    }
}
