//! Frequency aggregates over a cleaned dataset.

use std::collections::HashMap;

use crate::domain::{CleanedDataset, YearlyCounts};
use crate::error::AppError;

/// A group key (one value per grouped column) and its record count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: Vec<String>,
    pub count: u64,
}

/// Count registrations per model year.
///
/// The result iterates in ascending year order, which is what the forecaster
/// requires. Counts always sum to `dataset.len()`.
pub fn yearly_counts(dataset: &CleanedDataset) -> YearlyCounts {
    let mut counts = YearlyCounts::new();
    for record in &dataset.records {
        counts.add(record.model_year, 1);
    }
    counts
}

/// Frequency of each distinct value of `column`.
///
/// Ordered by descending count, ties by ascending value.
pub fn value_counts(dataset: &CleanedDataset, column: &str) -> Result<Vec<(String, u64)>, AppError> {
    Ok(group_counts(dataset, &[column])?
        .into_iter()
        .map(|g| {
            let GroupCount { mut key, count } = g;
            (key.pop().unwrap_or_default(), count)
        })
        .collect())
}

/// Frequency of each distinct tuple of `columns` (e.g. county + city).
///
/// Ordered by descending count, ties by ascending key.
pub fn group_counts(dataset: &CleanedDataset, columns: &[&str]) -> Result<Vec<GroupCount>, AppError> {
    let idx = resolve_columns(dataset, columns)?;

    let mut map: HashMap<Vec<&str>, u64> = HashMap::new();
    for record in &dataset.records {
        let key: Vec<&str> = idx.iter().map(|&i| record.fields[i].as_str()).collect();
        *map.entry(key).or_insert(0) += 1;
    }

    Ok(sorted_groups(map))
}

/// Most popular make/model pairs among the `n_makes` most popular makes.
///
/// Returns at most `n_models` entries, ordered like [`group_counts`].
pub fn top_models_for_top_makes(
    dataset: &CleanedDataset,
    make_column: &str,
    model_column: &str,
    n_makes: usize,
    n_models: usize,
) -> Result<Vec<GroupCount>, AppError> {
    let idx = resolve_columns(dataset, &[make_column, model_column])?;
    let (make_idx, model_idx) = (idx[0], idx[1]);

    let top_makes: Vec<String> = value_counts(dataset, make_column)?
        .into_iter()
        .take(n_makes)
        .map(|(make, _)| make)
        .collect();

    let mut map: HashMap<Vec<&str>, u64> = HashMap::new();
    for record in &dataset.records {
        let make = record.fields[make_idx].as_str();
        if !top_makes.iter().any(|m| m == make) {
            continue;
        }
        let key = vec![make, record.fields[model_idx].as_str()];
        *map.entry(key).or_insert(0) += 1;
    }

    let mut groups = sorted_groups(map);
    groups.truncate(n_models);
    Ok(groups)
}

pub(crate) fn resolve_columns(dataset: &CleanedDataset, columns: &[&str]) -> Result<Vec<usize>, AppError> {
    columns
        .iter()
        .map(|name| {
            dataset
                .column_index(name)
                .ok_or_else(|| AppError::data_format(format!("Missing column: `{name}`")))
        })
        .collect()
}

fn sorted_groups(map: HashMap<Vec<&str>, u64>) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = map
        .into_iter()
        .map(|(key, count)| GroupCount {
            key: key.into_iter().map(str::to_string).collect(),
            count,
        })
        .collect();
    // HashMap order is random; the sort makes the output deterministic.
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::{clean, read_table};

    fn dataset() -> CleanedDataset {
        let csv = "Model Year,Make,Model,County,City\n\
                   2020,TESLA,MODEL 3,King,Seattle\n\
                   2021,TESLA,MODEL Y,King,Seattle\n\
                   2021,TESLA,MODEL 3,King,Bellevue\n\
                   2019,NISSAN,LEAF,Pierce,Tacoma\n\
                   2021,KIA,NIRO,King,Seattle\n\
                   2018,NISSAN,LEAF,,Tacoma\n";
        clean(&read_table(csv.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn yearly_counts_sum_to_cleaned_records_and_ascend() {
        let ds = dataset();
        let counts = yearly_counts(&ds);
        assert_eq!(counts.total(), ds.len() as u64);

        let years: Vec<i32> = counts.iter().map(|(y, _)| y).collect();
        assert!(years.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(counts.iter().collect::<Vec<_>>(), vec![(2019, 1), (2020, 1), (2021, 3)]);
    }

    #[test]
    fn value_counts_orders_by_frequency_then_value() {
        let counts = value_counts(&dataset(), "make").unwrap();
        assert_eq!(
            counts,
            vec![("TESLA".to_string(), 3), ("KIA".to_string(), 1), ("NISSAN".to_string(), 1)]
        );
    }

    #[test]
    fn group_counts_over_two_columns() {
        let groups = group_counts(&dataset(), &["county", "city"]).unwrap();
        assert_eq!(groups[0].key, vec!["King", "Seattle"]);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups.iter().map(|g| g.count).sum::<u64>(), 5);
    }

    #[test]
    fn top_models_restricted_to_top_makes() {
        let groups = top_models_for_top_makes(&dataset(), "make", "model", 1, 10).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec!["TESLA", "MODEL 3"]);
        assert_eq!(groups[0].count, 2);
        assert!(groups.iter().all(|g| g.key[0] == "TESLA"));
    }

    #[test]
    fn unknown_column_is_reported() {
        assert!(value_counts(&dataset(), "electric_range").is_err());
    }
}
