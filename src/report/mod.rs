//! Tabulation helpers: long-format window averages and text tables.
//!
//! The statistics handed to external tooling (R scripts, spreadsheets) are
//! per-group channel means over a time window, one row per (grouping tuple,
//! channel). This module flattens a summary into that long format and renders
//! it as a fixed-width text table; writing files is the caller's concern.

use serde::Serialize;

use crate::data::table::DataSet;
use crate::error::Result;
use crate::summary::DataSummary;

/// One long-format row: the grouping values, a channel, and its mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub keys: Vec<String>,
    pub channel: String,
    pub mean: f64,
}

/// Average every channel over the half-open window `[start, end)` of a
/// numeric descriptor (typically the timestamp), grouped by `groups`, and
/// flatten to long-format rows.
///
/// Row order: summary group order (first occurrence), channels in channel
/// order within each group.
pub fn window_averages(
    data: &DataSet,
    time: &str,
    start: f64,
    end: f64,
    groups: &[&str],
) -> Result<Vec<WindowRow>> {
    let windowed = data.select_window(time, start, end)?;
    let summary = DataSummary::new(&windowed, groups)?;

    let means = &summary.means;
    let mut out = Vec::with_capacity(means.n_rows() * means.channels.len());
    for row in 0..means.n_rows() {
        let keys: Vec<String> = means
            .descriptors
            .iter()
            .map(|(_, col)| means.cell(row, col).to_string())
            .collect();
        for (channel, col) in means.channels.iter() {
            out.push(WindowRow {
                keys: keys.clone(),
                channel: channel.to_string(),
                mean: match means.cell(row, col).as_num() {
                    Some(v) => v,
                    None => unreachable!("summary channel holds a text cell"),
                },
            });
        }
    }
    Ok(out)
}

/// Render long-format rows as a fixed-width text table.
///
/// `key_names` labels the grouping columns, in the same order the rows were
/// produced with.
pub fn format_window_table(rows: &[WindowRow], key_names: &[&str]) -> String {
    let mut out = String::new();

    for name in key_names {
        out.push_str(&format!("{name:<16} "));
    }
    out.push_str(&format!("{:<8} {:>12}\n", "channel", "mean"));

    for _ in key_names {
        out.push_str(&format!("{:-<16} ", ""));
    }
    out.push_str(&format!("{:-<8} {:-<12}\n", "", ""));

    for row in rows {
        for key in &row.keys {
            out.push_str(&format!("{key:<16} "));
        }
        out.push_str(&format!("{:<8} {:>12.4}\n", row.channel, row.mean));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Cell;

    fn windowed_table() -> DataSet {
        // Two conditions, timestamps 0/100/200, one channel.
        let conditions = ["a", "a", "a", "b", "b", "b"];
        let timestamps = [0i64, 100, 200, 0, 100, 200];
        DataSet::from_columns(
            vec![
                (
                    "Condition".to_string(),
                    conditions.iter().map(|&c| Cell::from(c)).collect(),
                ),
                (
                    "Timestamp".to_string(),
                    timestamps.iter().map(|&t| Cell::from(t)).collect(),
                ),
            ],
            vec![],
            vec![("Cz".to_string(), vec![1.0, 2.0, 9.0, 3.0, 5.0, 9.0])],
        )
        .unwrap()
    }

    #[test]
    fn window_averages_respect_window_and_grouping() {
        let ds = windowed_table();
        // [0, 200) keeps timestamps 0 and 100.
        let rows = window_averages(&ds, "Timestamp", 0.0, 200.0, &["Condition"]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keys, vec!["a".to_string()]);
        assert_eq!(rows[0].channel, "Cz");
        assert!((rows[0].mean - 1.5).abs() < 1e-12);
        assert_eq!(rows[1].keys, vec!["b".to_string()]);
        assert!((rows[1].mean - 4.0).abs() < 1e-12);
    }

    #[test]
    fn text_table_lists_every_row() {
        let ds = windowed_table();
        let rows = window_averages(&ds, "Timestamp", 0.0, 200.0, &["Condition"]).unwrap();
        let table = format_window_table(&rows, &["condition"]);

        assert!(table.contains("condition"));
        assert!(table.contains("channel"));
        assert!(table.lines().count() >= 4);
        assert!(table.contains("Cz"));
    }
}
