//! The core labeled table: a fixed-width row store plus three disjoint,
//! ordered name-to-column mappings.
//!
//! A [`DataSet`] holds one row per observation (one electrode sample per
//! trial, in the EEG workflow this crate was built for) and classifies its
//! columns three ways:
//!
//! - **descriptors**: categorical/key columns (subject, timestamp, condition,
//!   item number), compared by equality and used for grouping and alignment
//! - **predictors**: continuous covariates fed into the regressions
//! - **channels**: continuous measured signals (one column per sensor)
//!
//! Mappings are plain ordered name-to-index maps over the row store; renames
//! touch only the mapping, never the storage. Columns are never added or
//! removed after construction, only values and names change. `Clone` is a
//! deep copy, so counterfactual edits to a cloned table (e.g. zeroing one
//! predictor) never leak back into the source.

use std::collections::HashMap;

use crate::error::{ColumnClass, Error, Result};

/// One stored value: either a categorical label or a number.
///
/// Equality and hashing of numbers is bitwise so that `Cell` can serve as a
/// grouping-key component.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Num(f64),
}

impl Cell {
    /// Numeric view of the cell, if it holds a number.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Cell::Num(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Num(a), Cell::Num(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Cell::Text(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Cell::Num(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Num(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Num(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Num(v as f64)
    }
}

/// An ordered name-to-column-index mapping.
///
/// Iteration order is insertion order; it determines output column order
/// everywhere downstream, so it must stay stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(String, usize)>,
}

impl ColumnMap {
    /// Build a mapping for consecutive columns starting at `start`.
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>, start: usize) -> Self {
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n.into(), start + i))
            .collect();
        ColumnMap { entries }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), *i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rename a key in place. Returns `false` if `old` is absent.
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> bool {
        for (n, _) in &mut self.entries {
            if n == old {
                *n = new.to_string();
                return true;
            }
        }
        false
    }
}

/// A labeled observation table. See the module docs for the column classes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub(crate) cells: Vec<Cell>,
    pub(crate) width: usize,
    pub(crate) n_rows: usize,
    pub descriptors: ColumnMap,
    pub predictors: ColumnMap,
    pub channels: ColumnMap,
}

impl DataSet {
    /// Construct a table from already-typed columns.
    ///
    /// The caller (the ingestion layer) provides the three-way column
    /// classification; this crate does no file parsing. Columns are laid out
    /// descriptors first, then predictors, then channels. All columns must
    /// have the same length and all names must be distinct across the three
    /// classes.
    pub fn from_columns(
        descriptors: Vec<(String, Vec<Cell>)>,
        predictors: Vec<(String, Vec<f64>)>,
        channels: Vec<(String, Vec<f64>)>,
    ) -> Result<DataSet> {
        let width = descriptors.len() + predictors.len() + channels.len();
        if width == 0 {
            return Err(Error::ShapeMismatch {
                detail: "table has no columns".to_string(),
            });
        }

        let mut seen: Vec<&str> = Vec::with_capacity(width);
        for name in descriptors
            .iter()
            .map(|(n, _)| n)
            .chain(predictors.iter().map(|(n, _)| n))
            .chain(channels.iter().map(|(n, _)| n))
        {
            if seen.contains(&name.as_str()) {
                return Err(Error::DuplicateColumn { name: name.clone() });
            }
            seen.push(name);
        }

        let n_rows = descriptors
            .first()
            .map(|(_, c)| c.len())
            .or_else(|| predictors.first().map(|(_, c)| c.len()))
            .or_else(|| channels.first().map(|(_, c)| c.len()))
            .unwrap_or(0);

        for (name, col) in &descriptors {
            if col.len() != n_rows {
                return Err(column_length_mismatch(name, col.len(), n_rows));
            }
        }
        for (name, col) in predictors.iter().chain(channels.iter()) {
            if col.len() != n_rows {
                return Err(column_length_mismatch(name, col.len(), n_rows));
            }
        }

        let mut cells = Vec::with_capacity(n_rows * width);
        for row in 0..n_rows {
            for (_, col) in &descriptors {
                cells.push(col[row].clone());
            }
            for (_, col) in &predictors {
                cells.push(Cell::Num(col[row]));
            }
            for (_, col) in &channels {
                cells.push(Cell::Num(col[row]));
            }
        }

        let d = ColumnMap::from_names(descriptors.into_iter().map(|(n, _)| n), 0);
        let p = ColumnMap::from_names(predictors.into_iter().map(|(n, _)| n), d.len());
        let c = ColumnMap::from_names(channels.into_iter().map(|(n, _)| n), d.len() + p.len());

        Ok(DataSet {
            cells,
            width,
            n_rows,
            descriptors: d,
            predictors: p,
            channels: c,
        })
    }

    /// Assemble a table from pre-built storage (used by the aggregator).
    pub(crate) fn from_parts(
        cells: Vec<Cell>,
        width: usize,
        n_rows: usize,
        descriptors: ColumnMap,
        predictors: ColumnMap,
        channels: ColumnMap,
    ) -> DataSet {
        debug_assert_eq!(cells.len(), width * n_rows);
        DataSet {
            cells,
            width,
            n_rows,
            descriptors,
            predictors,
            channels,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The cell at (row, column index).
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * self.width + col]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.width + col] = cell;
    }

    /// Numeric value of a predictor/channel cell. Those columns only ever
    /// hold numbers, by construction.
    pub(crate) fn num(&self, row: usize, col: usize) -> f64 {
        match self.cell(row, col) {
            Cell::Num(v) => *v,
            Cell::Text(_) => unreachable!("numeric column holds a text cell"),
        }
    }

    pub fn descriptor_index(&self, name: &str) -> Result<usize> {
        self.descriptors.get(name).ok_or_else(|| Error::UnknownColumn {
            class: ColumnClass::Descriptor,
            name: name.to_string(),
        })
    }

    pub fn predictor_index(&self, name: &str) -> Result<usize> {
        self.predictors.get(name).ok_or_else(|| Error::UnknownColumn {
            class: ColumnClass::Predictor,
            name: name.to_string(),
        })
    }

    pub fn channel_index(&self, name: &str) -> Result<usize> {
        self.channels.get(name).ok_or_else(|| Error::UnknownColumn {
            class: ColumnClass::Channel,
            name: name.to_string(),
        })
    }

    /// All values of a predictor column, in row order.
    pub fn predictor_values(&self, name: &str) -> Result<Vec<f64>> {
        let col = self.predictor_index(name)?;
        Ok((0..self.n_rows).map(|r| self.num(r, col)).collect())
    }

    /// All values of a channel column, in row order.
    pub fn channel_values(&self, name: &str) -> Result<Vec<f64>> {
        let col = self.channel_index(name)?;
        Ok((0..self.n_rows).map(|r| self.num(r, col)).collect())
    }

    /// The descriptor tuple of one row, in the given column order.
    pub(crate) fn key_of(&self, row: usize, cols: &[usize]) -> Vec<Cell> {
        cols.iter().map(|&c| self.cell(row, c).clone()).collect()
    }
}

fn column_length_mismatch(name: &str, got: usize, expected: usize) -> Error {
    Error::ShapeMismatch {
        detail: format!("column '{name}' has {got} rows, expected {expected}"),
    }
}

/// Group row indices by the tuple of values in `key_cols`, ordered by first
/// occurrence of each distinct tuple. Order is what makes regression and
/// aggregation output deterministic.
pub(crate) fn group_by_key(
    cells: &[Cell],
    width: usize,
    n_rows: usize,
    key_cols: &[usize],
) -> Vec<(Vec<Cell>, Vec<usize>)> {
    let mut order: Vec<(Vec<Cell>, Vec<usize>)> = Vec::new();
    let mut index: HashMap<Vec<Cell>, usize> = HashMap::new();

    for row in 0..n_rows {
        let key: Vec<Cell> = key_cols
            .iter()
            .map(|&c| cells[row * width + c].clone())
            .collect();
        match index.get(&key) {
            Some(&slot) => order[slot].1.push(row),
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, vec![row]));
            }
        }
    }

    order
}

/// Render a grouping-key tuple for error messages and logs.
pub(crate) fn format_key(key: &[Cell]) -> String {
    key.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> DataSet {
        DataSet::from_columns(
            vec![
                (
                    "Subject".to_string(),
                    vec![1i64.into(), 1i64.into(), 2i64.into(), 2i64.into()],
                ),
                (
                    "Timestamp".to_string(),
                    vec![0i64.into(), 100i64.into(), 0i64.into(), 100i64.into()],
                ),
            ],
            vec![("Plaus".to_string(), vec![1.0, 2.0, 3.0, 4.0])],
            vec![("Cz".to_string(), vec![0.5, 1.5, 2.5, 3.5])],
        )
        .unwrap()
    }

    #[test]
    fn layout_is_descriptors_predictors_channels() {
        let ds = toy();
        assert_eq!(ds.width(), 4);
        assert_eq!(ds.descriptors.get("Subject"), Some(0));
        assert_eq!(ds.descriptors.get("Timestamp"), Some(1));
        assert_eq!(ds.predictors.get("Plaus"), Some(2));
        assert_eq!(ds.channels.get("Cz"), Some(3));
        assert_eq!(ds.channel_values("Cz").unwrap(), vec![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn mismatched_column_lengths_are_rejected() {
        let err = DataSet::from_columns(
            vec![("Subject".to_string(), vec![1i64.into()])],
            vec![("Plaus".to_string(), vec![1.0, 2.0])],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn duplicate_names_across_classes_are_rejected() {
        let err = DataSet::from_columns(
            vec![("Cz".to_string(), vec![1i64.into()])],
            vec![],
            vec![("Cz".to_string(), vec![0.5])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { .. }));
    }

    #[test]
    fn unknown_column_lookups_carry_the_class() {
        let ds = toy();
        let err = ds.channel_index("Pz").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownColumn {
                class: ColumnClass::Channel,
                ..
            }
        ));
    }

    #[test]
    fn grouping_is_ordered_by_first_occurrence() {
        let ds = toy();
        let subj = ds.descriptor_index("Subject").unwrap();
        let groups = group_by_key(&ds.cells, ds.width, ds.n_rows, &[subj]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, vec![Cell::Num(1.0)]);
        assert_eq!(groups[0].1, vec![0, 1]);
        assert_eq!(groups[1].0, vec![Cell::Num(2.0)]);
        assert_eq!(groups[1].1, vec![2, 3]);
    }

    #[test]
    fn clone_shares_no_storage() {
        let ds = toy();
        let mut copy = ds.clone();
        copy.set(0, 2, Cell::Num(99.0));
        assert_eq!(ds.num(0, 2), 1.0);
        assert_eq!(copy.num(0, 2), 99.0);
    }
}
