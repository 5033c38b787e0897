//! Per-group ordinary least squares fitting.
//!
//! [`regress`] fits, for every distinct combination of values over the
//! caller's grouping descriptors (typically subject x timestamp) and
//! independently for every channel, a linear model
//!
//! ```text
//! channel ~ intercept + predictor_1 + ... + predictor_k
//! ```
//!
//! pooling all rows that match the grouping key (trials, conditions, items).
//! Fits across distinct (group, channel) pairs are independent, so groups are
//! dispatched in parallel; output rows stay keyed by first occurrence of each
//! grouping key, never by completion order.
//!
//! A rank-deficient design (fewer pooled rows than parameters, or collinear
//! predictors) aborts the whole call with the offending group and channel.
//! Downstream estimation and summarization rely on every grouping key being
//! covered, so there is no collect-and-continue mode.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::table::{Cell, ColumnMap, DataSet, format_key, group_by_key};
use crate::error::{Error, Result};
use crate::math::solve_least_squares;

/// Reserved predictor name for the intercept column of every fit.
pub const INTERCEPT: &str = "(intercept)";

/// Residual diagnostics of a single (grouping key, channel) fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStats {
    /// Residual sum of squares over the pooled rows.
    pub rss: f64,
    /// Number of pooled observations.
    pub n_obs: usize,
}

impl FitStats {
    pub fn rmse(&self) -> f64 {
        (self.rss / self.n_obs as f64).sqrt()
    }
}

/// Ordered map from composite `(channel, predictor)` keys to column indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientMap {
    entries: Vec<((String, String), usize)>,
}

impl CoefficientMap {
    pub(crate) fn push(&mut self, channel: &str, predictor: &str, col: usize) {
        self.entries
            .push(((channel.to_string(), predictor.to_string()), col));
    }

    pub fn get(&self, channel: &str, predictor: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|((c, p), _)| c == channel && p == predictor)
            .map(|(_, i)| *i)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.entries.iter().map(|((c, p), i)| (c.as_str(), p.as_str(), *i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fitted coefficients, one row per grouping-key value.
///
/// Shaped like a [`DataSet`] whose channels are replaced by composite
/// coefficient columns keyed by `(channel, predictor)`, with [`INTERCEPT`]
/// always the first predictor. Coefficient column order is channel-major in
/// channel order, predictor-minor in the order the caller passed to
/// [`regress`] (which is what keeps downstream alignment exact).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSet {
    pub(crate) cells: Vec<Cell>,
    pub(crate) width: usize,
    pub(crate) n_rows: usize,
    /// Grouping descriptors the models were fit over.
    pub descriptors: ColumnMap,
    /// Predictor names, [`INTERCEPT`] first.
    pub predictors: Vec<String>,
    pub coefficients: CoefficientMap,
    pub(crate) channels: Vec<String>,
    /// Row-major (group x channel) fit diagnostics. Empty on summaries.
    pub(crate) stats: Vec<FitStats>,
}

impl ModelSet {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channels
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * self.width + col]
    }

    pub(crate) fn num(&self, row: usize, col: usize) -> f64 {
        match self.cell(row, col) {
            Cell::Num(v) => *v,
            Cell::Text(_) => unreachable!("coefficient column holds a text cell"),
        }
    }

    /// The fitted coefficient for one grouping-key row.
    pub fn coefficient(&self, row: usize, channel: &str, predictor: &str) -> Option<f64> {
        let col = self.coefficients.get(channel, predictor)?;
        Some(self.num(row, col))
    }

    /// Residual diagnostics for one (grouping-key row, channel) fit, when the
    /// set came straight out of [`regress`]. Summaries carry none.
    pub fn fit_stats(&self, row: usize, channel: &str) -> Option<&FitStats> {
        let ch = self.channels.iter().position(|c| c == channel)?;
        self.stats.get(row * self.channels.len() + ch)
    }

    pub(crate) fn key_of(&self, row: usize, cols: &[usize]) -> Vec<Cell> {
        cols.iter().map(|&c| self.cell(row, c).clone()).collect()
    }
}

/// One fitted group: its key, its coefficient row, and per-channel stats.
struct GroupFit {
    key: Vec<Cell>,
    coefs: Vec<f64>,
    stats: Vec<FitStats>,
}

/// Fit one OLS model per grouping-key value x channel.
///
/// `groups` names descriptor columns; every distinct tuple of their values
/// becomes one grouping key, and all rows matching that key are pooled as the
/// fit's observations. `predictors` names the regression inputs; their order
/// fixes the design-matrix and output column order.
pub fn regress(data: &DataSet, groups: &[&str], predictors: &[&str]) -> Result<ModelSet> {
    let group_cols: Vec<usize> = groups
        .iter()
        .map(|g| data.descriptor_index(g))
        .collect::<Result<_>>()?;
    let pred_cols: Vec<usize> = predictors
        .iter()
        .map(|p| data.predictor_index(p))
        .collect::<Result<_>>()?;
    let channel_cols: Vec<(String, usize)> = data
        .channels
        .iter()
        .map(|(n, i)| (n.to_string(), i))
        .collect();

    let grouped = group_by_key(&data.cells, data.width, data.n_rows, &group_cols);
    let p = pred_cols.len();

    log::debug!(
        "regressing {} groups x {} channels on {} predictors",
        grouped.len(),
        channel_cols.len(),
        p
    );

    let fits: Vec<GroupFit> = grouped
        .into_par_iter()
        .map(|(key, rows)| fit_group(data, key, &rows, &pred_cols, &channel_cols, p))
        .collect::<Result<_>>()?;

    // Assemble the coefficient table: grouping descriptors first, then one
    // column per (channel, predictor) pair, intercept first.
    let descriptors = ColumnMap::from_names(groups.iter().copied(), 0);
    let mut predictor_names = Vec::with_capacity(p + 1);
    predictor_names.push(INTERCEPT.to_string());
    predictor_names.extend(predictors.iter().map(|s| s.to_string()));

    let mut coefficients = CoefficientMap::default();
    let mut col = groups.len();
    for (channel, _) in &channel_cols {
        for pred in &predictor_names {
            coefficients.push(channel, pred, col);
            col += 1;
        }
    }

    let width = col;
    let n_rows = fits.len();
    let mut cells = Vec::with_capacity(n_rows * width);
    let mut stats = Vec::with_capacity(n_rows * channel_cols.len());
    for fit in fits {
        cells.extend(fit.key);
        cells.extend(fit.coefs.into_iter().map(Cell::Num));
        stats.extend(fit.stats);
    }

    Ok(ModelSet {
        cells,
        width,
        n_rows,
        descriptors,
        predictors: predictor_names,
        coefficients,
        channels: channel_cols.into_iter().map(|(n, _)| n).collect(),
        stats,
    })
}

fn fit_group(
    data: &DataSet,
    key: Vec<Cell>,
    rows: &[usize],
    pred_cols: &[usize],
    channel_cols: &[(String, usize)],
    p: usize,
) -> Result<GroupFit> {
    let n = rows.len();

    // One design matrix per group, shared across channels.
    let mut x = DMatrix::<f64>::zeros(n, p + 1);
    for (i, &row) in rows.iter().enumerate() {
        x[(i, 0)] = 1.0;
        for (j, &pc) in pred_cols.iter().enumerate() {
            x[(i, j + 1)] = data.num(row, pc);
        }
    }

    let mut coefs = Vec::with_capacity(channel_cols.len() * (p + 1));
    let mut stats = Vec::with_capacity(channel_cols.len());
    for (channel, cc) in channel_cols {
        let y = DVector::from_iterator(n, rows.iter().map(|&r| data.num(r, *cc)));
        let beta = solve_least_squares(&x, &y).ok_or_else(|| Error::SingularDesign {
            group: format_key(&key),
            channel: channel.clone(),
        })?;

        let rss = (&y - &x * &beta).norm_squared();
        coefs.extend(beta.iter().copied());
        stats.push(FitStats { rss, n_obs: n });
    }

    Ok(GroupFit { key, coefs, stats })
}
