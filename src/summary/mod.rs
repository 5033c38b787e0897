//! Grouped means and standard errors, for channel data and coefficients.
//!
//! A summary groups rows by a tuple of descriptors and reduces every numeric
//! column to its mean and its standard error of the mean, keeping the two
//! result tables row-aligned. Summaries are ordinary tables, so a summary can
//! be summarized again; that composition is how the canonical two-stage
//! averaging is expressed:
//!
//! ```text
//! per-subject:  summarize(data,  ["Condition", "Subject", "Timestamp"])
//! grand:        per_subject.resummarize(["Condition", "Timestamp"])
//! ```
//!
//! Collapsing trial-level rows across subjects in a single pass weights
//! subjects by their trial counts and gives a different (biased) answer when
//! counts are unequal; the two-stage form weights each subject equally. The
//! pipeline never hard-codes two levels, it just re-applies the same pure
//! function.

use serde::{Deserialize, Serialize};

use crate::data::table::{Cell, ColumnMap, DataSet, group_by_key};
use crate::error::{ColumnClass, Error, Result};
use crate::fit::regress::{CoefficientMap, ModelSet};
use crate::math::{mean, sem};

/// Half-width convention for shaded uncertainty bands.
///
/// The original workflow draws `2 x SEM` bands (roughly a 95% interval); this
/// is an explicit choice the presentation layer makes, not a hidden constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBand {
    /// `+/- 1 x SEM`.
    Sem,
    /// `+/- 2 x SEM` (approximate 95% coverage).
    TwoSem,
}

impl ErrorBand {
    pub fn half_width(self, sem: f64) -> f64 {
        match self {
            ErrorBand::Sem => sem,
            ErrorBand::TwoSem => 2.0 * sem,
        }
    }

    /// Lower and upper band edges around a mean.
    pub fn bounds(self, mean: f64, sem: f64) -> (f64, f64) {
        let h = self.half_width(sem);
        (mean - h, mean + h)
    }
}

/// Row-aligned grouped means and SEMs of a [`DataSet`]'s channels.
///
/// The `means` table carries the grouping descriptors and one channel column
/// per source channel; predictors do not survive aggregation. `sems` has the
/// identical shape. A group of one row reports a SEM of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSummary {
    pub means: DataSet,
    pub sems: DataSet,
}

impl DataSummary {
    /// Group `data` by the named descriptors and reduce every channel.
    /// Output rows are ordered by first occurrence of each grouping tuple.
    pub fn new(data: &DataSet, groups: &[&str]) -> Result<DataSummary> {
        let group_cols: Vec<usize> = groups
            .iter()
            .map(|g| data.descriptor_index(g))
            .collect::<Result<_>>()?;
        let channel_cols: Vec<usize> = data.channels.iter().map(|(_, i)| i).collect();

        let grouped = group_by_key(&data.cells, data.width, data.n_rows, &group_cols);
        log::debug!(
            "summarizing {} rows into {} groups over [{}]",
            data.n_rows(),
            grouped.len(),
            groups.join(", ")
        );

        let descriptors = ColumnMap::from_names(groups.iter().copied(), 0);
        let channels = ColumnMap::from_names(data.channels.names(), groups.len());
        let width = groups.len() + channel_cols.len();

        let mut mean_cells = Vec::with_capacity(grouped.len() * width);
        let mut sem_cells = Vec::with_capacity(grouped.len() * width);
        for (key, rows) in &grouped {
            mean_cells.extend(key.iter().cloned());
            sem_cells.extend(key.iter().cloned());
            for &col in &channel_cols {
                let values: Vec<f64> = rows.iter().map(|&r| data.num(r, col)).collect();
                mean_cells.push(Cell::Num(mean(&values)));
                sem_cells.push(Cell::Num(sem(&values)));
            }
        }

        let n_rows = grouped.len();
        let means = DataSet::from_parts(
            mean_cells,
            width,
            n_rows,
            descriptors.clone(),
            ColumnMap::default(),
            channels.clone(),
        );
        let sems = DataSet::from_parts(
            sem_cells,
            width,
            n_rows,
            descriptors,
            ColumnMap::default(),
            channels,
        );

        Ok(DataSummary { means, sems })
    }

    /// Summarize this summary's `means` by a coarser grouping (the second
    /// stage of subject-then-group averaging).
    pub fn resummarize(&self, groups: &[&str]) -> Result<DataSummary> {
        DataSummary::new(&self.means, groups)
    }
}

/// Row-aligned grouped means and SEMs of a [`ModelSet`]'s coefficients.
///
/// Same discipline as [`DataSummary`], over composite `(channel, predictor)`
/// columns instead of plain channels. The summary sets carry no per-fit
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub means: ModelSet,
    pub sems: ModelSet,
}

impl ModelSummary {
    /// Group fitted models by the named descriptors (typically just the time
    /// sample, averaging over subjects) and reduce every coefficient column.
    pub fn new(models: &ModelSet, groups: &[&str]) -> Result<ModelSummary> {
        let group_cols: Vec<usize> = groups
            .iter()
            .map(|g| {
                models.descriptors.get(g).ok_or_else(|| Error::UnknownColumn {
                    class: ColumnClass::Descriptor,
                    name: g.to_string(),
                })
            })
            .collect::<Result<_>>()?;
        let coef_cols: Vec<usize> = models.coefficients.iter().map(|(_, _, i)| i).collect();

        let grouped = group_by_key(&models.cells, models.width, models.n_rows, &group_cols);

        let descriptors = ColumnMap::from_names(groups.iter().copied(), 0);
        let mut coefficients = CoefficientMap::default();
        for (i, (channel, predictor, _)) in models.coefficients.iter().enumerate() {
            coefficients.push(channel, predictor, groups.len() + i);
        }
        let width = groups.len() + coef_cols.len();

        let mut mean_cells = Vec::with_capacity(grouped.len() * width);
        let mut sem_cells = Vec::with_capacity(grouped.len() * width);
        for (key, rows) in &grouped {
            mean_cells.extend(key.iter().cloned());
            sem_cells.extend(key.iter().cloned());
            for &col in &coef_cols {
                let values: Vec<f64> = rows.iter().map(|&r| models.num(r, col)).collect();
                mean_cells.push(Cell::Num(mean(&values)));
                sem_cells.push(Cell::Num(sem(&values)));
            }
        }

        let n_rows = grouped.len();
        let make = |cells: Vec<Cell>| ModelSet {
            cells,
            width,
            n_rows,
            descriptors: descriptors.clone(),
            predictors: models.predictors.clone(),
            coefficients: coefficients.clone(),
            channels: models.channels.clone(),
            stats: Vec::new(),
        };

        Ok(ModelSummary {
            means: make(mean_cells),
            sems: make(sem_cells),
        })
    }

    /// Mean slope trajectory anchored to the mean intercept trajectory, in
    /// summary row order. Anchoring shows each slope relative to the baseline
    /// waveform instead of centered at zero.
    pub fn anchored(&self, channel: &str, predictor: &str) -> Result<Vec<f64>> {
        if !self.means.predictors.iter().any(|p| p == predictor) {
            return Err(Error::UnknownColumn {
                class: ColumnClass::Predictor,
                name: predictor.to_string(),
            });
        }
        let intercept = &self.means.predictors[0];
        let icol = self
            .means
            .coefficients
            .get(channel, intercept)
            .ok_or_else(|| Error::UnknownColumn {
                class: ColumnClass::Channel,
                name: channel.to_string(),
            })?;
        let scol = self
            .means
            .coefficients
            .get(channel, predictor)
            .ok_or_else(|| Error::UnknownColumn {
                class: ColumnClass::Channel,
                name: channel.to_string(),
            })?;

        Ok((0..self.means.n_rows())
            .map(|row| self.means.num(row, icol) + self.means.num(row, scol))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::regress::{INTERCEPT, regress};

    /// Two subjects under one condition with unequal trial counts {3, 1}.
    fn unequal_trials() -> DataSet {
        DataSet::from_columns(
            vec![
                (
                    "Condition".to_string(),
                    vec!["c".into(), "c".into(), "c".into(), "c".into()],
                ),
                (
                    "Subject".to_string(),
                    vec!["A".into(), "A".into(), "A".into(), "B".into()],
                ),
            ],
            vec![],
            vec![("Cz".to_string(), vec![1.0, 2.0, 3.0, 10.0])],
        )
        .unwrap()
    }

    #[test]
    fn grouped_mean_and_sem_are_hand_checkable() {
        let ds = unequal_trials();
        let s = DataSummary::new(&ds, &["Subject"]).unwrap();

        assert_eq!(s.means.n_rows(), 2);
        let cz = s.means.channel_index("Cz").unwrap();
        assert!((s.means.num(0, cz) - 2.0).abs() < 1e-12);
        assert!((s.means.num(1, cz) - 10.0).abs() < 1e-12);

        // stddev([1,2,3], ddof=1) = 1, n = 3.
        assert!((s.sems.num(0, cz) - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
        // Single-trial subject: no spread estimate, SEM reported as zero.
        assert_eq!(s.sems.num(1, cz), 0.0);
    }

    #[test]
    fn means_and_sems_are_row_aligned() {
        let ds = unequal_trials();
        let s = DataSummary::new(&ds, &["Condition", "Subject"]).unwrap();
        assert_eq!(s.means.n_rows(), s.sems.n_rows());
        assert_eq!(s.means.descriptors, s.sems.descriptors);
        assert_eq!(s.means.channels, s.sems.channels);
        for row in 0..s.means.n_rows() {
            assert_eq!(s.means.cell(row, 0), s.sems.cell(row, 0));
            assert_eq!(s.means.cell(row, 1), s.sems.cell(row, 1));
        }
    }

    #[test]
    fn two_stage_averaging_differs_from_pooled_when_counts_are_unequal() {
        let ds = unequal_trials();
        let cz_pooled = {
            let s = DataSummary::new(&ds, &["Condition"]).unwrap();
            let cz = s.means.channel_index("Cz").unwrap();
            s.means.num(0, cz)
        };
        let cz_two_stage = {
            let per_subject = DataSummary::new(&ds, &["Condition", "Subject"]).unwrap();
            let grand = per_subject.resummarize(&["Condition"]).unwrap();
            let cz = grand.means.channel_index("Cz").unwrap();
            grand.means.num(0, cz)
        };

        // Pooled: (1+2+3+10)/4. Two-stage: mean of subject means (2, 10).
        assert!((cz_pooled - 4.0).abs() < 1e-12);
        assert!((cz_two_stage - 6.0).abs() < 1e-12);
        assert!((cz_two_stage - cz_pooled - 2.0).abs() < 1e-12);
    }

    #[test]
    fn model_summary_averages_coefficients_over_subjects() {
        // Two subjects, each with an exact line: y = s + 2x.
        let ds = DataSet::from_columns(
            vec![
                (
                    "Subject".to_string(),
                    vec![1i64.into(), 1i64.into(), 1i64.into(), 2i64.into(), 2i64.into(), 2i64.into()],
                ),
                (
                    "Timestamp".to_string(),
                    vec![0i64.into(); 6],
                ),
            ],
            vec![("x".to_string(), vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0])],
            vec![("Cz".to_string(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0])],
        )
        .unwrap();
        let models = regress(&ds, &["Subject", "Timestamp"], &["x"]).unwrap();
        let summary = ModelSummary::new(&models, &["Timestamp"]).unwrap();

        assert_eq!(summary.means.n_rows(), 1);
        let im = summary.means.coefficient(0, "Cz", INTERCEPT).unwrap();
        let sm = summary.means.coefficient(0, "Cz", "x").unwrap();
        assert!((im - 1.5).abs() < 1e-9);
        assert!((sm - 2.0).abs() < 1e-9);

        // Intercepts 1 and 2: stddev = sqrt(0.5), n = 2.
        let isem = summary.sems.coefficient(0, "Cz", INTERCEPT).unwrap();
        assert!((isem - (0.5_f64.sqrt() / 2.0_f64.sqrt())).abs() < 1e-9);
        // Identical slopes across subjects.
        let ssem = summary.sems.coefficient(0, "Cz", "x").unwrap();
        assert!(ssem.abs() < 1e-9);

        let anchored = summary.anchored("Cz", "x").unwrap();
        assert_eq!(anchored.len(), 1);
        assert!((anchored[0] - 3.5).abs() < 1e-9);
    }

    #[test]
    fn error_band_widths_are_explicit() {
        assert_eq!(ErrorBand::Sem.half_width(0.5), 0.5);
        assert_eq!(ErrorBand::TwoSem.half_width(0.5), 1.0);
        assert_eq!(ErrorBand::TwoSem.bounds(1.0, 0.25), (0.5, 1.5));
    }
}
