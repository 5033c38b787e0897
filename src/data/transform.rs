//! Column-wise transformations over a [`DataSet`].
//!
//! All of these either mutate values in place (level renames, predictor
//! recoding) or relabel a mapping without touching storage (predictor
//! renames). Row filtering returns a fresh table and preserves row order.
//!
//! The z-score uses the population standard deviation (divide by `n`), so a
//! four-point column `[1, 2, 3, 4]` maps to `[-1.3416.., -0.4472.., 0.4472..,
//! 1.3416..]`.

use crate::data::table::{Cell, DataSet};
use crate::error::{Error, Result};
use crate::math::{mean, population_stddev};

impl DataSet {
    /// Replace every occurrence of `old` with `new` in the named descriptor
    /// column. Matching no row is a no-op, not an error.
    pub fn rename_level(
        &mut self,
        descriptor: &str,
        old: impl Into<Cell>,
        new: impl Into<Cell>,
    ) -> Result<()> {
        let col = self.descriptor_index(descriptor)?;
        let old = old.into();
        let new = new.into();
        for row in 0..self.n_rows() {
            if *self.cell(row, col) == old {
                self.set(row, col, new.clone());
            }
        }
        Ok(())
    }

    /// Rename a predictor key. The column index and all values are untouched.
    pub fn rename_predictor(&mut self, old: &str, new: &str) -> Result<()> {
        if self.predictors.contains(new) {
            return Err(Error::DuplicateColumn {
                name: new.to_string(),
            });
        }
        // Resolve first so an unknown `old` reports as such.
        self.predictor_index(old)?;
        self.predictors.rename(old, new);
        Ok(())
    }

    /// Apply `f` to every value of a predictor column.
    ///
    /// This is also the counterfactual hook: clone the table, map a predictor
    /// to zero, and estimate against previously fitted models.
    pub fn map_predictor(&mut self, predictor: &str, f: impl Fn(f64) -> f64) -> Result<()> {
        let col = self.predictor_index(predictor)?;
        for row in 0..self.n_rows() {
            let v = self.num(row, col);
            self.set(row, col, Cell::Num(f(v)));
        }
        Ok(())
    }

    /// Flip the polarity of a rating-scale predictor: `v -> max - v`.
    ///
    /// E.g. inverting a 1..7 plausibility scale with `max = 7` maps 2 to 5,
    /// so that larger transformed values mean *less* plausible.
    pub fn invert_predictor(&mut self, predictor: &str, max: f64) -> Result<()> {
        self.map_predictor(predictor, |v| max - v)
    }

    /// Standardize a predictor to mean 0, unit (population) variance over all
    /// rows currently in the table. A constant column is an error rather than
    /// a division by zero.
    pub fn zscore_predictor(&mut self, predictor: &str) -> Result<()> {
        let values = self.predictor_values(predictor)?;
        if values.is_empty() {
            return Err(Error::ZeroVariance {
                column: predictor.to_string(),
            });
        }
        let m = mean(&values);
        let sd = population_stddev(&values);
        if sd == 0.0 {
            return Err(Error::ZeroVariance {
                column: predictor.to_string(),
            });
        }
        self.map_predictor(predictor, |v| (v - m) / sd)
    }

    /// Keep the rows whose value in the named descriptor satisfies `keep`,
    /// preserving order. Mappings carry over unchanged.
    pub fn select_where(&self, descriptor: &str, keep: impl Fn(&Cell) -> bool) -> Result<DataSet> {
        let col = self.descriptor_index(descriptor)?;
        let mut out = self.clone();
        let mut cells = Vec::new();
        let mut n_rows = 0;
        for row in 0..self.n_rows() {
            if keep(self.cell(row, col)) {
                cells.extend_from_slice(&self.cells[row * self.width..(row + 1) * self.width]);
                n_rows += 1;
            }
        }
        out.cells = cells;
        out.n_rows = n_rows;
        Ok(out)
    }

    /// Keep the rows whose numeric value in the named descriptor lies in the
    /// half-open window `[start, end)` (the time-window convention).
    ///
    /// Fails if the descriptor holds non-numeric values.
    pub fn select_window(&self, descriptor: &str, start: f64, end: f64) -> Result<DataSet> {
        let col = self.descriptor_index(descriptor)?;
        for row in 0..self.n_rows() {
            if self.cell(row, col).as_num().is_none() {
                return Err(Error::ShapeMismatch {
                    detail: format!("descriptor '{descriptor}' is not numeric at row {row}"),
                });
            }
        }
        self.select_where(descriptor, |c| match c.as_num() {
            Some(v) => v >= start && v < end,
            None => false,
        })
    }
}
