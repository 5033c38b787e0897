//! Model-based estimation and residual computation.
//!
//! [`estimate`] produces the regression-based waveforms: for every row, the
//! fitted model of that row's grouping key is evaluated at the row's *own*
//! predictor values. Zeroing a predictor on a cloned table before calling
//! this gives the counterfactual "effect of the remaining predictors" view.
//!
//! [`residuals`] subtracts an estimated table from an observed one; both must
//! be row-aligned (identical descriptor tuples in identical order).

use std::collections::HashMap;

use crate::data::table::{Cell, DataSet, format_key};
use crate::error::{ColumnClass, Error, Result};
use crate::fit::regress::ModelSet;

/// Replace every channel value with the model-fitted value for that row.
///
/// The lookup key is the tuple of the table's values over the descriptors the
/// models were fit on; a key with no fitted model is an error (it means the
/// table does not correspond to the one passed to `regress`).
pub fn estimate(data: &DataSet, models: &ModelSet) -> Result<DataSet> {
    // Resolve the model's grouping descriptors and predictors against `data`.
    let key_cols: Vec<usize> = models
        .descriptors
        .names()
        .map(|n| data.descriptor_index(n))
        .collect::<Result<_>>()?;
    // models.predictors[0] is the intercept; the rest are real columns.
    let pred_cols: Vec<usize> = models.predictors[1..]
        .iter()
        .map(|p| data.predictor_index(p))
        .collect::<Result<_>>()?;

    // Each channel of the table needs a full coefficient set in the models.
    let mut channel_coef_cols: Vec<(usize, Vec<usize>)> = Vec::with_capacity(data.channels.len());
    for (channel, col) in data.channels.iter() {
        let coef_cols: Vec<usize> = models
            .predictors
            .iter()
            .map(|p| {
                models
                    .coefficients
                    .get(channel, p)
                    .ok_or_else(|| Error::UnknownColumn {
                        class: ColumnClass::Channel,
                        name: channel.to_string(),
                    })
            })
            .collect::<Result<_>>()?;
        channel_coef_cols.push((col, coef_cols));
    }

    let model_desc_cols: Vec<usize> = models.descriptors.iter().map(|(_, i)| i).collect();
    let mut model_rows: HashMap<Vec<Cell>, usize> = HashMap::with_capacity(models.n_rows());
    for row in 0..models.n_rows() {
        model_rows.insert(models.key_of(row, &model_desc_cols), row);
    }

    let mut out = data.clone();
    for row in 0..data.n_rows() {
        let key = data.key_of(row, &key_cols);
        let model_row = *model_rows.get(&key).ok_or_else(|| Error::MissingModel {
            group: format_key(&key),
        })?;

        for (channel_col, coef_cols) in &channel_coef_cols {
            // intercept + sum(slope_p * predictor_p), using this row's values.
            let mut fitted = models.num(model_row, coef_cols[0]);
            for (slope_col, &pred_col) in coef_cols[1..].iter().zip(pred_cols.iter()) {
                fitted += models.num(model_row, *slope_col) * data.num(row, pred_col);
            }
            out.set(row, *channel_col, Cell::Num(fitted));
        }
    }

    Ok(out)
}

/// Per-row, per-channel difference `observed - estimated`.
///
/// The two tables must have the same descriptor and channel mappings, the
/// same number of rows, and identical descriptor tuples in identical order.
pub fn residuals(observed: &DataSet, estimated: &DataSet) -> Result<DataSet> {
    check_aligned(observed, estimated)?;

    let mut out = observed.clone();
    for (_, col) in observed.channels.iter() {
        for row in 0..observed.n_rows() {
            let r = observed.num(row, col) - estimated.num(row, col);
            out.set(row, col, Cell::Num(r));
        }
    }
    Ok(out)
}

fn check_aligned(a: &DataSet, b: &DataSet) -> Result<()> {
    if a.descriptors != b.descriptors || a.channels != b.channels {
        return Err(Error::ShapeMismatch {
            detail: "tables have different column mappings".to_string(),
        });
    }
    if a.n_rows() != b.n_rows() {
        return Err(Error::ShapeMismatch {
            detail: format!("tables have {} vs {} rows", a.n_rows(), b.n_rows()),
        });
    }
    let desc_cols: Vec<usize> = a.descriptors.iter().map(|(_, i)| i).collect();
    for row in 0..a.n_rows() {
        if a.key_of(row, &desc_cols) != b.key_of(row, &desc_cols) {
            return Err(Error::ShapeMismatch {
                detail: format!("descriptor tuples differ at row {row}"),
            });
        }
    }
    Ok(())
}
