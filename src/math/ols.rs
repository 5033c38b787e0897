//! Ordinary least squares solver.
//!
//! Every regression in this crate has the same shape: a design matrix of an
//! intercept column plus a handful of predictor columns, and one response
//! vector per channel. The parameter dimension is tiny (2-5 columns) while
//! the row count is whatever one grouping key pools, so we solve via SVD,
//! which stays robust for tall matrices and lets us check the rank of the
//! design explicitly instead of silently returning a minimum-norm solution
//! for a deficient system.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoff for the rank check and the solve.
const RANK_TOL: f64 = 1e-10;

/// Solve `min ||y - X b||^2` for `b` using SVD.
///
/// Returns `None` when the design matrix is rank deficient (collinear
/// columns, or fewer rows than columns), or when the solution is non-finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    if max_sv <= 0.0 {
        return None;
    }

    let tol = max_sv * RANK_TOL;
    if svd.rank(tol) < x.ncols() {
        return None;
    }

    match svd.solve(y, tol) {
        Ok(beta) if beta.iter().all(|v| v.is_finite()) => Some(beta),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_line() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn rejects_underdetermined_system() {
        // One observation, two parameters.
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 4.0]);
        let y = DVector::from_row_slice(&[1.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn rejects_collinear_columns() {
        // Second column is 2x the first.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
