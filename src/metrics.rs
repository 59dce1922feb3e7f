//! Forecast accuracy metrics

use crate::error::{ModelError, Result};
use ndarray::Array3;

/// Point-forecast error summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute percentage error, in percent. Target entries equal
    /// to zero are skipped.
    pub mape: f64,
}

impl ForecastMetrics {
    /// Compute metrics over aligned prediction/target tensors
    pub fn compute(y_true: &Array3<f64>, y_pred: &Array3<f64>) -> Result<Self> {
        if y_true.dim() != y_pred.dim() {
            return Err(ModelError::shape(format!(
                "prediction shape {:?} does not match target shape {:?}",
                y_pred.dim(),
                y_true.dim()
            )));
        }

        let n = y_true.len() as f64;
        let mse = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n;

        let mut ape_sum = 0.0;
        let mut ape_count = 0usize;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            if *t != 0.0 {
                ape_sum += ((t - p) / t).abs();
                ape_count += 1;
            }
        }
        let mape = if ape_count > 0 {
            100.0 * ape_sum / ape_count as f64
        } else {
            0.0
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_perfect_forecast() {
        let y = Array3::from_shape_fn((2, 3, 1), |(b, t, _)| (b + t) as f64 + 1.0);
        let m = ForecastMetrics::compute(&y, &y).unwrap();
        assert_abs_diff_eq!(m.mse, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.rmse, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.mape, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_known_errors() {
        let y_true = Array3::from_elem((1, 2, 1), 2.0);
        let mut y_pred = y_true.clone();
        y_pred[[0, 0, 0]] = 3.0; // error 1.0

        let m = ForecastMetrics::compute(&y_true, &y_pred).unwrap();
        assert_abs_diff_eq!(m.mse, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.rmse, 0.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.mape, 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_targets_skipped_in_mape() {
        let y_true = Array3::zeros((1, 2, 1));
        let y_pred = Array3::from_elem((1, 2, 1), 1.0);
        let m = ForecastMetrics::compute(&y_true, &y_pred).unwrap();
        assert!(m.mape.is_finite());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let a = Array3::zeros((1, 2, 1));
        let b = Array3::zeros((1, 3, 1));
        assert!(ForecastMetrics::compute(&a, &b).is_err());
    }
}
