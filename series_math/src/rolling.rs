//! Rolling-window statistics over NaN-padded series
//!
//! Positions without a full window are reported as `f64::NAN` so the
//! output stays aligned with the input, the same convention lag features
//! use. A NaN anywhere inside a window makes that window's statistic NaN.

use crate::{MathError, Result};

/// Centered rolling mean.
///
/// The mean at index `i` straddles `i`: the window covers
/// `[i - window/2, i + (window - 1)/2]`. The first `window/2` and last
/// `(window - 1)/2` positions have no full window and come back as NaN.
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window size must be greater than zero".to_string(),
        ));
    }

    let n = values.len();
    let left = window / 2;
    let right = window - 1 - left;

    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        if i < left || i + right >= n {
            continue;
        }
        let slice = &values[i - left..=i + right];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().sum::<f64>() / window as f64;
    }

    Ok(out)
}

/// Trailing rolling standard deviation (sample variance, n - 1 denominator).
///
/// The statistic at index `i` covers `[i - window + 1, i]`; the first
/// `window - 1` positions are NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window < 2 {
        return Err(MathError::InvalidInput(
            "Window size must be at least 2 for a standard deviation".to_string(),
        ));
    }

    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|v| (v - mean) * (v - mean)).sum();
        out[i] = (ss / (window - 1) as f64).sqrt();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rolling_mean_odd_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let means = centered_rolling_mean(&values, 3).unwrap();

        // One NaN at each end, full windows elsewhere
        assert!(means[0].is_nan());
        assert!(means[6].is_nan());
        assert_eq!(means[1], 2.0); // (1 + 2 + 3) / 3
        assert_eq!(means[3], 4.0); // (3 + 4 + 5) / 3
        assert_eq!(means[5], 6.0); // (5 + 6 + 7) / 3
    }

    #[test]
    fn test_centered_rolling_mean_even_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let means = centered_rolling_mean(&values, 4).unwrap();

        // Even windows lean left: two NaN at the head, one at the tail
        assert!(means[0].is_nan());
        assert!(means[1].is_nan());
        assert!(means[5].is_nan());
        assert_eq!(means[2], 2.5); // (1 + 2 + 3 + 4) / 4
        assert_eq!(means[4], 4.5); // (3 + 4 + 5 + 6) / 4
    }

    #[test]
    fn test_centered_rolling_mean_window_larger_than_data() {
        let values = vec![1.0, 2.0];
        let means = centered_rolling_mean(&values, 7).unwrap();
        assert!(means.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rolling_std() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stds = rolling_std(&values, 3).unwrap();

        assert!(stds[0].is_nan());
        assert!(stds[1].is_nan());
        // Consecutive integers always have sample std 1.0 at window 3
        assert!((stds[2] - 1.0).abs() < 1e-12);
        assert!((stds[3] - 1.0).abs() < 1e-12);
        assert!((stds[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_propagates_nan() {
        let values = vec![f64::NAN, 2.0, 3.0, 4.0, 5.0];
        let stds = rolling_std(&values, 3).unwrap();

        // Windows touching the NaN stay NaN
        assert!(stds[2].is_nan());
        assert!(!stds[3].is_nan());
    }

    #[test]
    fn test_invalid_windows() {
        assert!(centered_rolling_mean(&[1.0], 0).is_err());
        assert!(rolling_std(&[1.0, 2.0], 1).is_err());
    }
}
