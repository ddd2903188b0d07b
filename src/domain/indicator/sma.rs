//! Simple Moving Average.
//!
//! SMA[i] = mean(values[i+1-n ..= i]). Undefined for the first (n-1) elements.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_mean(&values[..=i], period))
        .collect()
}

/// Mean of the trailing `period` elements, or `None` when too few exist.
pub(crate) fn window_mean(prefix: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prefix.len() < period {
        return None;
    }
    let window = &prefix[prefix.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert!(series[2].is_some());
        assert!(series[3].is_some());
    }

    #[test]
    fn sma_values() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert!((series[2].unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((series[3].unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_1_is_identity() {
        let series = calculate_sma(&[3.0, 0.0, 7.5], 1);
        assert_eq!(series, vec![Some(3.0), Some(0.0), Some(7.5)]);
    }

    #[test]
    fn sma_zero_is_a_value_not_missing() {
        let series = calculate_sma(&[0.0, 0.0], 2);
        assert_eq!(series, vec![None, Some(0.0)]);
    }

    #[test]
    fn sma_period_0() {
        let series = calculate_sma(&[1.0, 2.0], 0);
        assert_eq!(series, vec![None, None]);
    }

    #[test]
    fn sma_series_shorter_than_period() {
        let series = calculate_sma(&[1.0, 2.0, 3.0], 5);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn sma_empty() {
        assert!(calculate_sma(&[], 3).is_empty());
    }
}
