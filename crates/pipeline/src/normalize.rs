//! Score normalization.
//!
//! Brings score lists from different strategies onto `[0, 1]` so they can
//! be blended.

/// Added to the min-max denominator so a near-constant list never divides
/// by zero
pub const NORMALIZE_EPSILON: f64 = 1e-9;

/// Rescale scores onto `[0, 1]`.
///
/// - empty input gives an empty output
/// - if every value is identical, each is divided by `max(1, |value|)`
/// - otherwise `(v - min) / (max - min + NORMALIZE_EPSILON)`
pub fn normalize_scores(scores: &[f32]) -> Vec<f32> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };

    if scores.iter().all(|&s| s == first) {
        let scale = scores
            .iter()
            .map(|s| f64::from(s.abs()))
            .fold(1.0f64, f64::max);
        return scores
            .iter()
            .map(|&s| (f64::from(s) / scale) as f32)
            .collect();
    }

    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = f64::from(max) - f64::from(min) + NORMALIZE_EPSILON;

    scores
        .iter()
        .map(|&s| ((f64::from(s) - f64::from(min)) / range) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn test_constant_list_is_scaled_not_divided_by_zero() {
        let normalized = normalize_scores(&[5.0, 5.0, 5.0]);
        assert_eq!(normalized, vec![1.0, 1.0, 1.0]);

        // Small constants are left alone
        assert_eq!(normalize_scores(&[0.25, 0.25]), vec![0.25, 0.25]);
        assert_eq!(normalize_scores(&[-3.0]), vec![-1.0]);
    }

    #[test]
    fn test_min_max() {
        let normalized = normalize_scores(&[3.0, 2.0, 1.0]);

        assert!((normalized[0] - 1.0).abs() < 1e-6);
        assert!((normalized[1] - 0.5).abs() < 1e-6);
        assert_eq!(normalized[2], 0.0);
        assert!(normalized.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_keeps_order_and_length() {
        let scores = [10.0, -4.0, 7.5, 0.0];
        let normalized = normalize_scores(&scores);

        assert_eq!(normalized.len(), scores.len());
        assert!(normalized[0] > normalized[2]);
        assert!(normalized[2] > normalized[3]);
        assert!(normalized[3] > normalized[1]);
    }
}
