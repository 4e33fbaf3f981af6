//! Precision metrics comparing a candidate's own sample to reference rows.

use std::fmt::Debug;

use regionfit_core::SampleSet;

/// Distributional overlap between reference rows and candidate points.
///
/// Both sets arrive aligned to the same columns. Implementations return a
/// value in `[0, 1]`, larger meaning the candidate's region looks more like
/// the reference.
pub trait PrecisionMetric: Send + Sync + Debug {
    fn precision(&self, reference: &SampleSet, candidate: &SampleSet) -> f64;
}

/// Fraction of candidate points whose nearest neighbour in the pooled set is
/// a reference point.
///
/// Distances are Euclidean after scaling each column by the reference range
/// (zero-width columns are left unscaled). A candidate point's own row is
/// excluded from its search and ties go to the reference side. With `m`
/// reference and `k` candidate points drawn from one distribution the
/// expected fraction is `m / (m + k - 1)`, so the result is scaled by
/// `(m + k - 1) / m` and clamped to `[0, 1]`.
///
/// # Example
///
/// ```
/// use regionfit_core::SampleSet;
/// use regionfit_fitness::{NearestNeighbourOverlap, PrecisionMetric};
///
/// let columns = vec!["x".to_string()];
/// let reference = SampleSet::from_rows(columns.clone(), vec![vec![0.0], vec![1.0]]).unwrap();
/// let far = SampleSet::from_rows(columns, vec![vec![50.0], vec![51.0]]).unwrap();
///
/// let metric = NearestNeighbourOverlap;
/// assert_eq!(metric.precision(&reference, &reference), 1.0);
/// assert_eq!(metric.precision(&reference, &far), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbourOverlap;

impl PrecisionMetric for NearestNeighbourOverlap {
    fn precision(&self, reference: &SampleSet, candidate: &SampleSet) -> f64 {
        let m = reference.len();
        let k = candidate.len();
        if m == 0 || k == 0 {
            return 0.0;
        }

        let scales = column_scales(reference);
        let distance = |a: &[f64], b: &[f64]| -> f64 {
            a.iter()
                .zip(b)
                .zip(&scales)
                .map(|((x, y), s)| ((x - y) / s).powi(2))
                .sum::<f64>()
        };

        let hits = candidate
            .iter()
            .enumerate()
            .filter(|&(j, point)| {
                let to_reference = reference
                    .iter()
                    .map(|r| distance(point, r))
                    .fold(f64::INFINITY, f64::min);
                let to_candidate = candidate
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != j)
                    .map(|(_, c)| distance(point, c))
                    .fold(f64::INFINITY, f64::min);
                to_reference <= to_candidate
            })
            .count();

        let fraction = hits as f64 / k as f64;
        (fraction * (m + k - 1) as f64 / m as f64).clamp(0.0, 1.0)
    }
}

fn column_scales(reference: &SampleSet) -> Vec<f64> {
    (0..reference.width())
        .map(|c| {
            let (low, high) = reference
                .iter()
                .map(|row| row[c])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            let range = high - low;
            if range > 0.0 {
                range
            } else {
                1.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(rows: Vec<Vec<f64>>) -> SampleSet {
        SampleSet::from_rows(vec!["x".to_string(), "y".to_string()], rows).unwrap()
    }

    #[test]
    fn test_subset_overlap() {
        let reference = set(vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]);
        // One candidate on a reference point, two clustered far away.
        let candidate = set(vec![vec![0.0, 0.0], vec![9.0, 9.0], vec![9.0, 8.0]]);
        let precision = NearestNeighbourOverlap.precision(&reference, &candidate);
        // hits = 1 of 3, scaled by (4 + 3 - 1) / 4
        assert!((precision - 0.5).abs() < 1e-12, "{precision}");
    }

    #[test]
    fn test_empty_sets() {
        let reference = set(vec![vec![0.0, 0.0]]);
        let empty = set(vec![]);
        assert_eq!(NearestNeighbourOverlap.precision(&reference, &empty), 0.0);
        assert_eq!(NearestNeighbourOverlap.precision(&empty, &reference), 0.0);
    }

    #[test]
    fn test_single_candidate_uses_reference() {
        let reference = set(vec![vec![0.0, 0.0], vec![4.0, 4.0]]);
        let candidate = set(vec![vec![100.0, 100.0]]);
        assert_eq!(NearestNeighbourOverlap.precision(&reference, &candidate), 1.0);
    }

    #[test]
    fn test_scaling_by_reference_range() {
        // x spans 0..1000 in the reference, y spans 0..1.
        let reference = set(vec![vec![0.0, 0.0], vec![1000.0, 1.0]]);
        // Candidate points differ from each other only in x by 10 units,
        // and from the reference in y by 0.5.
        let candidate = set(vec![vec![0.0, 0.5], vec![10.0, 0.5]]);
        // Scaled: candidate-candidate 0.01, candidate-reference >= 0.5.
        assert_eq!(NearestNeighbourOverlap.precision(&reference, &candidate), 0.0);
    }
}
