//! # Result ranking
//!
//! Turns the raw per-class score vector of a model into the K highest-confidence
//! labeled predictions.
use std::{cmp::Ordering, fmt::Display};

use thiserror::Error;

use crate::labels::LabelTable;

/// Number of predictions shown when the caller does not ask for a specific amount.
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RankError {
    #[error("The model produced {scores} scores but the label table has {labels} labels")]
    LengthMismatch { scores: usize, labels: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub label: String,
    pub score: f32,
}

impl Prediction {
    pub fn as_pair(&self) -> (&str, f32) {
        (self.label.as_str(), self.score)
    }
}

impl Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.4})", self.label, self.score)
    }
}

/// Returns the `k` highest scores paired with their labels, best first.
///
/// `k` larger than the number of classes is clamped. Equal scores keep the lower class
/// id first, and NaN scores rank after every number, so the result is fully determined
/// by the input.
pub fn rank_top_k(
    scores: &[f32],
    labels: &LabelTable,
    k: usize,
) -> Result<Vec<Prediction>, RankError> {
    if scores.len() != labels.len() {
        return Err(RankError::LengthMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    let mut top_k_classes = scores.iter().copied().enumerate().collect::<Vec<_>>();
    // sort_by is stable: ties stay in ascending class id order
    top_k_classes.sort_by(|a, b| descending(a.1, b.1));
    top_k_classes.truncate(k);

    Ok(top_k_classes
        .into_iter()
        .map(|(class_id, score)| Prediction {
            class_id,
            label: labels[class_id].to_string(),
            score,
        })
        .collect())
}

/// Softmax over a score vector, shifted by its maximum to stay finite for large logits.
///
/// Ranking never applies it on its own: the ordering is the same, only the values change.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = scores.iter().map(|x| (x - max).exp()).collect::<Vec<_>>();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|x| x / sum).collect()
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{descending, softmax};

    #[test]
    fn nan_sorts_after_numbers() {
        assert_eq!(descending(f32::NAN, 1.0), Ordering::Greater);
        assert_eq!(descending(f32::NEG_INFINITY, f32::NAN), Ordering::Less);
        assert_eq!(descending(2.0, 1.0), Ordering::Less);
        assert_eq!(descending(0.0, -0.0), Ordering::Equal);
    }

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let probabilities = softmax(&[1.0, 3.0, 2.0, 50.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probabilities[1] > probabilities[2]);
        assert!(probabilities[2] > probabilities[0]);

        // large logits would overflow exp() without the shift
        assert_eq!(softmax(&[1000.0, 1000.0]), vec![0.5, 0.5]);
    }
}
