// ============================================================
// Layer 3 — LabelledSentence Domain Type
// ============================================================
// One row of a sentiment split: the raw sentence text and its
// class label (0 = negative, 1 = positive for SST-2).

use serde::{Deserialize, Serialize};

/// Number of sentiment classes the BiLSTM head predicts.
pub const NUM_SENTIMENT_CLASSES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledSentence {
    pub text:  String,
    pub label: usize,
}

impl LabelledSentence {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}

/// Share of the most frequent label, in [0, 1].
///
/// This is the accuracy a classifier gets by always predicting the
/// majority class, printed before training as a baseline.
pub fn no_information_rate(labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let mut counts = vec![0usize; labels.iter().copied().max().unwrap_or(0) + 1];
    for &l in labels {
        counts[l] += 1;
    }
    let majority = counts.into_iter().max().unwrap_or(0);
    majority as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_information_rate_picks_majority() {
        let labels = [1, 1, 0, 1];
        assert!((no_information_rate(&labels) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_no_information_rate_empty() {
        assert_eq!(no_information_rate(&[]), 0.0);
    }
}
