use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::vocab::PAD_ID;

// ─── Sentiment ────────────────────────────────────────────────────────────────

/// One encoded sentence: `max_seq_len` ids, right-padded with 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

impl SentimentSample {
    /// Number of real (non-padding) tokens.
    ///
    /// Padding only ever appears at the end, so this is also the
    /// index one past the last real token.
    pub fn length(&self) -> usize {
        self.token_ids.iter().take_while(|&&id| id != PAD_ID).count()
    }
}

#[derive(Clone)]
pub struct SentimentDataset {
    samples: Vec<SentimentSample>,
}

impl SentimentDataset {
    pub fn new(samples: Vec<SentimentSample>) -> Self { Self { samples } }

    /// Zip encoded sequences with their labels.
    pub fn from_parts(sequences: Vec<Vec<u32>>, labels: &[usize]) -> Self {
        let samples = sequences
            .into_iter()
            .zip(labels.iter().copied())
            .map(|(token_ids, label)| SentimentSample { token_ids, label })
            .collect();
        Self::new(samples)
    }
}

impl Dataset<SentimentSample> for SentimentDataset {
    fn get(&self, index: usize) -> Option<SentimentSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Chirp ────────────────────────────────────────────────────────────────────

/// A window of the signal and the window one step later.
///
/// `target[..seq_len - 1] == input[1..]`, and the last target
/// value is the point the model has to forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChirpSample {
    pub input:  Vec<f32>,
    pub target: Vec<f32>,
}

#[derive(Clone)]
pub struct ChirpDataset {
    samples: Vec<ChirpSample>,
}

impl ChirpDataset {
    /// Pair each window with its successor.
    pub fn from_windows(windows: &[Vec<f32>]) -> Self {
        let samples = windows
            .windows(2)
            .map(|pair| ChirpSample { input: pair[0].clone(), target: pair[1].clone() })
            .collect();
        Self { samples }
    }
}

impl Dataset<ChirpSample> for ChirpDataset {
    fn get(&self, index: usize) -> Option<ChirpSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
