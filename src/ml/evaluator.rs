// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model in inference form over a whole split and
// collects what the reports need: mean loss, predicted labels,
// true labels.
//
// Loss is weighted by batch size, so a short final batch counts
// for exactly its share of the split and the result equals the
// loss over the split computed in one pass.

use burn::{
    data::dataloader::DataLoader,
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
};

use crate::data::batcher::{MnistBatch, SentimentBatch};
use crate::infra::metrics::{accuracy_percent, ConfusionMatrix};
use crate::ml::{mnist_model::MnistMlp, sentiment_model::SentimentBiLstm};

/// Mean cross-entropy of `logits` [batch, classes] against class ids.
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

/// Argmax class per row.
pub fn predicted_classes<B: Backend>(logits: Tensor<B, 2>) -> Vec<usize> {
    let [batch, _] = logits.dims();
    // argmax keeps the reduced dim: [batch, 1]
    logits
        .argmax(1)
        .reshape([batch])
        .into_data()
        .iter::<i64>()
        .map(|c| c as usize)
        .collect()
}

fn class_ids<B: Backend>(targets: Tensor<B, 1, Int>) -> Vec<usize> {
    targets.into_data().iter::<i64>().map(|c| c as usize).collect()
}

// ─── Accumulator ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ClassificationTally {
    loss_sum:    f64,
    samples:     usize,
    predictions: Vec<usize>,
    labels:      Vec<usize>,
}

impl ClassificationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// `batch_loss` is the mean loss of this batch.
    pub fn add_batch<B: Backend>(
        &mut self,
        batch_loss: f64,
        logits:     Tensor<B, 2>,
        targets:    Tensor<B, 1, Int>,
    ) {
        let batch = targets.dims()[0];
        self.loss_sum += batch_loss * batch as f64;
        self.samples  += batch;
        self.predictions.extend(predicted_classes(logits));
        self.labels.extend(class_ids(targets));
    }

    pub fn finish(self) -> ClassifierEvaluation {
        let loss = if self.samples > 0 {
            self.loss_sum / self.samples as f64
        } else { f64::NAN };
        ClassifierEvaluation {
            loss,
            accuracy:    accuracy_percent(&self.predictions, &self.labels),
            predictions: self.predictions,
            labels:      self.labels,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierEvaluation {
    pub loss:        f64,
    /// Percent
    pub accuracy:    f64,
    pub predictions: Vec<usize>,
    pub labels:      Vec<usize>,
}

impl ClassifierEvaluation {
    pub fn confusion(&self, num_classes: usize) -> ConfusionMatrix {
        ConfusionMatrix::from_labels(num_classes, &self.labels, &self.predictions)
    }
}

// ─── Whole-split evaluation ───────────────────────────────────────────────────

pub fn evaluate_sentiment<B: Backend>(
    model:  &SentimentBiLstm<B>,
    loader: &dyn DataLoader<SentimentBatch<B>>,
) -> ClassifierEvaluation {
    let mut tally = ClassificationTally::new();
    for batch in loader.iter() {
        let logits = model.forward(&batch);
        let loss   = cross_entropy(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        tally.add_batch(loss, logits, batch.labels);
    }
    tally.finish()
}

pub fn evaluate_mnist<B: Backend>(
    model:  &MnistMlp<B>,
    loader: &dyn DataLoader<MnistBatch<B>>,
) -> ClassifierEvaluation {
    let mut tally = ClassificationTally::new();
    for batch in loader.iter() {
        let logits = model.forward(batch.images);
        let loss   = cross_entropy(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        tally.add_batch(loss, logits, batch.targets);
    }
    tally.finish()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn logits(values: Vec<f32>, rows: usize) -> Tensor<TestBackend, 2> {
        Tensor::from_data(TensorData::new(values, [rows, 2]), &Default::default())
    }

    fn targets(ids: &[i32]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_ints(ids, &Default::default())
    }

    #[test]
    fn test_predicted_classes_is_row_argmax() {
        let l = logits(vec![0.1, 0.9, 2.0, -1.0, 0.0, 0.5], 3);
        assert_eq!(predicted_classes(l), vec![1, 0, 1]);
    }

    #[test]
    fn test_tally_weights_loss_by_batch_size() {
        let mut tally = ClassificationTally::new();
        tally.add_batch(1.0, logits(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0], 3), targets(&[1, 1, 1]));
        tally.add_batch(4.0, logits(vec![1.0, 0.0], 1), targets(&[1]));
        let eval = tally.finish();

        // (1.0 * 3 + 4.0 * 1) / 4
        assert!((eval.loss - 1.75).abs() < 1e-12);
        assert!((eval.accuracy - 75.0).abs() < 1e-12);
        assert_eq!(eval.predictions, vec![1, 1, 1, 0]);
        assert_eq!(eval.labels, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_confusion_from_evaluation() {
        let mut tally = ClassificationTally::new();
        tally.add_batch(0.5, logits(vec![1.0, 0.0, 0.0, 1.0], 2), targets(&[0, 0]));
        let m = tally.finish().confusion(2);
        assert_eq!(m.get(0, 0), 1);
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.trace(), 1);
    }

    #[test]
    fn test_cross_entropy_of_confident_correct_logits_is_small() {
        let l = logits(vec![10.0, -10.0], 1);
        let loss = cross_entropy(l, targets(&[0])).into_scalar().elem::<f64>();
        assert!(loss < 1e-3);
    }
}
