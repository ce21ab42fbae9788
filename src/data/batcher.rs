// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implement Burn's Batcher trait: stack a Vec of samples into
// the tensors one forward pass consumes.
//
// All samples in a split share one length (sentences are
// pre-padded, chirp windows are fixed), so batching is a
// flatten + reshape:
//   [s1_t1 .. s1_tL, s2_t1 .. sN_tL] → [N, L]
//
// The sentiment batch also carries what the BiLSTM needs to
// treat padding the way packed sequences would:
//   mask          [N, L]  1.0 on real tokens, 0.0 on padding
//   reverse_index [N, L]  per-row permutation that reverses the
//                         real tokens and leaves padding in place
//   last_index    [N, 1]  position of the last real token
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
};
use rand::Rng;

use crate::data::dataset::{ChirpSample, SentimentSample};

// ─── Sentiment ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    pub token_ids:     Tensor<B, 2, Int>,
    pub mask:          Tensor<B, 2>,
    pub reverse_index: Tensor<B, 2, Int>,
    pub last_index:    Tensor<B, 2, Int>,
    pub labels:        Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SentimentBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SentimentBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Index that reverses the first `length` positions of a row of
/// `seq_len` and leaves the rest where they are.
///
/// Applying it twice gives back the identity.
pub fn reverse_within_length(length: usize, seq_len: usize) -> Vec<usize> {
    let length = length.min(seq_len);
    (0..seq_len)
        .map(|t| if t < length { length - 1 - t } else { t })
        .collect()
}

impl<B: Backend> Batcher<SentimentSample, SentimentBatch<B>> for SentimentBatcher<B> {
    fn batch(&self, items: Vec<SentimentSample>) -> SentimentBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.token_ids.len()).unwrap_or(0);

        let mut ids      = Vec::with_capacity(batch_size * seq_len);
        let mut mask     = Vec::with_capacity(batch_size * seq_len);
        let mut reverse  = Vec::with_capacity(batch_size * seq_len);
        let mut last     = Vec::with_capacity(batch_size);
        let mut labels   = Vec::with_capacity(batch_size);

        for sample in &items {
            let length = sample.length();
            ids.extend(sample.token_ids.iter().map(|&x| x as i32));
            mask.extend((0..seq_len).map(|t| if t < length { 1.0f32 } else { 0.0 }));
            reverse.extend(reverse_within_length(length, seq_len).into_iter().map(|i| i as i32));
            // An all-padding row has no last token; point at 0, its output is masked anyway
            last.push(length.saturating_sub(1) as i32);
            labels.push(sample.label as i32);
        }

        let token_ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let mask = Tensor::<B, 2>::from_data(TensorData::new(mask, [batch_size, seq_len]), &self.device);
        let reverse_index = Tensor::<B, 1, Int>::from_ints(reverse.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let last_index = Tensor::<B, 1, Int>::from_ints(last.as_slice(), &self.device)
            .reshape([batch_size, 1]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        SentimentBatch { token_ids, mask, reverse_index, last_index, labels }
    }
}

// ─── Chirp ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChirpBatch<B: Backend> {
    /// [batch, seq_len, 1]
    pub inputs:  Tensor<B, 3>,
    /// [batch, seq_len, 1]
    pub targets: Tensor<B, 3>,
}

#[derive(Clone, Debug)]
pub struct ChirpBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ChirpBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ChirpSample, ChirpBatch<B>> for ChirpBatcher<B> {
    fn batch(&self, items: Vec<ChirpSample>) -> ChirpBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input.len()).unwrap_or(0);

        let inputs: Vec<f32>  = items.iter().flat_map(|s| s.input.iter().copied()).collect();
        let targets: Vec<f32> = items.iter().flat_map(|s| s.target.iter().copied()).collect();

        ChirpBatch {
            inputs:  Tensor::from_data(TensorData::new(inputs, [batch_size, seq_len, 1]), &self.device),
            targets: Tensor::from_data(TensorData::new(targets, [batch_size, seq_len, 1]), &self.device),
        }
    }
}

// ─── MNIST ────────────────────────────────────────────────────────────────────

pub const MNIST_SIDE: usize = 28;

#[derive(Debug, Clone)]
pub struct MnistBatch<B: Backend> {
    /// [batch, 28, 28], pixels scaled to [0, 1]
    pub images:  Tensor<B, 3>,
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct MnistBatcher<B: Backend> {
    pub device: B::Device,
    /// Randomly mirror images left-right (training only)
    pub flip:   bool,
}

impl<B: Backend> MnistBatcher<B> {
    pub fn new(device: B::Device, flip: bool) -> Self {
        Self { device, flip }
    }
}

impl<B: Backend> Batcher<MnistItem, MnistBatch<B>> for MnistBatcher<B> {
    fn batch(&self, items: Vec<MnistItem>) -> MnistBatch<B> {
        let batch_size = items.len();
        let mut rng    = rand::thread_rng();

        let mut pixels  = Vec::with_capacity(batch_size * MNIST_SIDE * MNIST_SIDE);
        let mut targets = Vec::with_capacity(batch_size);

        for item in &items {
            let mirror = self.flip && rng.gen_bool(0.5);
            for row in item.image.iter() {
                if mirror {
                    pixels.extend(row.iter().rev().map(|p| p / 255.0));
                } else {
                    pixels.extend(row.iter().map(|p| p / 255.0));
                }
            }
            targets.push(item.label as i32);
        }

        let images = Tensor::<B, 3>::from_data(
            TensorData::new(pixels, [batch_size, MNIST_SIDE, MNIST_SIDE]),
            &self.device,
        );
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        MnistBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ints<const D: usize>(t: Tensor<TestBackend, D, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    #[test]
    fn test_reverse_within_length() {
        assert_eq!(reverse_within_length(3, 5), vec![2, 1, 0, 3, 4]);
        assert_eq!(reverse_within_length(0, 3), vec![0, 1, 2]);
        assert_eq!(reverse_within_length(4, 4), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_reverse_is_involution() {
        let idx = reverse_within_length(4, 7);
        let twice: Vec<usize> = idx.iter().map(|&i| idx[i]).collect();
        assert_eq!(twice, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_sentiment_batch_shapes_and_mask() {
        let batcher = SentimentBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![
            SentimentSample { token_ids: vec![5, 6, 0, 0], label: 1 },
            SentimentSample { token_ids: vec![7, 8, 9, 3], label: 0 },
        ]);

        assert_eq!(batch.token_ids.dims(), [2, 4]);
        assert_eq!(batch.mask.dims(), [2, 4]);
        let mask: Vec<f32> = batch.mask.into_data().iter::<f32>().collect();
        assert_eq!(mask, vec![1.0f32, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(ints(batch.reverse_index), vec![1, 0, 2, 3, 3, 2, 1, 0]);
        assert_eq!(ints(batch.last_index), vec![1, 3]);
        assert_eq!(ints(batch.labels), vec![1, 0]);
    }

    #[test]
    fn test_chirp_batch_shapes() {
        let batcher = ChirpBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![
            ChirpSample { input: vec![0.0, 0.1, 0.2], target: vec![0.1, 0.2, 0.3] },
            ChirpSample { input: vec![0.1, 0.2, 0.3], target: vec![0.2, 0.3, 0.4] },
        ]);
        assert_eq!(batch.inputs.dims(), [2, 3, 1]);
        assert_eq!(batch.targets.dims(), [2, 3, 1]);
    }

    #[test]
    fn test_mnist_batch_scales_pixels() {
        let mut image = [[0.0f32; 28]; 28];
        image[0][0] = 255.0;
        let item    = MnistItem { image, label: 7 };
        let batcher = MnistBatcher::<TestBackend>::new(Default::default(), false);
        let batch   = batcher.batch(vec![item]);

        assert_eq!(batch.images.dims(), [1, 28, 28]);
        let first: f32 = batch.images.into_data().iter::<f32>().next().unwrap();
        assert!((first - 1.0).abs() < 1e-6);
        assert_eq!(ints(batch.targets), vec![7]);
    }
}
