// ============================================================
// Layer 5 — BiLSTM Sentiment Model
// ============================================================
// Embedding → stacked bidirectional LSTM → pooling head → 2 logits
//
// Variable-length sentences
// -------------------------
// Sentences are right-padded to one length. A plain backward
// LSTM would start on the padding and carry it into every real
// position, so each layer runs its backward direction over the
// sentence reversed WITHIN its own length:
//
//   tokens     a  b  c  .  .      (.  = padding)
//   reversed   c  b  a  .  .
//
// The backward outputs are then put back in original order and
// every output at a padded position is zeroed. Real positions
// never see padding in either direction, which is what packed
// sequences give you.
//
// Pooling heads (one per model, chosen by `Pooling`):
//
//   add-before-mean           (fwd + bwd) flattened → Linear → norm → drop → out
//   concat-before-mean        [fwd ; bwd] flattened → Linear → norm → drop → out
//   mean-and-concat           fwd and bwd through their own Linear → norm → drop,
//                             concatenated → out
//   concat-and-last           fwd at the last real token ; bwd at the first → out
//   concat-and-pool-and-last  [fwd ; bwd] flattened → Linear(2LH, 2LH) → norm → drop,
//                             last position → out
//
// Reference: Burn Book §3 (Building Blocks)
//            Graves & Schmidhuber (2005) Bidirectional LSTM

use anyhow::{bail, Result};
use burn::{
    module::Param,
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::SentimentBatch, embeddings::EmbeddingTable};
use crate::domain::sentence::NUM_SENTIMENT_CLASSES;

/// File stem of the best sentiment checkpoint.
pub const CHECKPOINT_NAME: &str = "bilstm_sentiment";

/// How the per-timestep BiLSTM outputs become one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Pooling {
    AddBeforeMean,
    ConcatBeforeMean,
    MeanAndConcat,
    ConcatAndLast,
    ConcatAndPoolAndLast,
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SentimentBiLstmConfig {
    /// Embedding rows: vocabulary + padding + unknown
    pub vocab_rows:    usize,
    /// Padded sentence length. The mean and pool heads are sized by it.
    pub seq_len:       usize,
    #[config(default = 50)]
    pub embedding_dim: usize,
    #[config(default = 16)]
    pub hidden_size:   usize,
    #[config(default = 3)]
    pub n_layers:      usize,
    #[config(default = 0.5)]
    pub lstm_drop:     f64,
    #[config(default = 0.5)]
    pub lin_drop:      f64,
    #[config(default = "Pooling::AddBeforeMean")]
    pub pooling:       Pooling,
}

impl SentimentBiLstmConfig {
    /// Whether a record saved from a model built by `other` loads
    /// into one built by `self`. Dropout rates carry no weights.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.vocab_rows == other.vocab_rows
            && self.seq_len == other.seq_len
            && self.embedding_dim == other.embedding_dim
            && self.hidden_size == other.hidden_size
            && self.n_layers == other.n_layers
            && self.pooling == other.pooling
    }

    /// Fresh model with a randomly initialised embedding.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentBiLstm<B> {
        let h  = self.hidden_size;
        let lh = self.seq_len * h;

        let embedding = EmbeddingConfig::new(self.vocab_rows, self.embedding_dim).init(device);
        let layers = (0..self.n_layers)
            .map(|i| {
                let d_in = if i == 0 { self.embedding_dim } else { 2 * h };
                BiLstmLayer {
                    fwd_lstm: LstmConfig::new(d_in, h, true).init(device),
                    bwd_lstm: LstmConfig::new(d_in, h, true).init(device),
                }
            })
            .collect();

        let head = |d_in: usize, d_out: usize| Some(MeanHead::new(d_in, d_out, device));
        let (mut add_mean, mut concat_mean, mut forward_mean, mut backward_mean, mut pool) =
            (None, None, None, None, None);
        let out_in = match self.pooling {
            Pooling::AddBeforeMean => { add_mean = head(lh, h); h }
            Pooling::ConcatBeforeMean => { concat_mean = head(2 * lh, h); h }
            Pooling::MeanAndConcat => {
                forward_mean  = head(lh, h);
                backward_mean = head(lh, h);
                2 * h
            }
            Pooling::ConcatAndLast => 2 * h,
            Pooling::ConcatAndPoolAndLast => { pool = head(2 * lh, 2 * lh); 2 * h }
        };

        SentimentBiLstm {
            embedding,
            layers,
            lstm_drop: DropoutConfig::new(self.lstm_drop).init(),
            lin_drop:  DropoutConfig::new(self.lin_drop).init(),
            add_mean,
            concat_mean,
            forward_mean,
            backward_mean,
            pool,
            out: LinearConfig::new(out_in, NUM_SENTIMENT_CLASSES).init(device),
            hidden_size: h,
        }
    }

    /// Model whose embedding starts from `table`. The weight stays trainable.
    pub fn init_with_table<B: Backend>(
        &self,
        table:  &EmbeddingTable,
        device: &B::Device,
    ) -> Result<SentimentBiLstm<B>> {
        if table.rows != self.vocab_rows || table.dim != self.embedding_dim {
            bail!(
                "embedding table is {}x{}, model expects {}x{}",
                table.rows, table.dim, self.vocab_rows, self.embedding_dim
            );
        }
        let mut model = self.init(device);
        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(table.values.clone(), [table.rows, table.dim]),
            device,
        );
        model.embedding.weight = Param::from_tensor(weight);
        Ok(model)
    }
}

// ─── Bidirectional layer ──────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct BiLstmLayer<B: Backend> {
    pub fwd_lstm: Lstm<B>,
    pub bwd_lstm: Lstm<B>,
}

impl<B: Backend> BiLstmLayer<B> {
    /// x: [batch, seq_len, d_in], mask: [batch, seq_len, 1]
    /// → (forward, backward) outputs, each [batch, seq_len, hidden]
    pub fn forward(
        &self,
        x:             Tensor<B, 3>,
        mask:          Tensor<B, 3>,
        reverse_index: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let [batch, seq_len, d_in] = x.dims();

        let (fwd, _) = self.fwd_lstm.forward(x.clone(), None);
        let hidden   = fwd.dims()[2];

        // Reverse each sentence within its length, run, then undo
        let in_index  = reverse_index.clone().unsqueeze_dim::<3>(2).expand([batch, seq_len, d_in]);
        let out_index = reverse_index.unsqueeze_dim::<3>(2).expand([batch, seq_len, hidden]);
        let (bwd_reversed, _) = self.bwd_lstm.forward(x.gather(1, in_index), None);
        let bwd = bwd_reversed.gather(1, out_index);

        let mask = mask.expand([batch, seq_len, hidden]);
        (fwd * mask.clone(), bwd * mask)
    }
}

// ─── Heads ────────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct MeanHead<B: Backend> {
    pub linear: Linear<B>,
    pub norm:   LayerNorm<B>,
}

impl<B: Backend> MeanHead<B> {
    fn new(d_in: usize, d_out: usize, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(d_in, d_out).init(device),
            norm:   LayerNormConfig::new(d_out).init(device),
        }
    }

    fn forward(&self, x: Tensor<B, 2>, dropout: &Dropout) -> Tensor<B, 2> {
        dropout.forward(self.norm.forward(self.linear.forward(x)))
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────

/// Exactly one head field is `Some`, except for concat-and-last
/// which needs none.
#[derive(Module, Debug)]
pub struct SentimentBiLstm<B: Backend> {
    pub embedding:     Embedding<B>,
    pub layers:        Vec<BiLstmLayer<B>>,
    pub lstm_drop:     Dropout,
    pub lin_drop:      Dropout,
    pub add_mean:      Option<MeanHead<B>>,
    pub concat_mean:   Option<MeanHead<B>>,
    pub forward_mean:  Option<MeanHead<B>>,
    pub backward_mean: Option<MeanHead<B>>,
    pub pool:          Option<MeanHead<B>>,
    pub out:           Linear<B>,
    pub hidden_size:   usize,
}

impl<B: Backend> SentimentBiLstm<B> {
    pub fn pooling(&self) -> Pooling {
        if self.add_mean.is_some() {
            Pooling::AddBeforeMean
        } else if self.concat_mean.is_some() {
            Pooling::ConcatBeforeMean
        } else if self.forward_mean.is_some() {
            Pooling::MeanAndConcat
        } else if self.pool.is_some() {
            Pooling::ConcatAndPoolAndLast
        } else {
            Pooling::ConcatAndLast
        }
    }

    /// → logits [batch, 2]
    pub fn forward(&self, batch: &SentimentBatch<B>) -> Tensor<B, 2> {
        let mask = batch.mask.clone().unsqueeze_dim::<3>(2);

        let mut x = self.embedding.forward(batch.token_ids.clone());
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                x = self.lstm_drop.forward(x);
            }
            let (fwd, bwd) = layer.forward(x, mask.clone(), batch.reverse_index.clone());
            x = Tensor::cat(vec![fwd, bwd], 2);
        }

        // x: [batch, seq_len, 2H], forward half first
        let [b, l, _] = x.dims();
        let h   = self.hidden_size;
        let fwd = x.clone().slice([0..b, 0..l, 0..h]);
        let bwd = x.clone().slice([0..b, 0..l, h..2 * h]);

        let features = if let Some(head) = &self.add_mean {
            head.forward((fwd + bwd).reshape([b, l * h]), &self.lin_drop)
        } else if let Some(head) = &self.concat_mean {
            head.forward(x.reshape([b, l * 2 * h]), &self.lin_drop)
        } else if let (Some(f_head), Some(b_head)) = (&self.forward_mean, &self.backward_mean) {
            let f = f_head.forward(fwd.reshape([b, l * h]), &self.lin_drop);
            let r = b_head.forward(bwd.reshape([b, l * h]), &self.lin_drop);
            Tensor::cat(vec![f, r], 1)
        } else if let Some(head) = &self.pool {
            let pooled = head
                .forward(x.reshape([b, l * 2 * h]), &self.lin_drop)
                .reshape([b, l, 2 * h]);
            pooled.slice([0..b, l - 1..l, 0..2 * h]).reshape([b, 2 * h])
        } else {
            // Forward state after the last real token, backward state after the first
            let last = batch.last_index.clone().unsqueeze_dim::<3>(2).expand([b, 1, h]);
            let fwd_last  = fwd.gather(1, last).reshape([b, h]);
            let bwd_first = bwd.slice([0..b, 0..1, 0..h]).reshape([b, h]);
            Tensor::cat(vec![fwd_last, bwd_first], 1)
        };

        self.out.forward(features)
    }
}
