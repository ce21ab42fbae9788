// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per exercise: `sentiment`, `chirp`, `mnist`.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, enum)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    chirp_use_case::ChirpConfig,
    mnist_use_case::MnistConfig,
    sentiment_use_case::SentimentConfig,
};
use crate::ml::sentiment_model::Pooling;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the BiLSTM sentiment classifier on SST-2
    Sentiment(SentimentArgs),

    /// Train the GRU forecaster on a synthetic chirp signal
    Chirp(ChirpArgs),

    /// Train the feed-forward MNIST classifier
    Mnist(MnistArgs),
}

// ─── sentiment ────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SentimentArgs {
    /// Directory containing train.tsv and dev.tsv
    #[arg(long, default_value = "SST-2")]
    pub data_dir: String,

    /// GloVe-format word vectors (optional; missing = all-ones vectors)
    #[arg(long, default_value = "glove.6B.50d.txt")]
    pub vectors: String,

    /// Where the vocabulary and encoded splits are cached
    #[arg(long, default_value = "example_prep_data")]
    pub prep_dir: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Pad / truncate sentences to this many tokens
    /// (default: the longest sentence in the corpus)
    #[arg(long)]
    pub seq_len: Option<usize>,

    /// Must match the vector file's dimension
    #[arg(long, default_value_t = 50)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-2)]
    pub lr: f64,

    #[arg(long, default_value_t = 512)]
    pub batch_size: usize,

    /// Hidden units per LSTM direction
    #[arg(long, default_value_t = 16)]
    pub hidden_size: usize,

    /// Stacked bidirectional layers
    #[arg(long, default_value_t = 3)]
    pub n_layers: usize,

    /// Dropout between LSTM layers
    #[arg(long, default_value_t = 0.5)]
    pub lstm_drop: f64,

    /// Dropout in the pooling head
    #[arg(long, default_value_t = 0.5)]
    pub lin_drop: f64,

    /// How the BiLSTM outputs are reduced before the classifier
    #[arg(long, value_enum, default_value_t = Pooling::AddBeforeMean)]
    pub pooling: Pooling,

    /// Only evaluate the saved checkpoint
    #[arg(long)]
    pub skip_training: bool,

    /// Never write the model checkpoint
    #[arg(long)]
    pub no_save: bool,
}

impl From<SentimentArgs> for SentimentConfig {
    fn from(a: SentimentArgs) -> Self {
        SentimentConfig {
            data_dir:       a.data_dir,
            vectors_path:   a.vectors,
            prep_dir:       a.prep_dir,
            checkpoint_dir: a.checkpoint_dir,
            seq_len:        a.seq_len,
            embedding_dim:  a.embedding_dim,
            epochs:         a.epochs,
            lr:             a.lr,
            batch_size:     a.batch_size,
            hidden_size:    a.hidden_size,
            n_layers:       a.n_layers,
            lstm_drop:      a.lstm_drop,
            lin_drop:       a.lin_drop,
            pooling:        a.pooling,
            skip_training:  a.skip_training,
            save_model:     !a.no_save,
        }
    }
}

// ─── chirp ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ChirpArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Points sampled over t ∈ [0, 10]
    #[arg(long, default_value_t = 5000)]
    pub n_points: usize,

    /// Leading share of the signal used for training
    #[arg(long, default_value_t = 0.75)]
    pub train_fraction: f64,

    /// Window length fed to the GRU
    #[arg(long, default_value_t = 50)]
    pub seq_len: usize,

    #[arg(long, default_value_t = 16)]
    pub hidden_size: usize,

    /// Dropout on the GRU input
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Compute the loss on every step instead of only the last
    #[arg(long)]
    pub loss_whole_seq: bool,

    /// Write time, signal and predictions to this CSV
    #[arg(long)]
    pub forecast_csv: Option<String>,
}

impl From<ChirpArgs> for ChirpConfig {
    fn from(a: ChirpArgs) -> Self {
        ChirpConfig {
            checkpoint_dir: a.checkpoint_dir,
            n_points:       a.n_points,
            train_fraction: a.train_fraction,
            seq_len:        a.seq_len,
            hidden_size:    a.hidden_size,
            dropout:        a.dropout,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            loss_whole_seq: a.loss_whole_seq,
            forecast_csv:   a.forecast_csv,
        }
    }
}

// ─── mnist ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct MnistArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 512)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,
}

impl From<MnistArgs> for MnistConfig {
    fn from(a: MnistArgs) -> Self {
        MnistConfig {
            checkpoint_dir: a.checkpoint_dir,
            hidden_size:    a.hidden_size,
            dropout:        a.dropout,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
        }
    }
}
