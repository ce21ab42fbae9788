// ============================================================
// Layer 2 — SentimentUseCase
// ============================================================
// Orchestrates the BiLSTM sentiment pipeline in order:
//
//   Step 1: Load train.tsv / dev.tsv          (Layer 4 - data)
//   Step 2: Vocabulary + max length           (Layer 6 - infra cache)
//   Step 3: Encode both splits                (Layer 6 - infra cache)
//   Step 4: Build Burn datasets               (Layer 4 - data)
//   Step 5: Model architecture                (Layer 5 - ml)
//   Step 6: Embedding table, save configs,
//           run training loop                 (Layers 4-6)
//   Step 7: Reload best checkpoint, evaluate  (Layer 5 - ml)
//
// With --skip-training the architecture comes from the file saved
// next to the checkpoint and step 6 is skipped.
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use burn::{data::dataset::Dataset, module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::data::{
    batcher::SentimentBatcher,
    dataset::SentimentDataset,
    embeddings::{load_pretrained, EmbeddingTable},
    loader::{split_paths, TsvLoader},
    preprocessor::WordTokenizer,
};
use crate::domain::{
    sentence::{no_information_rate, LabelledSentence, NUM_SENTIMENT_CLASSES},
    traits::{SentenceSource, Tokenize},
    vocab::Vocabulary,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{ConfusionMatrix, MetricsLogger},
    prep_cache::PrepCache,
};
use crate::ml::{
    default_device,
    evaluator::evaluate_sentiment,
    sentiment_model::{Pooling, SentimentBiLstmConfig, CHECKPOINT_NAME},
    trainer::{run_sentiment_training, TrainingConfig, TrainingOutputs},
    TrainBackend,
};

pub const TASK_NAME: &str = "sentiment";
const SEED: u64 = 42;

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Directory holding train.tsv and dev.tsv
    pub data_dir:       String,
    /// GloVe-format vectors; may be absent
    pub vectors_path:   String,
    pub prep_dir:       String,
    pub checkpoint_dir: String,
    /// Padding length; None = longest sentence in the corpus
    pub seq_len:        Option<usize>,
    pub embedding_dim:  usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub batch_size:     usize,
    pub hidden_size:    usize,
    pub n_layers:       usize,
    pub lstm_drop:      f64,
    pub lin_drop:       f64,
    pub pooling:        Pooling,
    pub skip_training:  bool,
    pub save_model:     bool,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            data_dir:       "SST-2".to_string(),
            vectors_path:   "glove.6B.50d.txt".to_string(),
            prep_dir:       "example_prep_data".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            seq_len:        None,
            embedding_dim:  50,
            epochs:         50,
            lr:             1e-2,
            batch_size:     512,
            hidden_size:    16,
            n_layers:       3,
            lstm_drop:      0.5,
            lin_drop:       0.5,
            pooling:        Pooling::AddBeforeMean,
            skip_training:  false,
            save_model:     true,
        }
    }
}

impl SentimentConfig {
    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch size must be positive");
        }
        if self.seq_len == Some(0) {
            bail!("sequence length must be positive");
        }
        if self.n_layers == 0 {
            bail!("the BiLSTM needs at least one layer");
        }
        if self.skip_training && !self.save_model {
            bail!("--skip-training evaluates the saved checkpoint; it cannot be combined with --no-save");
        }
        Ok(())
    }
}

/// What the final evaluation found.
#[derive(Debug, Clone)]
pub struct SentimentReport {
    /// Percent
    pub accuracy:  f64,
    pub confusion: ConfusionMatrix,
}

// ─── SentimentUseCase ─────────────────────────────────────────────────────────
pub struct SentimentUseCase {
    config: SentimentConfig,
}

impl SentimentUseCase {
    pub fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    /// Run on the WGPU backend.
    pub fn execute(&self) -> Result<SentimentReport> {
        let device = default_device();
        self.execute_on::<TrainBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<SentimentReport> {
        let cfg = &self.config;
        cfg.validate()?;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;

        // Evaluation only: the checkpoint and the architecture it was
        // trained with must both exist
        let saved_arch = if cfg.skip_training {
            let path = ckpt.model_path(CHECKPOINT_NAME);
            if !ckpt.has_model(CHECKPOINT_NAME) {
                bail!("--skip-training needs a saved model at {}. Train the model first.", path.display());
            }
            let arch: SentimentBiLstmConfig = ckpt
                .load_config(CHECKPOINT_NAME)
                .context("The saved model has no architecture file; train it again")?;
            tracing::info!("Skipping training, evaluating {}", path.display());
            Some(arch)
        } else {
            None
        };

        // ── Step 1: Load both splits ──────────────────────────────────────────
        let (train_path, dev_path) = split_paths(Path::new(&cfg.data_dir));
        let train_rows = TsvLoader::new(train_path, NUM_SENTIMENT_CLASSES).load_all()?;
        let dev_rows   = TsvLoader::new(dev_path, NUM_SENTIMENT_CLASSES).load_all()?;
        let train_labels: Vec<usize> = train_rows.iter().map(|r| r.label).collect();
        let dev_labels:   Vec<usize> = dev_rows.iter().map(|r| r.label).collect();

        // ── Step 2: Vocabulary and padding target ─────────────────────────────
        // Built over train AND dev so no dev token is unknown
        let tokenizer = WordTokenizer::new();
        let cache     = PrepCache::new(&cfg.prep_dir);
        let corpus    = cache.load_or_build_vocab(|| {
            let all = tokenize_all(&tokenizer, train_rows.iter().chain(&dev_rows));
            Vocabulary::build(all)
        })?;
        if corpus.vocab.is_empty() || corpus.max_seq_len == 0 {
            bail!("Every sentence tokenised to nothing; cannot pick a sequence length");
        }
        // A saved model fixes the padding length unless it is given explicitly
        let seq_len = cfg
            .seq_len
            .or(saved_arch.as_ref().map(|a| a.seq_len))
            .unwrap_or(corpus.max_seq_len);
        let vocab   = &corpus.vocab;
        tracing::info!("Vocabulary: {} tokens, sequence length {}", vocab.len(), seq_len);

        // ── Step 3: Encode both splits ────────────────────────────────────────
        let encode = |rows: &[LabelledSentence]| -> Vec<Vec<u32>> {
            tokenize_all(&tokenizer, rows)
                .iter()
                .map(|tokens| vocab.encode(tokens, seq_len))
                .collect()
        };
        let train_ids = cache.load_or_encode("train", seq_len, vocab, train_rows.len(), || encode(&train_rows))?;
        let dev_ids   = cache.load_or_encode("dev", seq_len, vocab, dev_rows.len(), || encode(&dev_rows))?;

        // ── Step 4: Burn datasets ─────────────────────────────────────────────
        let train_dataset = SentimentDataset::from_parts(train_ids, &train_labels);
        let dev_dataset   = SentimentDataset::from_parts(dev_ids, &dev_labels);

        let nir = no_information_rate(&dev_labels);
        println!("The no information rate is {:.2}", 100.0 * nir);

        // ── Step 5: Architecture ──────────────────────────────────────────────
        let model_cfg = SentimentBiLstmConfig::new(vocab.table_rows(), seq_len)
            .with_embedding_dim(cfg.embedding_dim)
            .with_hidden_size(cfg.hidden_size)
            .with_n_layers(cfg.n_layers)
            .with_lstm_drop(cfg.lstm_drop)
            .with_lin_drop(cfg.lin_drop)
            .with_pooling(cfg.pooling);
        if let Some(saved) = &saved_arch {
            if !saved.same_shape(&model_cfg) {
                bail!(
                    "The saved model does not match these options (saved: {}, requested: {}). \
                     Rerun with the saved options or train again.",
                    saved,
                    model_cfg,
                );
            }
        }

        // ── Step 6: Training ──────────────────────────────────────────────────
        B::seed(SEED);
        let trained = if cfg.skip_training {
            None
        } else {
            // ── Embedding table ───────────────────────────────────────────────
            let pretrained = load_pretrained(Path::new(&cfg.vectors_path), vocab, cfg.embedding_dim)?;
            let table      = EmbeddingTable::build(vocab, &pretrained, cfg.embedding_dim)?;

            ckpt.save_config(TASK_NAME, cfg)?;
            if cfg.save_model {
                ckpt.save_config(CHECKPOINT_NAME, &model_cfg)?;
            }
            let metrics = MetricsLogger::create(ckpt.dir(), &format!("{TASK_NAME}_metrics.csv"))?;
            tracing::info!("Per-epoch metrics go to '{}'", metrics.csv_path().display());
            let model   = model_cfg.init_with_table::<B>(&table, device)?;
            let outputs = TrainingOutputs {
                checkpoints: cfg.save_model.then_some(&ckpt),
                metrics:     Some(&metrics),
            };
            let train_cfg = TrainingConfig::new(cfg.epochs, cfg.batch_size, cfg.lr);
            Some(run_sentiment_training(&train_cfg, model, train_dataset, dev_dataset.clone(), device, outputs)?)
        };

        // ── Step 7: Final evaluation ──────────────────────────────────────────
        let eval_model = match trained {
            Some(run) if !cfg.save_model => {
                tracing::info!("Saving is off, evaluating the model from the last epoch");
                run.model.valid()
            }
            _ => ckpt.load_model(CHECKPOINT_NAME, model_cfg.init::<B::InnerBackend>(device), device)?,
        };
        tracing::info!("Evaluating the {:?} model on {} dev sentences", eval_model.pooling(), dev_dataset.len());
        let loader = burn::data::dataloader::DataLoaderBuilder::new(
            SentimentBatcher::<B::InnerBackend>::new(device.clone()),
        )
        .batch_size(cfg.batch_size)
        .build(dev_dataset);
        let eval = evaluate_sentiment(&eval_model, &*loader);

        Ok(SentimentReport {
            accuracy:  eval.accuracy,
            confusion: eval.confusion(NUM_SENTIMENT_CLASSES),
        })
    }
}

fn tokenize_all<'a, I>(tokenizer: &impl Tokenize, rows: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a LabelledSentence>,
{
    rows.into_iter().map(|r| tokenizer.tokenize(&r.text)).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TestBackend = Autodiff<NdArray>;

    fn write_split(dir: &Path, name: &str, rows: &[(&str, usize)]) {
        let mut text = String::from("sentence\tlabel\n");
        for (s, l) in rows {
            text.push_str(&format!("{s}\t{l}\n"));
        }
        fs::write(dir.join(name), text).unwrap();
    }

    fn tiny_config(root: &Path) -> SentimentConfig {
        let data = root.join("SST-2");
        fs::create_dir_all(&data).unwrap();
        write_split(&data, "train.tsv", &[
            ("a great movie", 1),
            ("a dull , boring movie", 0),
            ("great fun", 1),
            ("it was n't good", 0),
        ]);
        write_split(&data, "dev.tsv", &[("great movie", 1), ("boring", 0), ("fun fun", 1)]);

        SentimentConfig {
            data_dir:       data.display().to_string(),
            vectors_path:   root.join("missing-vectors.txt").display().to_string(),
            prep_dir:       root.join("prep").display().to_string(),
            checkpoint_dir: root.join("ckpt").display().to_string(),
            embedding_dim:  4,
            epochs:         2,
            batch_size:     2,
            hidden_size:    3,
            n_layers:       1,
            pooling:        Pooling::ConcatAndLast,
            ..SentimentConfig::default()
        }
    }

    fn has_checkpoint(cfg: &SentimentConfig) -> bool {
        CheckpointManager::new(&cfg.checkpoint_dir).unwrap().has_model(CHECKPOINT_NAME)
    }

    #[test]
    fn test_end_to_end_then_skip_training() {
        let dir    = tempfile::tempdir().unwrap();
        let cfg    = tiny_config(dir.path());
        let device = Default::default();

        let report = SentimentUseCase::new(cfg.clone()).execute_on::<TestBackend>(&device).unwrap();
        assert_eq!(report.confusion.total(), 3);
        assert!(has_checkpoint(&cfg));
        assert!(dir.path().join("ckpt/bilstm_sentiment_config.json").exists());
        assert!(dir.path().join("prep/vocab_dict.json").exists());
        assert!(dir.path().join("ckpt/sentiment_metrics.csv").exists());

        // Cached preprocessing plus the saved checkpoint
        let eval_only = SentimentConfig { skip_training: true, ..cfg };
        let again = SentimentUseCase::new(eval_only.clone()).execute_on::<TestBackend>(&device).unwrap();
        assert_eq!(again.confusion.total(), 3);
        assert_eq!(again.accuracy, report.accuracy);

        let other_head = SentimentConfig { pooling: Pooling::MeanAndConcat, ..eval_only };
        assert!(SentimentUseCase::new(other_head).execute_on::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_skip_training_reuses_saved_sequence_length() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        // The longest sentence has 5 tokens; train on a shorter window
        let cfg = SentimentConfig {
            seq_len: Some(3),
            pooling: Pooling::AddBeforeMean,
            epochs:  1,
            ..tiny_config(dir.path())
        };
        SentimentUseCase::new(cfg.clone()).execute_on::<TestBackend>(&device).unwrap();

        let implicit = SentimentConfig { skip_training: true, seq_len: None, ..cfg.clone() };
        let report   = SentimentUseCase::new(implicit).execute_on::<TestBackend>(&device).unwrap();
        assert_eq!(report.confusion.total(), 3);

        let conflicting = SentimentConfig { skip_training: true, seq_len: Some(5), ..cfg };
        assert!(SentimentUseCase::new(conflicting).execute_on::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_skip_training_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SentimentConfig { skip_training: true, ..tiny_config(dir.path()) };
        assert!(SentimentUseCase::new(cfg).execute_on::<TestBackend>(&Default::default()).is_err());
    }

    #[test]
    fn test_no_save_evaluates_last_model() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SentimentConfig { save_model: false, epochs: 1, ..tiny_config(dir.path()) };
        let report = SentimentUseCase::new(cfg.clone()).execute_on::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(report.confusion.total(), 3);
        assert!(!has_checkpoint(&cfg));
    }
}
