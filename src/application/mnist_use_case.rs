// ============================================================
// Layer 2 — MnistUseCase
// ============================================================
//   Step 1: Load MNIST train / test (downloaded on first use)
//   Step 2: Save config, run training loop
//   Step 3: Reload best checkpoint, confusion matrix on test

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::vision::MnistDataset},
    module::AutodiffModule,
    prelude::Backend,
};

use crate::data::batcher::MnistBatcher;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{ConfusionMatrix, MetricsLogger},
};
use crate::ml::{
    default_device,
    evaluator::evaluate_mnist,
    mnist_model::{MnistMlpConfig, CHECKPOINT_NAME, NUM_DIGITS},
    mnist_trainer::run_mnist_training,
    trainer::{TrainingConfig, TrainingOutputs},
    EvalBackend, TrainBackend,
};

pub const TASK_NAME: &str = "mnist";
const SEED: u64 = 42;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnistConfig {
    pub checkpoint_dir: String,
    pub hidden_size:    usize,
    pub dropout:        f64,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
}

impl Default for MnistConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            hidden_size:    512,
            dropout:        0.2,
            epochs:         10,
            batch_size:     32,
            lr:             1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MnistReport {
    pub best_epoch: Option<usize>,
    /// Percent, best checkpoint on the test split
    pub accuracy:   f64,
    pub confusion:  ConfusionMatrix,
}

pub struct MnistUseCase {
    config: MnistConfig,
}

impl MnistUseCase {
    pub fn new(config: MnistConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<MnistReport> {
        let cfg = &self.config;
        if cfg.batch_size == 0 {
            bail!("batch size must be positive");
        }
        let device = default_device();

        // ── Step 1: Data ──────────────────────────────────────────────────────
        tracing::info!("Loading MNIST (downloads on first run)");
        let train = MnistDataset::train();
        // Shared by the per-epoch evaluation and the final report
        let test  = Arc::new(MnistDataset::test());

        // ── Step 2: Training ──────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(TASK_NAME, cfg)?;
        let metrics = MetricsLogger::create(ckpt.dir(), &format!("{TASK_NAME}_metrics.csv"))?;
        tracing::info!("Per-epoch metrics go to '{}'", metrics.csv_path().display());

        TrainBackend::seed(SEED);
        let model_cfg = MnistMlpConfig::new()
            .with_hidden_size(cfg.hidden_size)
            .with_dropout(cfg.dropout);

        let run = run_mnist_training(
            &TrainingConfig::new(cfg.epochs, cfg.batch_size, cfg.lr),
            model_cfg.init::<TrainBackend>(&device),
            train,
            Arc::clone(&test),
            &device,
            TrainingOutputs { checkpoints: Some(&ckpt), metrics: Some(&metrics) },
        )?;

        // ── Step 3: Best model on the test split ──────────────────────────────
        let best   = ckpt.load_model(CHECKPOINT_NAME, run.model.valid(), &device)?;
        let loader = DataLoaderBuilder::new(
            MnistBatcher::<EvalBackend>::new(device.clone(), false),
        )
        .batch_size(cfg.batch_size)
        .build(test);
        let eval = evaluate_mnist(&best, &*loader);

        Ok(MnistReport {
            best_epoch: run.best.best_epoch(),
            accuracy:   eval.accuracy,
            confusion:  eval.confusion(NUM_DIGITS),
        })
    }
}
