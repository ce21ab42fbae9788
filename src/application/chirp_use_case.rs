// ============================================================
// Layer 2 — ChirpUseCase
// ============================================================
// Orchestrates the GRU forecasting exercise:
//
//   Step 1: Synthesise the chirp signal        (Layer 4 - data)
//   Step 2: Ordered 75/25 train/test split     (Layer 4 - data)
//   Step 3: Window both parts into datasets    (Layer 4 - data)
//   Step 4: Save config, run training loop     (Layer 5 - ml)
//   Step 5: Optional forecast CSV              (Layer 6 - infra)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use burn::{data::dataset::Dataset, module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::data::{
    chirp::{chirp_signal, windows, ChirpParams},
    dataset::ChirpDataset,
    splitter::split_at_fraction,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    forecast::{write_forecast_csv, IndexedPredictions},
    metrics::MetricsLogger,
};
use crate::ml::{
    chirp_model::{ChirpGruConfig, CHECKPOINT_NAME},
    chirp_trainer::{predict_last, run_chirp_training},
    default_device,
    trainer::{TrainingConfig, TrainingOutputs},
    TrainBackend,
};

pub const TASK_NAME: &str = "chirp";
const SEED: u64 = 42;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpConfig {
    pub checkpoint_dir: String,
    pub n_points:       usize,
    pub train_fraction: f64,
    pub seq_len:        usize,
    pub hidden_size:    usize,
    pub dropout:        f64,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    /// Train on every step of the shifted window instead of the last
    pub loss_whole_seq: bool,
    pub forecast_csv:   Option<String>,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            n_points:       5000,
            train_fraction: 0.75,
            seq_len:        50,
            hidden_size:    16,
            dropout:        0.0,
            epochs:         5,
            batch_size:     32,
            lr:             1e-3,
            loss_whole_seq: false,
            forecast_csv:   None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChirpReport {
    pub final_test_loss: f64,
    pub best_test_loss:  Option<f64>,
    pub best_epoch:      Option<usize>,
}

pub struct ChirpUseCase {
    config: ChirpConfig,
}

impl ChirpUseCase {
    pub fn new(config: ChirpConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ChirpReport> {
        let device = default_device();
        self.execute_on::<TrainBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<ChirpReport> {
        let cfg = &self.config;
        if cfg.seq_len == 0 || cfg.batch_size == 0 {
            bail!("sequence length and batch size must be positive");
        }

        // ── Step 1: Signal ────────────────────────────────────────────────────
        let params = ChirpParams { n_points: cfg.n_points, ..ChirpParams::default() };
        let (times, signal) = chirp_signal(&params);

        // ── Step 2: Ordered split ─────────────────────────────────────────────
        let (train_series, test_series) = split_at_fraction(signal.clone(), cfg.train_fraction);
        let test_offset = train_series.len();

        // ── Step 3: Windowed datasets ─────────────────────────────────────────
        let train = ChirpDataset::from_windows(&windows(&train_series, cfg.seq_len));
        let test  = ChirpDataset::from_windows(&windows(&test_series, cfg.seq_len));
        tracing::info!(
            "Chirp: {} points, {} train pairs, {} test pairs",
            signal.len(),
            train.len(),
            test.len(),
        );

        // ── Step 4: Training ──────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(TASK_NAME, cfg)?;
        let metrics = MetricsLogger::create(ckpt.dir(), &format!("{TASK_NAME}_metrics.csv"))?;
        tracing::info!("Per-epoch metrics go to '{}'", metrics.csv_path().display());

        B::seed(SEED);
        let model_cfg = ChirpGruConfig::new()
            .with_hidden_size(cfg.hidden_size)
            .with_dropout(cfg.dropout);
        let model = model_cfg.init::<B>(device);

        let run = run_chirp_training(
            &TrainingConfig::new(cfg.epochs, cfg.batch_size, cfg.lr),
            cfg.loss_whole_seq,
            model,
            train.clone(),
            test.clone(),
            device,
            TrainingOutputs { checkpoints: Some(&ckpt), metrics: Some(&metrics) },
        )?;

        // ── Step 5: Forecast dump ─────────────────────────────────────────────
        if let Some(path) = &cfg.forecast_csv {
            let best = ckpt.load_model(CHECKPOINT_NAME, run.model.valid(), device)?;
            // Sample i forecasts the point right after its input window
            let place = |preds: Vec<f32>, offset: usize| -> IndexedPredictions {
                preds
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| (offset + i + cfg.seq_len, p))
                    .collect()
            };
            let train_pred = place(predict_last(&best, train, cfg.batch_size, device), 0);
            let test_pred  = place(predict_last(&best, test, cfg.batch_size, device), test_offset);
            write_forecast_csv(Path::new(path), &times, &signal, &train_pred, &test_pred)?;
        }

        Ok(ChirpReport {
            final_test_loss: run.history.last().map(|m| m.val_loss).unwrap_or(f64::NAN),
            best_test_loss:  run.best.best_score().map(|s| -s),
            best_epoch:      run.best.best_epoch(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_small_run_writes_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("forecast.csv");
        let cfg = ChirpConfig {
            checkpoint_dir: dir.path().join("ckpt").display().to_string(),
            n_points:       80,
            seq_len:        6,
            hidden_size:    3,
            epochs:         2,
            batch_size:     8,
            forecast_csv:   Some(csv.display().to_string()),
            ..ChirpConfig::default()
        };

        let report = ChirpUseCase::new(cfg).execute_on::<TestBackend>(&Default::default()).unwrap();
        assert!(report.final_test_loss.is_finite());
        assert!(report.best_test_loss.unwrap() <= report.final_test_loss + 1e-12);

        let text  = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 81);
        // First seq_len steps have no forecast
        assert!(lines[1].ends_with(",,"));
        // 60 train points: pairs forecast steps 6..=58
        assert!(!lines[1 + 6].ends_with(",,"));
    }

    #[test]
    fn test_too_short_signal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ChirpConfig {
            checkpoint_dir: dir.path().display().to_string(),
            n_points:       10,
            seq_len:        6,
            ..ChirpConfig::default()
        };
        assert!(ChirpUseCase::new(cfg).execute_on::<TestBackend>(&Default::default()).is_err());
    }
}
