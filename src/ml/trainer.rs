// ============================================================
// Layer 5 — Sentiment Training Loop
// ============================================================
// Per epoch:
//
//   1. training     — batches in file order, CE loss, Adam step
//   2. validation   — model.valid() (dropout off) over the train
//                     and dev splits: mean loss, accuracy
//   3. checkpoint   — save if dev accuracy is strictly better
//                     than every earlier epoch
//
// Key Burn insight:
//   - Training uses B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - Evaluation batchers must also use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::SentimentBatcher, dataset::SentimentDataset};
use crate::domain::best::BestTracker;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::{cross_entropy, evaluate_sentiment},
    sentiment_model::{SentimentBiLstm, CHECKPOINT_NAME},
};

/// Optimisation settings shared by the three training loops.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub epochs:     usize,
    pub batch_size: usize,
    pub lr:         f64,
}

/// Where a training loop writes its side outputs. Either may be off.
#[derive(Clone, Copy, Default)]
pub struct TrainingOutputs<'a> {
    pub checkpoints: Option<&'a CheckpointManager>,
    pub metrics:     Option<&'a MetricsLogger>,
}

impl TrainingOutputs<'_> {
    pub(crate) fn log(&self, m: &EpochMetrics) -> Result<()> {
        match self.metrics {
            Some(logger) => logger.log(m),
            None         => Ok(()),
        }
    }
}

pub struct TrainingRun<M> {
    /// Model after the last epoch (not necessarily the best one)
    pub model:   M,
    pub history: Vec<EpochMetrics>,
    pub best:    BestTracker,
}

pub fn run_sentiment_training<B: AutodiffBackend>(
    cfg:     &TrainingConfig,
    model:   SentimentBiLstm<B>,
    train:   SentimentDataset,
    val:     SentimentDataset,
    device:  &B::Device,
    outputs: TrainingOutputs<'_>,
) -> Result<TrainingRun<SentimentBiLstm<B>>> {
    if train.is_empty() {
        bail!("The training split is empty");
    }
    if val.is_empty() {
        bail!("The validation split is empty");
    }

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
    let mut model = model;

    // ── Data loaders ──────────────────────────────────────────────────────────
    // No shuffling: every epoch sees the batches in file order
    let train_loader = DataLoaderBuilder::new(SentimentBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(train.clone());
    let train_eval_loader = DataLoaderBuilder::new(SentimentBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(train);
    let val_loader = DataLoaderBuilder::new(SentimentBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(val);

    let mut history = Vec::with_capacity(cfg.epochs);
    let mut best    = BestTracker::new();

    println!("Starting training loop...");
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut steps    = 0usize;

        for batch in train_loader.iter() {
            let logits = model.forward(&batch);
            let loss   = cross_entropy(logits, batch.labels);

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            steps    += 1;
            tracing::debug!("Epoch {} step {} | training loss {:.5}", epoch, steps, loss_sum / steps as f64);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }
        let train_loss = loss_sum / steps as f64;

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let train_eval  = evaluate_sentiment(&model_valid, &*train_eval_loader);
        let val_eval    = evaluate_sentiment(&model_valid, &*val_loader);

        println!(
            "Epoch {} | Train Loss {:.5}, Train Acc {:.2} - Test Loss {:.5}, Test Acc {:.2}",
            epoch, train_loss, train_eval.accuracy, val_eval.loss, val_eval.accuracy,
        );

        let metrics = EpochMetrics::classification(
            epoch, train_loss, train_eval.accuracy, val_eval.loss, val_eval.accuracy,
        );
        outputs.log(&metrics)?;
        history.push(metrics);

        // ── Checkpoint decision ───────────────────────────────────────────────
        if best.observe(epoch, val_eval.accuracy) {
            if let Some(ckpt) = outputs.checkpoints {
                ckpt.save_model(CHECKPOINT_NAME, &model_valid)?;
                println!("The model has been saved!");
            }
        }
    }

    if let (Some(epoch), Some(acc)) = (best.best_epoch(), best.best_score()) {
        tracing::info!("Best dev accuracy {:.2} at epoch {}", acc, epoch);
    }
    Ok(TrainingRun { model, history, best })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SentimentSample;
    use crate::ml::sentiment_model::{Pooling, SentimentBiLstmConfig};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn toy_split() -> SentimentDataset {
        SentimentDataset::new(vec![
            SentimentSample { token_ids: vec![1, 2, 0], label: 1 },
            SentimentSample { token_ids: vec![3, 0, 0], label: 0 },
            SentimentSample { token_ids: vec![1, 4, 2], label: 1 },
            SentimentSample { token_ids: vec![3, 4, 0], label: 0 },
            SentimentSample { token_ids: vec![2, 0, 0], label: 1 },
        ])
    }

    fn toy_config() -> SentimentBiLstmConfig {
        SentimentBiLstmConfig::new(6, 3)
            .with_embedding_dim(4)
            .with_hidden_size(3)
            .with_n_layers(1)
            .with_pooling(Pooling::ConcatAndLast)
    }

    fn toy_model(device: &<TestBackend as Backend>::Device) -> SentimentBiLstm<TestBackend> {
        toy_config().init(device)
    }

    #[test]
    fn test_training_records_each_epoch_and_saves_best() {
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let logger = MetricsLogger::create(dir.path(), "sentiment_metrics.csv").unwrap();
        let cfg    = TrainingConfig::new(2, 2, 1e-2);

        let run = run_sentiment_training(
            &cfg,
            toy_model(&device),
            toy_split(),
            toy_split(),
            &device,
            TrainingOutputs { checkpoints: Some(&ckpt), metrics: Some(&logger) },
        )
        .unwrap();

        assert_eq!(run.history.len(), 2);
        assert!(run.history.iter().all(|m| m.train_loss.is_finite()));
        assert!(run.history.iter().all(|m| m.val_acc.is_some()));
        assert_eq!(run.best.best_epoch().map(|e| e >= 1), Some(true));
        assert!(ckpt.has_model(CHECKPOINT_NAME));

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_saved_checkpoint_is_the_best_epoch() {
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let cfg    = TrainingConfig::new(4, 2, 5e-2);

        let run = run_sentiment_training(
            &cfg,
            toy_model(&device),
            toy_split(),
            toy_split(),
            &device,
            TrainingOutputs { checkpoints: Some(&ckpt), metrics: None },
        )
        .unwrap();

        let fresh  = toy_config().init::<NdArray>(&device);
        let saved  = ckpt.load_model(CHECKPOINT_NAME, fresh, &device).unwrap();
        let loader = DataLoaderBuilder::new(SentimentBatcher::<NdArray>::new(device))
            .batch_size(cfg.batch_size)
            .build(toy_split());
        let acc = evaluate_sentiment(&saved, &*loader).accuracy;

        assert_eq!(Some(acc), run.best.best_score());
        let best_epoch = run.best.best_epoch().unwrap();
        assert_eq!(run.history[best_epoch - 1].val_acc, Some(acc));
        // Later epochs never beat it; ties keep the earlier model
        assert!(run.history[best_epoch..].iter().all(|m| m.val_acc.unwrap() <= acc));
        assert!(run.history[..best_epoch - 1].iter().all(|m| m.val_acc.unwrap() < acc));
    }

    #[test]
    fn test_no_outputs_writes_nothing() {
        let device = Default::default();
        let cfg    = TrainingConfig::new(1, 5, 1e-2);
        let run = run_sentiment_training(
            &cfg,
            toy_model(&device),
            toy_split(),
            toy_split(),
            &device,
            TrainingOutputs::default(),
        )
        .unwrap();
        assert_eq!(run.history.len(), 1);
    }

    #[test]
    fn test_empty_training_split_is_an_error() {
        let device = Default::default();
        let cfg    = TrainingConfig::new(1, 2, 1e-2);
        let res = run_sentiment_training(
            &cfg,
            toy_model(&device),
            SentimentDataset::new(vec![]),
            toy_split(),
            &device,
            TrainingOutputs::default(),
        );
        assert!(res.is_err());
    }
}
