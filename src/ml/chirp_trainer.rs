// ============================================================
// Layer 5 — Chirp Training Loop
// ============================================================
// Each sample is (window i, window i + 1). The loss is MSE on
// either the last step only (the forecast) or every step of the
// shifted window.
//
// The checkpoint follows the lowest test loss seen so far.

use anyhow::{bail, Result};
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ChirpBatch, ChirpBatcher},
    dataset::ChirpDataset,
};
use crate::domain::best::BestTracker;
use crate::infra::metrics::EpochMetrics;
use crate::ml::{
    chirp_model::{ChirpGru, CHECKPOINT_NAME},
    trainer::{TrainingConfig, TrainingOutputs, TrainingRun},
};

pub fn chirp_loss<B: Backend>(
    model:          &ChirpGru<B>,
    batch:          &ChirpBatch<B>,
    loss_whole_seq: bool,
) -> Tensor<B, 1> {
    let mse = MseLoss::new();
    if loss_whole_seq {
        return mse.forward(model.forward(batch.inputs.clone()), batch.targets.clone(), Reduction::Mean);
    }
    let [b, l, _] = batch.targets.dims();
    let target = batch.targets.clone().slice([0..b, l - 1..l, 0..1]).reshape([b, 1]);
    mse.forward(model.forward_last(batch.inputs.clone()), target, Reduction::Mean)
}

/// Mean loss over every sample of the split.
pub fn evaluate_chirp<B: Backend>(
    model:          &ChirpGru<B>,
    loader:         &dyn DataLoader<ChirpBatch<B>>,
    loss_whole_seq: bool,
) -> f64 {
    let mut loss_sum = 0.0f64;
    let mut samples  = 0usize;
    for batch in loader.iter() {
        let n = batch.inputs.dims()[0];
        loss_sum += chirp_loss(model, &batch, loss_whole_seq).into_scalar().elem::<f64>() * n as f64;
        samples  += n;
    }
    if samples > 0 { loss_sum / samples as f64 } else { f64::NAN }
}

/// Forecast of the last step of every sample, in dataset order.
pub fn predict_last<B: Backend>(
    model:      &ChirpGru<B>,
    dataset:    ChirpDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Vec<f32> {
    let loader = DataLoaderBuilder::new(ChirpBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);
    loader
        .iter()
        .flat_map(|batch| {
            model
                .forward_last(batch.inputs)
                .into_data()
                .iter::<f32>()
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn run_chirp_training<B: AutodiffBackend>(
    cfg:            &TrainingConfig,
    loss_whole_seq: bool,
    model:          ChirpGru<B>,
    train:          ChirpDataset,
    test:           ChirpDataset,
    device:         &B::Device,
    outputs:        TrainingOutputs<'_>,
) -> Result<TrainingRun<ChirpGru<B>>> {
    if train.is_empty() || test.is_empty() {
        bail!("Not enough points for a window plus its successor in both splits");
    }

    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();
    let mut model = model;

    let train_loader = DataLoaderBuilder::new(ChirpBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(train);
    let test_loader = DataLoaderBuilder::new(ChirpBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(test);

    let mut history = Vec::with_capacity(cfg.epochs);
    let mut best    = BestTracker::new();

    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut steps    = 0usize;

        for batch in train_loader.iter() {
            let loss = chirp_loss(&model, &batch, loss_whole_seq);
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            steps    += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }
        let train_loss = loss_sum / steps as f64;

        let model_valid = model.valid();
        let test_loss   = evaluate_chirp(&model_valid, &*test_loader, loss_whole_seq);

        println!("Epoch {} | Train Loss {:.5} - Test Loss {:.5}", epoch, train_loss, test_loss);

        let metrics = EpochMetrics::regression(epoch, train_loss, test_loss);
        outputs.log(&metrics)?;
        history.push(metrics);

        // Lower loss is better; the tracker keeps the highest score
        if best.observe(epoch, -test_loss) {
            if let Some(ckpt) = outputs.checkpoints {
                ckpt.save_model(CHECKPOINT_NAME, &model_valid)?;
                tracing::debug!("Saved chirp model from epoch {}", epoch);
            }
        }
    }

    if cfg.epochs > 0 && best.best_epoch().is_none() {
        bail!("The test loss was not finite in any epoch: training diverged (try a lower learning rate)");
    }
    Ok(TrainingRun { model, history, best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chirp::windows;
    use crate::ml::chirp_model::ChirpGruConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn toy_dataset(offset: f32) -> ChirpDataset {
        let series: Vec<f32> = (0..20).map(|i| ((i as f32 + offset) * 0.4).sin()).collect();
        ChirpDataset::from_windows(&windows(&series, 5))
    }

    #[test]
    fn test_last_step_loss_only_sees_last_target() {
        let device = Default::default();
        let model  = ChirpGruConfig::new().with_hidden_size(3).init::<NdArray>(&device);
        let batch  = ChirpBatch::<NdArray> {
            inputs:  Tensor::zeros([1, 4, 1], &device),
            targets: Tensor::from_data(TensorData::new(vec![9.0f32, 9.0, 9.0, 0.5], [1, 4, 1]), &device),
        };
        let pred: f32 = model.forward_last(batch.inputs.clone()).reshape([1]).into_scalar().elem::<f32>();
        let loss: f32 = chirp_loss(&model, &batch, false).into_scalar().elem::<f32>();
        assert!((loss - (pred - 0.5).powi(2)).abs() < 1e-5);
    }

    #[test]
    fn test_training_runs_both_loss_modes() {
        let device = Default::default();
        let cfg    = TrainingConfig::new(2, 4, 1e-2);
        for whole in [false, true] {
            let model = ChirpGruConfig::new().with_hidden_size(3).init::<TestBackend>(&device);
            let run   = run_chirp_training(
                &cfg, whole, model, toy_dataset(0.0), toy_dataset(20.0), &device,
                TrainingOutputs::default(),
            )
            .unwrap();
            assert_eq!(run.history.len(), 2);
            assert!(run.history.iter().all(|m| m.val_loss.is_finite() && m.train_acc.is_none()));
            assert!(run.best.best_score().unwrap() <= 0.0);
        }
    }

    #[test]
    fn test_diverged_training_is_an_error() {
        let device = Default::default();
        // A NaN step poisons every weight after the first batch
        let cfg    = TrainingConfig::new(2, 4, f64::NAN);
        let model  = ChirpGruConfig::new().with_hidden_size(3).init::<TestBackend>(&device);
        let res    = run_chirp_training(
            &cfg, false, model, toy_dataset(0.0), toy_dataset(20.0), &device,
            TrainingOutputs::default(),
        );
        match res {
            Err(e) => assert!(e.to_string().contains("diverged")),
            Ok(_)  => panic!("a NaN test loss must not count as a trained model"),
        }
    }

    #[test]
    fn test_predict_last_one_value_per_sample() {
        let device  = Default::default();
        let model   = ChirpGruConfig::new().with_hidden_size(3).init::<NdArray>(&device);
        let dataset = toy_dataset(0.0);
        let n       = dataset.len();
        assert_eq!(predict_last(&model, dataset, 4, &device).len(), n);
    }
}
