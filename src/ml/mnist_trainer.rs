// ============================================================
// Layer 5 — MNIST Training Loop
// ============================================================
// Shuffled batches with random horizontal flips for training,
// the untouched test split for evaluation. Train loss and
// accuracy are accumulated from the training batches as they go,
// test loss and accuracy come from a full pass with model.valid().

use anyhow::{bail, Result};
use burn::{
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{vision::MnistItem, Dataset},
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::MnistBatcher;
use crate::domain::best::BestTracker;
use crate::infra::metrics::EpochMetrics;
use crate::ml::{
    evaluator::{cross_entropy, evaluate_mnist, ClassificationTally},
    mnist_model::{MnistMlp, CHECKPOINT_NAME},
    trainer::{TrainingConfig, TrainingOutputs, TrainingRun},
};

const SHUFFLE_SEED: u64 = 42;

pub fn run_mnist_training<B, DTrain, DTest>(
    cfg:     &TrainingConfig,
    model:   MnistMlp<B>,
    train:   DTrain,
    test:    DTest,
    device:  &B::Device,
    outputs: TrainingOutputs<'_>,
) -> Result<TrainingRun<MnistMlp<B>>>
where
    B:      AutodiffBackend,
    DTrain: Dataset<MnistItem> + 'static,
    DTest:  Dataset<MnistItem> + 'static,
{
    if train.is_empty() {
        bail!("The MNIST training split is empty");
    }

    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();
    let mut model = model;

    let train_loader = DataLoaderBuilder::new(MnistBatcher::<B>::new(device.clone(), true))
        .batch_size(cfg.batch_size)
        .shuffle(SHUFFLE_SEED)
        .num_workers(1)
        .build(train);
    let test_loader = DataLoaderBuilder::new(MnistBatcher::<B::InnerBackend>::new(device.clone(), false))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test);

    let mut history = Vec::with_capacity(cfg.epochs);
    let mut best    = BestTracker::new();

    for epoch in 1..=cfg.epochs {
        let mut train_tally = ClassificationTally::new();

        for batch in train_loader.iter() {
            let logits = model.forward(batch.images);
            let loss   = cross_entropy(logits.clone(), batch.targets.clone());
            train_tally.add_batch(loss.clone().into_scalar().elem::<f64>(), logits, batch.targets);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }
        let train_eval = train_tally.finish();

        let model_valid = model.valid();
        let test_eval   = evaluate_mnist(&model_valid, &*test_loader);

        println!(
            "Epoch {} | Train Loss {:.4}, Train Acc {:.2} - Test Loss {:.4}, Test Acc {:.2}",
            epoch, train_eval.loss, train_eval.accuracy, test_eval.loss, test_eval.accuracy,
        );

        let metrics = EpochMetrics::classification(
            epoch, train_eval.loss, train_eval.accuracy, test_eval.loss, test_eval.accuracy,
        );
        outputs.log(&metrics)?;
        history.push(metrics);

        if best.observe(epoch, test_eval.accuracy) {
            if let Some(ckpt) = outputs.checkpoints {
                ckpt.save_model(CHECKPOINT_NAME, &model_valid)?;
            }
        }
    }

    Ok(TrainingRun { model, history, best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::CheckpointManager;
    use crate::ml::mnist_model::MnistMlpConfig;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataset::InMemDataset,
    };

    type TestBackend = Autodiff<NdArray>;

    fn digit(label: u8) -> MnistItem {
        let mut image = [[0.0f32; 28]; 28];
        image[label as usize][label as usize] = 255.0;
        MnistItem { image, label }
    }

    #[test]
    fn test_training_on_tiny_split() {
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let items: Vec<MnistItem> = (0..10u8).map(digit).collect();

        let run = run_mnist_training(
            &TrainingConfig::new(2, 4, 1e-3),
            MnistMlpConfig::new().with_hidden_size(16).init::<TestBackend>(&device),
            InMemDataset::new(items.clone()),
            InMemDataset::new(items),
            &device,
            TrainingOutputs { checkpoints: Some(&ckpt), metrics: None },
        )
        .unwrap();

        assert_eq!(run.history.len(), 2);
        let acc = run.history[1].val_acc.unwrap();
        assert!((0.0..=100.0).contains(&acc));
        assert!(ckpt.has_model(CHECKPOINT_NAME));
    }
}
