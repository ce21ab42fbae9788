// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Models and the loops that train them. Everything here is
// generic over the Burn backend; the use cases pick WGPU, the
// tests pick NdArray.
//
//   sentiment_model.rs — Embedding + stacked BiLSTM with five
//                        interchangeable pooling heads
//   chirp_model.rs     — single GRU layer + linear read-out
//   mnist_model.rs     — 784 → 512 → 10 feed-forward network
//
//   trainer.rs         — sentiment training loop, plus the
//                        TrainingConfig / outputs shared by all
//                        three loops
//   chirp_trainer.rs   — MSE on the last step or whole window
//   mnist_trainer.rs   — shuffled, flip-augmented batches
//
//   evaluator.rs       — loss, predictions and accuracy over a
//                        whole split in inference mode
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};

/// Backend the training loops differentiate through
pub type TrainBackend = Autodiff<Wgpu>;
/// Backend for evaluation and reloaded checkpoints
pub type EvalBackend = Wgpu;

pub fn default_device() -> WgpuDevice {
    let device = WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    device
}

/// BiLSTM sentiment classifier
pub mod sentiment_model;

/// GRU forecaster for the chirp signal
pub mod chirp_model;

/// MLP digit classifier
pub mod mnist_model;

/// Sentiment training loop and shared training settings
pub mod trainer;

pub mod chirp_trainer;

pub mod mnist_trainer;

/// Whole-split evaluation
pub mod evaluator;
