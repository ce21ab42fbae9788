// ============================================================
// Layer 5 — MNIST Feed-Forward Classifier
// ============================================================
// [batch, 28, 28] → flatten 784 → Linear 512 → ReLU → dropout
//                 → Linear 10

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu},
    prelude::*,
};

use crate::data::batcher::MNIST_SIDE;

pub const CHECKPOINT_NAME: &str = "mnist_mlp";
pub const NUM_DIGITS: usize = 10;

#[derive(Config, Debug)]
pub struct MnistMlpConfig {
    #[config(default = 512)]
    pub hidden_size: usize,
    #[config(default = 0.2)]
    pub dropout:     f64,
}

impl MnistMlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MnistMlp<B> {
        MnistMlp {
            hidden:     LinearConfig::new(MNIST_SIDE * MNIST_SIDE, self.hidden_size).init(device),
            activation: Relu::new(),
            dropout:    DropoutConfig::new(self.dropout).init(),
            out:        LinearConfig::new(self.hidden_size, NUM_DIGITS).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct MnistMlp<B: Backend> {
    pub hidden:     Linear<B>,
    pub activation: Relu,
    pub dropout:    Dropout,
    pub out:        Linear<B>,
}

impl<B: Backend> MnistMlp<B> {
    /// images [batch, 28, 28] → logits [batch, 10]
    pub fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        let x = images.reshape([batch, height * width]);
        let x = self.dropout.forward(self.activation.forward(self.hidden.forward(x)));
        self.out.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let model  = MnistMlpConfig::new().with_hidden_size(32).init::<NdArray>(&device);
        let images = Tensor::<NdArray, 3>::ones([4, MNIST_SIDE, MNIST_SIDE], &device);
        assert_eq!(model.forward(images).dims(), [4, NUM_DIGITS]);
    }
}
