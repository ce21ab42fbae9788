// ============================================================
// Layer 5 — GRU Chirp Forecaster
// ============================================================
// input [batch, seq_len, 1] → dropout → GRU → Linear(hidden, 1)
//
// The model is trained to output the window shifted by one step,
// so the value at the last position is the forecast of the next
// point of the signal.

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
};

pub const CHECKPOINT_NAME: &str = "chirp_gru";

#[derive(Config, Debug)]
pub struct ChirpGruConfig {
    #[config(default = 16)]
    pub hidden_size: usize,
    /// Dropout on the GRU input
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl ChirpGruConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ChirpGru<B> {
        ChirpGru {
            input_drop: DropoutConfig::new(self.dropout).init(),
            gru:        GruConfig::new(1, self.hidden_size, true).init(device),
            out:        LinearConfig::new(self.hidden_size, 1).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct ChirpGru<B: Backend> {
    pub input_drop: Dropout,
    pub gru:        Gru<B>,
    pub out:        Linear<B>,
}

impl<B: Backend> ChirpGru<B> {
    /// [batch, seq_len, 1] → prediction at every step [batch, seq_len, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.gru.forward(self.input_drop.forward(x), None);
        self.out.forward(hidden)
    }

    /// [batch, seq_len, 1] → prediction at the last step [batch, 1]
    pub fn forward_last(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let hidden = self.gru.forward(self.input_drop.forward(x), None);
        let [b, l, h] = hidden.dims();
        self.out.forward(hidden.slice([0..b, l - 1..l, 0..h]).reshape([b, h]))
    }
}
