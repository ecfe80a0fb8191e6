//! # Recurrent Cell Implementations
//!
//! Single-timestep gated cells. Every cell maps `(input, state)` to
//! `(output, new_state)` and keeps nothing between calls apart from the
//! weights it was bound to; the caller threads the state through time
//! (see [`crate::rnn::Rnn`] for a ready-made driver).
//!
//! ## Cell Types
//!
//! | Cell | Description | State layout |
//! |------|-------------|--------------|
//! | [`LstmCell`] | Orthogonally initialized LSTM | `[c, h]` |
//! | [`LayerNormLstmCell`] | LSTM with layer norm on every gate and on `c` | `[h, c]` |
//! | [`HyperLstmCell`] | LSTM whose gates are rescaled by a smaller LSTM | `[h, h_hyper, c, c_hyper]` |
//!
//! ## Recurrence
//!
//! ```text
//! i, j, f, o = split(x·W_xh + h·W_hh + b)
//! g  = dropout(tanh(j))
//! c' = c ⊙ σ(f + forget_bias) + σ(i) ⊙ g
//! h' = tanh(c') ⊙ σ(o)
//! ```
//!
//! The normalized variants drop `b` and pass `i, j, f, o` and `c'` (before
//! the `tanh`) through their own [`LayerNorm`](crate::nn::LayerNorm).
//!
//! ## Binding
//!
//! Cells are built in two phases: a Burn `Config` holds the
//! hyperparameters, and `bind` validates it and fetches the weights from a
//! [`ParamStore`](crate::store::ParamStore). Binding twice under the same
//! scope yields two handles to the same weights.
//!
//! ```ignore
//! use supercell::prelude::*;
//!
//! let mut store = ParamStore::<Backend>::seeded(&device, 42);
//! let cell = LstmCellConfig::new(32)
//!     .bind(&mut store, &ParamPath::root("lstm"), 16)?;
//!
//! let state = cell.zero_state(4, &device);
//! let (output, state) = cell.step(input, state)?;
//! ```

pub mod hyper_lstm_cell;
pub mod layer_norm_lstm_cell;
pub mod lstm_cell;
pub mod state;

pub use hyper_lstm_cell::{
    HyperLstmCell, HyperLstmCellConfig, HyperScaling, HyperScalingConfig, HyperSubCell,
};
pub use layer_norm_lstm_cell::{GateNorms, LayerNormLstmCell, LayerNormLstmCellConfig};
pub use lstm_cell::{LstmCell, LstmCellConfig};
pub use state::{HyperLstmState, LstmState, StateLayout};

use crate::error::{CellError, Result};
use crate::nn::recurrent_dropout;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A recurrent cell driven one time step at a time.
pub trait RecurrentCell<B: Backend> {
    /// Width of the input accepted by [`step`](Self::step).
    fn input_size(&self) -> usize;

    /// Width of the output returned by [`step`](Self::step).
    fn output_size(&self) -> usize;

    /// Width of the packed state, always twice the total hidden units.
    fn state_size(&self) -> usize;

    /// Ordering of the memory and hidden halves in the packed state.
    fn state_layout(&self) -> StateLayout;

    /// Advance one time step.
    ///
    /// `input` is `[batch, input_size]` and `state` is `[batch, state_size]`.
    /// Returns `(output, new_state)` with the same batch size.
    fn step(&self, input: Tensor<B, 2>, state: Tensor<B, 2>) -> Result<(Tensor<B, 2>, Tensor<B, 2>)>;

    /// All-zero packed state for `batch_size` sequences.
    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([batch_size, self.state_size()], device)
    }
}

/// The four gate pre-activations of one step.
#[derive(Debug, Clone)]
pub(crate) struct Gates<B: Backend> {
    /// input gate
    pub i: Tensor<B, 2>,
    /// candidate
    pub j: Tensor<B, 2>,
    /// forget gate
    pub f: Tensor<B, 2>,
    /// output gate
    pub o: Tensor<B, 2>,
}

impl<B: Backend> Gates<B> {
    /// Split a `[batch, 4 * units]` projection into `i, j, f, o`.
    pub fn split(projection: Tensor<B, 2>, units: usize) -> Self {
        Self {
            i: projection.clone().narrow(1, 0, units),
            j: projection.clone().narrow(1, units, units),
            f: projection.clone().narrow(1, 2 * units, units),
            o: projection.narrow(1, 3 * units, units),
        }
    }
}

/// Memory and hidden update shared by every cell in this module.
///
/// `norm_c`, when present, is applied to the new memory before the `tanh`;
/// the returned memory itself is left unnormalized.
pub(crate) fn lstm_update<B: Backend>(
    gates: Gates<B>,
    memory: Tensor<B, 2>,
    forget_bias: f64,
    dropout_keep_prob: Option<f64>,
    norm_c: Option<&crate::nn::LayerNorm<B>>,
) -> LstmState<B> {
    let mut candidate = gates.j.tanh();
    if let Some(keep_prob) = dropout_keep_prob {
        candidate = recurrent_dropout(candidate, keep_prob);
    }

    let new_memory = memory * activation::sigmoid(gates.f.add_scalar(forget_bias))
        + activation::sigmoid(gates.i) * candidate;
    let squashed = match norm_c {
        Some(norm) => norm.forward(new_memory.clone()),
        None => new_memory.clone(),
    };
    let new_hidden = squashed.tanh() * activation::sigmoid(gates.o);

    LstmState::new(new_memory, new_hidden)
}

pub(crate) fn check_width<B: Backend>(
    tensor: &Tensor<B, 2>,
    expected: usize,
    context: &str,
) -> Result<()> {
    let actual = tensor.dims()[1];
    if actual != expected {
        return Err(CellError::shape(context, expected, actual));
    }
    Ok(())
}

/// Input and both state halves must agree on the batch size.
pub(crate) fn check_batch<B: Backend>(input: &Tensor<B, 2>, state: &LstmState<B>) -> Result<()> {
    let batch = input.dims()[0];
    for (tensor, context) in [
        (&state.hidden, "hidden state batch"),
        (&state.memory, "memory state batch"),
    ] {
        let actual = tensor.dims()[0];
        if actual != batch {
            return Err(CellError::shape(context, batch, actual));
        }
    }
    Ok(())
}

pub(crate) fn validate_units(name: &str, units: usize) -> Result<()> {
    if units == 0 {
        return Err(CellError::invalid(format!("{name} must be positive")));
    }
    Ok(())
}

pub(crate) fn validate_keep_prob(keep_prob: f64) -> Result<()> {
    if !(keep_prob > 0.0 && keep_prob <= 1.0) {
        return Err(CellError::invalid(format!(
            "dropout_keep_prob must lie in (0, 1], got {keep_prob}"
        )));
    }
    Ok(())
}
