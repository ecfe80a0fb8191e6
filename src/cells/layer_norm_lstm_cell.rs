//! Layer-normalized LSTM cell
//!
//! Reference: Ba et al., "Layer Normalization", 2016.
//!
//! Each gate pre-activation gets its own [`LayerNorm`] and the new memory is
//! normalized once more before the output `tanh`. The linear step carries no
//! bias; the norms' learned shifts play that role.

use crate::cells::{
    check_batch, check_width, lstm_update, validate_keep_prob, validate_units, Gates, LstmState,
    RecurrentCell, StateLayout,
};
use crate::error;
use crate::init::Initializer;
use crate::nn::{LayerNorm, LayerNormConfig};
use crate::store::{ParamPath, ParamStore, Reuse};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::debug;

/// One [`LayerNorm`] per gate plus one for the new memory, registered as
/// `ln_i`, `ln_j`, `ln_f`, `ln_o` and `ln_c`.
#[derive(Module, Debug)]
pub struct GateNorms<B: Backend> {
    pub ln_i: LayerNorm<B>,
    pub ln_j: LayerNorm<B>,
    pub ln_f: LayerNorm<B>,
    pub ln_o: LayerNorm<B>,
    pub ln_c: LayerNorm<B>,
}

impl<B: Backend> GateNorms<B> {
    pub fn bind(store: &mut ParamStore<B>, scope: &ParamPath, units: usize) -> error::Result<Self> {
        let config = LayerNormConfig::new();
        Ok(Self {
            ln_i: config.bind(store, &scope.child("ln_i"), units)?,
            ln_j: config.bind(store, &scope.child("ln_j"), units)?,
            ln_f: config.bind(store, &scope.child("ln_f"), units)?,
            ln_o: config.bind(store, &scope.child("ln_o"), units)?,
            ln_c: config.bind(store, &scope.child("ln_c"), units)?,
        })
    }

    pub(crate) fn normalize(&self, gates: Gates<B>) -> Gates<B> {
        Gates {
            i: self.ln_i.forward(gates.i),
            j: self.ln_j.forward(gates.j),
            f: self.ln_f.forward(gates.f),
            o: self.ln_o.forward(gates.o),
        }
    }
}

/// Configuration for [`LayerNormLstmCell`].
#[derive(Config, Debug)]
pub struct LayerNormLstmCellConfig {
    /// Number of hidden units.
    pub num_units: usize,
    /// Constant added to the (normalized) forget gate.
    #[config(default = 1.0)]
    pub forget_bias: f64,
    #[config(default = false)]
    pub use_recurrent_dropout: bool,
    #[config(default = 0.9)]
    pub dropout_keep_prob: f64,
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub input_init: Initializer,
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub hidden_init: Initializer,
}

impl LayerNormLstmCellConfig {
    pub fn validate(&self) -> error::Result<()> {
        validate_units("num_units", self.num_units)?;
        validate_keep_prob(self.dropout_keep_prob)
    }

    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        input_size: usize,
    ) -> error::Result<LayerNormLstmCell<B>> {
        self.validate()?;
        validate_units("input_size", input_size)?;
        let gates = 4 * self.num_units;

        let w_xh = store.matrix(
            &scope.child("W_xh"),
            [input_size, gates],
            self.input_init,
            Reuse::Auto,
        )?;
        let w_hh = store.matrix(
            &scope.child("W_hh"),
            [self.num_units, gates],
            self.hidden_init,
            Reuse::Auto,
        )?;
        let norms = GateNorms::bind(store, scope, self.num_units)?;

        debug!(
            scope = %scope,
            input_size,
            num_units = self.num_units,
            "bound layer-norm LSTM cell"
        );

        Ok(LayerNormLstmCell {
            w_xh,
            w_hh,
            norms,
            input_size,
            num_units: self.num_units,
            forget_bias: self.forget_bias,
            use_recurrent_dropout: self.use_recurrent_dropout,
            dropout_keep_prob: self.dropout_keep_prob,
        })
    }
}

/// LSTM with layer normalization, orthogonal initialization and recurrent
/// dropout without memory loss.
///
/// The packed state is `[h, c]`, the reverse of [`LstmCell`](crate::cells::LstmCell).
#[derive(Module, Debug)]
pub struct LayerNormLstmCell<B: Backend> {
    w_xh: Param<Tensor<B, 2>>,
    w_hh: Param<Tensor<B, 2>>,
    norms: GateNorms<B>,
    input_size: usize,
    num_units: usize,
    forget_bias: f64,
    use_recurrent_dropout: bool,
    dropout_keep_prob: f64,
}

impl<B: Backend> LayerNormLstmCell<B> {
    pub fn num_units(&self) -> usize {
        self.num_units
    }

    pub fn norms(&self) -> &GateNorms<B> {
        &self.norms
    }

    /// Advance one step on a typed state; returns `(new_hidden, new_state)`.
    pub fn step_state(
        &self,
        input: Tensor<B, 2>,
        state: LstmState<B>,
    ) -> error::Result<(Tensor<B, 2>, LstmState<B>)> {
        check_width(&input, self.input_size, "input")?;
        check_width(&state.hidden, self.num_units, "hidden state")?;
        check_width(&state.memory, self.num_units, "memory state")?;
        check_batch(&input, &state)?;

        let concat = Tensor::cat(vec![input, state.hidden], 1);
        let w_full = Tensor::cat(vec![self.w_xh.val(), self.w_hh.val()], 0);
        let gates = self
            .norms
            .normalize(Gates::split(concat.matmul(w_full), self.num_units));

        let dropout = self.use_recurrent_dropout.then_some(self.dropout_keep_prob);
        let new_state = lstm_update(
            gates,
            state.memory,
            self.forget_bias,
            dropout,
            Some(&self.norms.ln_c),
        );

        Ok((new_state.hidden.clone(), new_state))
    }
}

impl<B: Backend> RecurrentCell<B> for LayerNormLstmCell<B> {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.num_units
    }

    fn state_size(&self) -> usize {
        2 * self.num_units
    }

    fn state_layout(&self) -> StateLayout {
        StateLayout::HiddenFirst
    }

    fn step(&self, input: Tensor<B, 2>, state: Tensor<B, 2>) -> error::Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let state = LstmState::unpack(state, self.num_units, self.state_layout())?;
        let (output, new_state) = self.step_state(input, state)?;
        Ok((output, new_state.pack(StateLayout::HiddenFirst)))
    }
}
