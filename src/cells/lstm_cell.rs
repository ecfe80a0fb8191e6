use crate::cells::{
    check_batch, check_width, lstm_update, validate_keep_prob, validate_units, Gates, LstmState,
    RecurrentCell, StateLayout,
};
use crate::error;
use crate::init::Initializer;
use crate::store::{ParamPath, ParamStore, Reuse};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::debug;

/// Configuration for [`LstmCell`].
#[derive(Config, Debug)]
pub struct LstmCellConfig {
    /// Number of hidden units.
    pub num_units: usize,
    /// Constant added to the forget gate pre-activation.
    #[config(default = 1.0)]
    pub forget_bias: f64,
    /// Apply dropout to the candidate update.
    #[config(default = false)]
    pub use_recurrent_dropout: bool,
    /// Keep probability used when recurrent dropout is on.
    #[config(default = 0.9)]
    pub dropout_keep_prob: f64,
    /// Initializer for the input-to-hidden weight.
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub input_init: Initializer,
    /// Initializer for the hidden-to-hidden weight.
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub hidden_init: Initializer,
}

impl LstmCellConfig {
    pub fn validate(&self) -> error::Result<()> {
        validate_units("num_units", self.num_units)?;
        validate_keep_prob(self.dropout_keep_prob)
    }

    /// Validate the configuration and fetch `W_xh`, `W_hh` and `bias`
    /// from `store` under `scope`.
    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        input_size: usize,
    ) -> error::Result<LstmCell<B>> {
        self.validate()?;
        validate_units("input_size", input_size)?;
        let gates = 4 * self.num_units;

        // kept separate so each half can use its own initializer
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
        let bias = store.vector(
            &scope.child("bias"),
            gates,
            Initializer::Zeros,
            Reuse::Auto,
        )?;

        debug!(scope = %scope, input_size, num_units = self.num_units, "bound LSTM cell");

        Ok(LstmCell {
            w_xh,
            w_hh,
            bias,
            input_size,
            num_units: self.num_units,
            forget_bias: self.forget_bias,
            use_recurrent_dropout: self.use_recurrent_dropout,
            dropout_keep_prob: self.dropout_keep_prob,
        })
    }
}

/// LSTM with orthogonal initialization and recurrent dropout without
/// memory loss.
///
/// Implements:
/// - i, j, f, o = split([x, h] · [W_xh; W_hh] + b)
/// - c' = c * sigmoid(f + forget_bias) + sigmoid(i) * dropout(tanh(j))
/// - h' = tanh(c') * sigmoid(o)
///
/// The packed state is `[c, h]`.
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    w_xh: Param<Tensor<B, 2>>,
    w_hh: Param<Tensor<B, 2>>,
    bias: Param<Tensor<B, 1>>,
    input_size: usize,
    num_units: usize,
    forget_bias: f64,
    use_recurrent_dropout: bool,
    dropout_keep_prob: f64,
}

impl<B: Backend> LstmCell<B> {
    pub fn num_units(&self) -> usize {
        self.num_units
    }

    /// Advance one step on a typed state.
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape `[batch_size, input_size]`
    /// * `state` - Memory and hidden output, each `[batch_size, num_units]`
    ///
    /// # Returns
    /// Tuple of (new_hidden, new_state)
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
        let projection = concat.matmul(w_full) + self.bias.val().unsqueeze_dim(0);

        let gates = Gates::split(projection, self.num_units);
        let dropout = self.use_recurrent_dropout.then_some(self.dropout_keep_prob);
        let new_state = lstm_update(gates, state.memory, self.forget_bias, dropout, None);

        Ok((new_state.hidden.clone(), new_state))
    }
}

impl<B: Backend> RecurrentCell<B> for LstmCell<B> {
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
        StateLayout::MemoryFirst
    }

    fn step(&self, input: Tensor<B, 2>, state: Tensor<B, 2>) -> error::Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let state = LstmState::unpack(state, self.num_units, self.state_layout())?;
        let (output, new_state) = self.step_state(input, state)?;
        Ok((output, new_state.pack(StateLayout::MemoryFirst)))
    }
}
