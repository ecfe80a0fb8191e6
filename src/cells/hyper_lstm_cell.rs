//! HyperLSTM Cell Implementation
//!
//! Reference: Ha, Dai & Le, "HyperNetworks", ICLR 2017.
//!
//! A small LSTM (the hyper cell) reads `[x, h]` at every step. Its output is
//! projected to a low-dimensional embedding per gate, and each embedding is
//! projected back up to a per-unit gain (and, for the recurrent
//! contributions, a per-unit shift) applied to the main cell's gate
//! pre-activations:
//!
//! ```text
//! ĥ, ŝ'     = hyper_cell([x, h], ŝ)
//! gate_x    = alpha_x(ĥ) ⊙ (x·W_xh)_gate
//! gate_h    = alpha_h(ĥ) ⊙ (h·W_hh)_gate + beta_h(ĥ)
//! gate      = gate_x + gate_h + b_gate
//! ```
//!
//! after which the usual (optionally layer-normalized) LSTM update runs.

use crate::cells::{
    check_batch, check_width, lstm_update, validate_keep_prob, validate_units, GateNorms, Gates,
    HyperLstmState, LayerNormLstmCell, LayerNormLstmCellConfig, LstmCell, LstmCellConfig,
    LstmState, RecurrentCell, StateLayout,
};
use crate::error;
use crate::init::Initializer;
use crate::nn::{SuperLinear, SuperLinearConfig};
use crate::store::{ParamPath, ParamStore, Reuse};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::debug;

/// Configuration for one [`HyperScaling`] transform.
#[derive(Config, Debug)]
pub struct HyperScalingConfig {
    /// Width of the gate slice being scaled.
    pub num_units: usize,
    /// Width of the intermediate embedding.
    pub embedding_size: usize,
    /// Initial gain produced for every unit (Cooijmans et al. use 0.1).
    #[config(default = 0.1)]
    pub init_gamma: f64,
    /// Also generate an additive per-unit shift.
    #[config(default = true)]
    pub use_bias: bool,
}

impl HyperScalingConfig {
    /// Register `zw`, `alpha` and, with a shift, `zb` and `beta` under `scope`.
    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        hyper_units: usize,
    ) -> error::Result<HyperScaling<B>> {
        validate_units("hyper_embedding_size", self.embedding_size)?;
        let embedding = self.embedding_size as f64;

        // zw starts at exactly one, so alpha starts at embedding * init_gamma / embedding
        let zw = SuperLinearConfig::new(self.embedding_size)
            .with_initializer(Initializer::Constant { value: 0.0 })
            .with_bias_start(1.0)
            .bind(store, &scope.child("zw"), hyper_units)?;
        let alpha = SuperLinearConfig::new(self.num_units)
            .with_initializer(Initializer::Constant {
                value: self.init_gamma / embedding,
            })
            .with_bias(false)
            .bind(store, &scope.child("alpha"), self.embedding_size)?;

        let (zb, beta) = if self.use_bias {
            let zb = SuperLinearConfig::new(self.embedding_size)
                .with_initializer(Initializer::Gaussian { std: 0.01 })
                .with_bias(false)
                .bind(store, &scope.child("zb"), hyper_units)?;
            let beta = SuperLinearConfig::new(self.num_units)
                .with_initializer(Initializer::Zeros)
                .with_bias(false)
                .bind(store, &scope.child("beta"), self.embedding_size)?;
            (Some(zb), Some(beta))
        } else {
            (None, None)
        };

        Ok(HyperScaling {
            zw,
            alpha,
            zb,
            beta,
        })
    }
}

/// Gain (and optional shift) generated from the hyper cell's output.
#[derive(Module, Debug)]
pub struct HyperScaling<B: Backend> {
    zw: SuperLinear<B>,
    alpha: SuperLinear<B>,
    zb: Option<SuperLinear<B>>,
    beta: Option<SuperLinear<B>>,
}

impl<B: Backend> HyperScaling<B> {
    /// Per-unit gain, `[batch, num_units]`.
    pub fn gain(&self, hyper_output: Tensor<B, 2>) -> Tensor<B, 2> {
        self.alpha.forward(self.zw.forward(hyper_output))
    }

    /// `gain(ĥ) ⊙ layer (+ shift(ĥ))`.
    pub fn forward(&self, hyper_output: Tensor<B, 2>, layer: Tensor<B, 2>) -> Tensor<B, 2> {
        let scaled = self.gain(hyper_output.clone()) * layer;
        match (&self.zb, &self.beta) {
            (Some(zb), Some(beta)) => scaled + beta.forward(zb.forward(hyper_output)),
            _ => scaled,
        }
    }
}

/// One [`HyperScaling`] per gate.
#[derive(Module, Debug)]
pub struct GateScalers<B: Backend> {
    i: HyperScaling<B>,
    j: HyperScaling<B>,
    f: HyperScaling<B>,
    o: HyperScaling<B>,
}

impl<B: Backend> GateScalers<B> {
    /// Registers `hyper_i{suffix}`, `hyper_j{suffix}`, ... under `scope`.
    fn bind(
        config: &HyperScalingConfig,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        suffix: &str,
        hyper_units: usize,
    ) -> error::Result<Self> {
        let mut scaler = |gate: &str| {
            config.bind(store, &scope.child(format!("hyper_{gate}{suffix}")), hyper_units)
        };
        Ok(Self {
            i: scaler("i")?,
            j: scaler("j")?,
            f: scaler("f")?,
            o: scaler("o")?,
        })
    }

    fn apply(&self, hyper_output: &Tensor<B, 2>, gates: Gates<B>) -> Gates<B> {
        Gates {
            i: self.i.forward(hyper_output.clone(), gates.i),
            j: self.j.forward(hyper_output.clone(), gates.j),
            f: self.f.forward(hyper_output.clone(), gates.f),
            o: self.o.forward(hyper_output.clone(), gates.o),
        }
    }
}

/// Configuration for [`HyperLstmCell`].
#[derive(Config, Debug)]
pub struct HyperLstmCellConfig {
    /// Number of hidden units in the main cell.
    pub num_units: usize,
    #[config(default = 1.0)]
    pub forget_bias: f64,
    #[config(default = false)]
    pub use_recurrent_dropout: bool,
    /// Keep probability shared by the main and the hyper cell.
    #[config(default = 0.9)]
    pub dropout_keep_prob: f64,
    /// Layer-normalize both the main cell and the hyper cell.
    #[config(default = true)]
    pub use_layer_norm: bool,
    /// Hidden units of the hyper cell (256 is worth trying on larger tasks).
    #[config(default = 128)]
    pub hyper_num_units: usize,
    /// Width of the signals emitted by the hyper cell per gate.
    #[config(default = 4)]
    pub hyper_embedding_size: usize,
    /// Recurrent dropout inside the hyper cell; mostly useful once
    /// `hyper_num_units` reaches 512 or so.
    #[config(default = false)]
    pub hyper_use_recurrent_dropout: bool,
    /// Initial gain applied to every gate contribution.
    #[config(default = 0.1)]
    pub init_gamma: f64,
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub input_init: Initializer,
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub hidden_init: Initializer,
}

impl HyperLstmCellConfig {
    pub fn validate(&self) -> error::Result<()> {
        validate_units("num_units", self.num_units)?;
        validate_units("hyper_num_units", self.hyper_num_units)?;
        validate_units("hyper_embedding_size", self.hyper_embedding_size)?;
        validate_keep_prob(self.dropout_keep_prob)
    }

    /// Packed state width: `2 * (num_units + hyper_num_units)`.
    pub fn state_size(&self) -> usize {
        2 * (self.num_units + self.hyper_num_units)
    }

    /// Bind the main weights, the hyper cell (under `hyper_cell`), the
    /// per-gate scalers and, with layer norm, the gate norms.
    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        input_size: usize,
    ) -> error::Result<HyperLstmCell<B>> {
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
        let bias = store.vector(
            &scope.child("bias"),
            gates,
            Initializer::Zeros,
            Reuse::Auto,
        )?;

        let hyper_scope = scope.child("hyper_cell");
        let hyper_input_size = input_size + self.num_units;
        let hyper_cell = if self.use_layer_norm {
            let cell = LayerNormLstmCellConfig::new(self.hyper_num_units)
                .with_use_recurrent_dropout(self.hyper_use_recurrent_dropout)
                .with_dropout_keep_prob(self.dropout_keep_prob)
                .bind(store, &hyper_scope, hyper_input_size)?;
            HyperSubCell::LayerNorm(cell)
        } else {
            let cell = LstmCellConfig::new(self.hyper_num_units)
                .with_use_recurrent_dropout(self.hyper_use_recurrent_dropout)
                .with_dropout_keep_prob(self.dropout_keep_prob)
                .bind(store, &hyper_scope, hyper_input_size)?;
            HyperSubCell::Lstm(cell)
        };

        let scaling = HyperScalingConfig::new(self.num_units, self.hyper_embedding_size)
            .with_init_gamma(self.init_gamma);
        // the input contributions get a gain only
        let input_scalers = GateScalers::bind(
            &scaling.clone().with_use_bias(false),
            store,
            scope,
            "x",
            self.hyper_num_units,
        )?;
        let hidden_scalers = GateScalers::bind(&scaling, store, scope, "h", self.hyper_num_units)?;

        let norms = if self.use_layer_norm {
            Some(GateNorms::bind(store, scope, self.num_units)?)
        } else {
            None
        };

        debug!(
            scope = %scope,
            input_size,
            num_units = self.num_units,
            hyper_num_units = self.hyper_num_units,
            embedding_size = self.hyper_embedding_size,
            layer_norm = self.use_layer_norm,
            "bound HyperLSTM cell"
        );

        Ok(HyperLstmCell {
            w_xh,
            w_hh,
            bias,
            hyper_cell,
            input_scalers,
            hidden_scalers,
            norms,
            input_size,
            num_units: self.num_units,
            hyper_num_units: self.hyper_num_units,
            forget_bias: self.forget_bias,
            use_recurrent_dropout: self.use_recurrent_dropout,
            dropout_keep_prob: self.dropout_keep_prob,
        })
    }
}

/// The inner cell driving a [`HyperLstmCell`], normalized whenever the
/// outer cell is.
#[derive(Module, Debug)]
pub enum HyperSubCell<B: Backend> {
    Lstm(LstmCell<B>),
    LayerNorm(LayerNormLstmCell<B>),
}

impl<B: Backend> HyperSubCell<B> {
    pub fn num_units(&self) -> usize {
        match self {
            HyperSubCell::Lstm(cell) => cell.num_units(),
            HyperSubCell::LayerNorm(cell) => cell.num_units(),
        }
    }

    pub fn step_state(
        &self,
        input: Tensor<B, 2>,
        state: LstmState<B>,
    ) -> error::Result<(Tensor<B, 2>, LstmState<B>)> {
        match self {
            HyperSubCell::Lstm(cell) => cell.step_state(input, state),
            HyperSubCell::LayerNorm(cell) => cell.step_state(input, state),
        }
    }
}

/// LSTM whose gate pre-activations are rescaled at every step by signals
/// from an inner, smaller LSTM.
///
/// The packed state is always `[h, h_hyper, c, c_hyper]`, with or without
/// layer norm.
#[derive(Module, Debug)]
pub struct HyperLstmCell<B: Backend> {
    w_xh: Param<Tensor<B, 2>>,
    w_hh: Param<Tensor<B, 2>>,
    bias: Param<Tensor<B, 1>>,
    hyper_cell: HyperSubCell<B>,
    input_scalers: GateScalers<B>,
    hidden_scalers: GateScalers<B>,
    norms: Option<GateNorms<B>>,
    input_size: usize,
    num_units: usize,
    hyper_num_units: usize,
    forget_bias: f64,
    use_recurrent_dropout: bool,
    dropout_keep_prob: f64,
}

impl<B: Backend> HyperLstmCell<B> {
    pub fn num_units(&self) -> usize {
        self.num_units
    }

    pub fn hyper_num_units(&self) -> usize {
        self.hyper_num_units
    }

    pub fn uses_layer_norm(&self) -> bool {
        self.norms.is_some()
    }

    pub fn hyper_cell(&self) -> &HyperSubCell<B> {
        &self.hyper_cell
    }

    /// Advance one step on a typed state; returns `(new_hidden, new_state)`.
    pub fn step_state(
        &self,
        input: Tensor<B, 2>,
        state: HyperLstmState<B>,
    ) -> error::Result<(Tensor<B, 2>, HyperLstmState<B>)> {
        check_width(&input, self.input_size, "input")?;
        check_width(&state.outer.hidden, self.num_units, "hidden state")?;
        check_width(&state.outer.memory, self.num_units, "memory state")?;
        check_batch(&input, &state.outer)?;

        let HyperLstmState { outer, hyper } = state;

        let hyper_input = Tensor::cat(vec![input.clone(), outer.hidden.clone()], 1);
        let (hyper_output, hyper_state) = self.hyper_cell.step_state(hyper_input, hyper)?;

        let xh = Gates::split(input.matmul(self.w_xh.val()), self.num_units);
        let hh = Gates::split(outer.hidden.matmul(self.w_hh.val()), self.num_units);
        let bias = Gates::split(self.bias.val().unsqueeze_dim(0), self.num_units);

        let xh = self.input_scalers.apply(&hyper_output, xh);
        let hh = self.hidden_scalers.apply(&hyper_output, hh);
        let mut gates = Gates {
            i: xh.i + hh.i + bias.i,
            j: xh.j + hh.j + bias.j,
            f: xh.f + hh.f + bias.f,
            o: xh.o + hh.o + bias.o,
        };
        if let Some(norms) = &self.norms {
            gates = norms.normalize(gates);
        }

        let dropout = self.use_recurrent_dropout.then_some(self.dropout_keep_prob);
        let new_outer = lstm_update(
            gates,
            outer.memory,
            self.forget_bias,
            dropout,
            self.norms.as_ref().map(|n| &n.ln_c),
        );

        Ok((
            new_outer.hidden.clone(),
            HyperLstmState::new(new_outer, hyper_state),
        ))
    }
}

impl<B: Backend> RecurrentCell<B> for HyperLstmCell<B> {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.num_units
    }

    fn state_size(&self) -> usize {
        2 * (self.num_units + self.hyper_num_units)
    }

    fn state_layout(&self) -> StateLayout {
        StateLayout::HiddenFirst
    }

    fn step(&self, input: Tensor<B, 2>, state: Tensor<B, 2>) -> error::Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let layout = self.state_layout();
        let state = HyperLstmState::unpack(state, self.num_units, self.hyper_num_units, layout)?;
        let (output, new_state) = self.step_state(input, state)?;
        Ok((output, new_state.pack(layout)))
    }

    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
        HyperLstmState::zeros(batch_size, self.num_units, self.hyper_num_units, device)
            .pack(self.state_layout())
    }
}
