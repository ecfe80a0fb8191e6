//! Linear projection with a selectable weight initializer.

use crate::error::{self, CellError};
use crate::init::Initializer;
use crate::store::{ParamPath, ParamStore, Reuse};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration for [`SuperLinear`].
#[derive(Config, Debug)]
pub struct SuperLinearConfig {
    /// Output width.
    pub d_output: usize,
    /// Weight initializer.
    #[config(default = "Initializer::Orthogonal { gain: 1.0 }")]
    pub initializer: Initializer,
    /// Whether a learned bias is added.
    #[config(default = true)]
    pub bias: bool,
    /// Constant the bias starts from.
    #[config(default = 0.0)]
    pub bias_start: f64,
    /// Require the tensors to already exist in the store.
    #[config(default = false)]
    pub reuse: bool,
}

impl SuperLinearConfig {
    /// Fetch or create the weight (`super_linear_w`) and bias
    /// (`super_linear_b`) under `scope`.
    ///
    /// Fails with [`CellError::ParamShapeMismatch`] when a weight already
    /// registered under `scope` has a different input width.
    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        d_input: usize,
    ) -> error::Result<SuperLinear<B>> {
        if d_input == 0 || self.d_output == 0 {
            return Err(CellError::invalid(format!(
                "linear layer `{scope}` needs positive widths, got {d_input} -> {}",
                self.d_output
            )));
        }

        let reuse = Reuse::from(self.reuse);
        let weight = store.matrix(
            &scope.child("super_linear_w"),
            [d_input, self.d_output],
            self.initializer,
            reuse,
        )?;
        let bias = if self.bias {
            Some(store.vector(
                &scope.child("super_linear_b"),
                self.d_output,
                Initializer::Constant {
                    value: self.bias_start,
                },
                reuse,
            )?)
        } else {
            None
        };

        Ok(SuperLinear {
            weight,
            bias,
            d_input,
            d_output: self.d_output,
        })
    }
}

/// `x·W (+ b)` for a `[batch, d_input]` input.
#[derive(Module, Debug)]
pub struct SuperLinear<B: Backend> {
    /// Weight of shape `[d_input, d_output]`.
    pub weight: Param<Tensor<B, 2>>,
    /// Optional bias of shape `[d_output]`.
    pub bias: Option<Param<Tensor<B, 1>>>,
    d_input: usize,
    d_output: usize,
}

impl<B: Backend> SuperLinear<B> {
    pub fn d_input(&self) -> usize {
        self.d_input
    }

    pub fn d_output(&self) -> usize {
        self.d_output
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let output = input.matmul(self.weight.val());
        match &self.bias {
            Some(bias) => output + bias.val().unsqueeze_dim(0),
            None => output,
        }
    }
}
