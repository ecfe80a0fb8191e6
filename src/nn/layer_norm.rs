//! Layer normalization used inside the gated recurrences
//!
//! Statistics are taken per row over the feature axis. Unlike
//! [`burn::nn::LayerNorm`] the epsilon is added to the variance *before*
//! the square root and is fixed at `1e-3`.

use crate::error::{self, CellError};
use crate::init::Initializer;
use crate::store::{ParamPath, ParamStore, Reuse};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Added to the variance before taking the square root.
pub const LAYER_NORM_EPSILON: f64 = 1e-3;

/// Per-row mean and stabilized standard deviation, both `[batch, 1]`.
pub fn moments<B: Backend>(x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let mean = x.clone().mean_dim(1);
    let centered = x - mean.clone();
    let variance = centered.powf_scalar(2.0).mean_dim(1);
    let stddev = variance.add_scalar(LAYER_NORM_EPSILON).sqrt();
    (mean, stddev)
}

/// Configuration for [`LayerNorm`].
#[derive(Config, Debug)]
pub struct LayerNormConfig {
    /// Initial value of the learned gain.
    #[config(default = 1.0)]
    pub alpha_start: f64,
    /// Initial value of the learned shift.
    #[config(default = 0.0)]
    pub bias_start: f64,
}

impl LayerNormConfig {
    /// Fetch or create `layer_norm_alpha` and `layer_norm_bias` under `scope`.
    pub fn bind<B: Backend>(
        &self,
        store: &mut ParamStore<B>,
        scope: &ParamPath,
        d_features: usize,
    ) -> error::Result<LayerNorm<B>> {
        if d_features == 0 {
            return Err(CellError::invalid(format!(
                "layer norm `{scope}` needs a positive feature width"
            )));
        }
        let alpha = store.vector(
            &scope.child("layer_norm_alpha"),
            d_features,
            Initializer::Constant {
                value: self.alpha_start,
            },
            Reuse::Auto,
        )?;
        let beta = store.vector(
            &scope.child("layer_norm_bias"),
            d_features,
            Initializer::Constant {
                value: self.bias_start,
            },
            Reuse::Auto,
        )?;
        Ok(LayerNorm {
            alpha,
            beta,
            d_features,
        })
    }
}

/// Learned affine rescaling of zero-mean, unit-variance rows.
#[derive(Module, Debug)]
pub struct LayerNorm<B: Backend> {
    /// Per-feature gain, shape `[d_features]`.
    pub alpha: Param<Tensor<B, 1>>,
    /// Per-feature shift, shape `[d_features]`.
    pub beta: Param<Tensor<B, 1>>,
    d_features: usize,
}

impl<B: Backend> LayerNorm<B> {
    pub fn d_features(&self) -> usize {
        self.d_features
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let (mean, stddev) = moments(x.clone());
        let normalized = (x - mean) / stddev;
        normalized * self.alpha.val().unsqueeze_dim(0) + self.beta.val().unsqueeze_dim(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_moments() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0, 3.0, 4.0], [5.0, 5.0, 5.0, 5.0]], &device);
        let (mean, stddev) = moments(x);

        assert_eq!(mean.dims(), [2, 1]);
        let mean = mean.into_data().to_vec::<f32>().unwrap();
        let stddev = stddev.into_data().to_vec::<f32>().unwrap();

        assert!((mean[0] - 2.5).abs() < 1e-6);
        assert!((mean[1] - 5.0).abs() < 1e-6);
        // population variance of 1..4 is 1.25
        assert!((stddev[0] - (1.25f32 + 1e-3).sqrt()).abs() < 1e-6);
        // constant row only sees the epsilon
        assert!((stddev[1] - 1e-3f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_output_is_standardized() {
        let device = Default::default();
        let mut store = ParamStore::<TestBackend>::seeded(&device, 0);
        let norm = LayerNormConfig::new()
            .bind(&mut store, &ParamPath::root("ln_i"), 64)
            .unwrap();

        let x = Tensor::<TestBackend, 2>::random([3, 64], Distribution::Normal(4.0, 10.0), &device);
        let y = norm.forward(x);

        let mean = y.clone().mean_dim(1).into_data().to_vec::<f32>().unwrap();
        let var = (y.clone() - y.mean_dim(1))
            .powf_scalar(2.0)
            .mean_dim(1)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        for row in 0..3 {
            assert!(mean[row].abs() < 1e-4, "row {} mean {}", row, mean[row]);
            assert!((var[row] - 1.0).abs() < 1e-3, "row {} variance {}", row, var[row]);
        }
    }

    #[test]
    fn test_affine_parameters_apply() {
        let device = Default::default();
        let mut store = ParamStore::<TestBackend>::seeded(&device, 0);
        let norm = LayerNormConfig::new()
            .with_alpha_start(2.0)
            .with_bias_start(0.5)
            .bind(&mut store, &ParamPath::root("ln_c"), 2)
            .unwrap();

        // [-1, 1] standardizes to [-1, 1] / sqrt(1 + eps)
        let x = Tensor::<TestBackend, 2>::from_floats([[-1.0, 1.0]], &device);
        let y = norm.forward(x).into_data().to_vec::<f32>().unwrap();
        let scale = 2.0 / (1.0f32 + 1e-3).sqrt();

        assert!((y[0] - (0.5 - scale)).abs() < 1e-5);
        assert!((y[1] - (0.5 + scale)).abs() < 1e-5);
        assert_eq!(store.len(), 2);
    }
}
