//! Weight initializers
//!
//! Parameters are sampled on the host (so a seeded [`ParamStore`](crate::store::ParamStore)
//! reproduces the same weights on every backend) and then uploaded as Burn tensors.
//!
//! The orthogonal initializer follows Saxe et al.: draw a standard-normal
//! matrix, take its thin SVD and keep whichever orthogonal factor has the
//! requested shape.

use crate::error::{CellError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Normal, StandardNormal};
use serde::{Deserialize, Serialize};

/// Weight initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// All zeros.
    Zeros,
    /// Every entry set to `value`.
    Constant { value: f64 },
    /// Independent draws from `N(0, std²)`.
    Gaussian { std: f64 },
    /// Orthogonal matrix scaled by `gain`.
    Orthogonal { gain: f64 },
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Orthogonal { gain: 1.0 }
    }
}

impl Initializer {
    /// Select an initializer by name.
    ///
    /// `weight_start` is the constant value for `"constant"` and the
    /// standard deviation for `"gaussian"`; it is ignored otherwise.
    /// `"ortho"` always uses a gain of 1.0.
    pub fn from_name(name: &str, weight_start: f64) -> Result<Self> {
        match name {
            "zeros" => Ok(Initializer::Zeros),
            "constant" => Ok(Initializer::Constant {
                value: weight_start,
            }),
            "gaussian" => Ok(Initializer::Gaussian { std: weight_start }),
            "ortho" | "orthogonal" => Ok(Initializer::Orthogonal { gain: 1.0 }),
            other => Err(CellError::UnknownInitializer(other.to_string())),
        }
    }

    /// Sample row-major host data for a tensor of the given shape.
    pub fn sample<R: Rng>(&self, shape: &[usize], rng: &mut R) -> Result<Vec<f32>> {
        let numel = checked_numel(shape)?;
        match *self {
            Initializer::Zeros => Ok(vec![0.0; numel]),
            Initializer::Constant { value } => Ok(vec![value as f32; numel]),
            Initializer::Gaussian { std } => {
                if !(std.is_finite() && std >= 0.0) {
                    return Err(CellError::invalid(format!(
                        "gaussian initializer needs a finite, non-negative std, got {std}"
                    )));
                }
                let normal = Normal::new(0.0, std).map_err(|e| {
                    CellError::invalid(format!("gaussian initializer with std {std}: {e}"))
                })?;
                Ok((0..numel).map(|_| rng.sample(normal) as f32).collect())
            }
            Initializer::Orthogonal { gain } => orthogonal(shape, gain, rng),
        }
    }

    /// Sample a tensor of the given shape on `device`.
    pub fn init_tensor<B: Backend, const D: usize, R: Rng>(
        &self,
        shape: [usize; D],
        rng: &mut R,
        device: &B::Device,
    ) -> Result<Tensor<B, D>> {
        let data = self.sample(&shape, rng)?;
        Ok(Tensor::from_data(TensorData::new(data, shape), device))
    }
}

fn checked_numel(shape: &[usize]) -> Result<usize> {
    if shape.is_empty() {
        return Err(CellError::invalid("cannot initialize a scalar parameter"));
    }
    if let Some(dim) = shape.iter().position(|&d| d == 0) {
        return Err(CellError::invalid(format!(
            "dimension {dim} of shape {shape:?} must be positive"
        )));
    }
    Ok(shape.iter().product())
}

/// Orthogonal matrix of `shape`, multiplied by `gain`, as row-major data.
///
/// The first dimension gives the rows and the remaining dimensions are
/// collapsed into columns. For `rows >= cols` the columns are orthonormal,
/// otherwise the rows are.
pub fn orthogonal<R: Rng>(shape: &[usize], gain: f64, rng: &mut R) -> Result<Vec<f32>> {
    checked_numel(shape)?;
    let rows = shape[0];
    let cols: usize = shape[1..].iter().product();

    let a = DMatrix::<f64>::from_fn(rows, cols, |_, _| rng.sample::<f64, _>(StandardNormal));
    let tall = rows >= cols;
    let svd = a.svd(tall, !tall);

    // thin SVD: u is rows x min, v_t is min x cols
    let q = if tall {
        svd.u
            .ok_or_else(|| CellError::Decomposition("left singular vectors missing".into()))?
    } else {
        svd.v_t
            .ok_or_else(|| CellError::Decomposition("right singular vectors missing".into()))?
    };
    if q.shape() != (rows, cols) {
        return Err(CellError::Decomposition(format!(
            "factor has shape {:?}, expected {:?}",
            q.shape(),
            (rows, cols)
        )));
    }

    // nalgebra is column-major; iterating the transpose yields row-major order
    Ok(q.transpose().iter().map(|v| (v * gain) as f32).collect())
}
