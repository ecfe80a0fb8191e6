//! # Building Blocks
//!
//! Small parameterized layers shared by the recurrent cells. Each layer is
//! described by a Burn [`Config`](burn::config::Config) and materialized by
//! `bind`, which fetches (or creates) its tensors from a
//! [`ParamStore`](crate::store::ParamStore) under a caller-supplied scope.
//!
//! | Layer | Computes |
//! |-------|----------|
//! | [`SuperLinear`] | `x·W (+ b)` with a selectable initializer |
//! | [`LayerNorm`] | `alpha ⊙ (x − mean) / sqrt(var + 1e-3) + beta` per row |
//! | [`recurrent_dropout`] | inverted dropout on the candidate path |

pub mod dropout;
pub mod layer_norm;
pub mod linear;

pub use dropout::recurrent_dropout;
pub use layer_norm::{moments, LayerNorm, LayerNormConfig, LAYER_NORM_EPSILON};
pub use linear::{SuperLinear, SuperLinearConfig};
