//! Recurrent dropout without memory loss (Semeniuta et al., 2016).
//!
//! The mask is applied to the candidate update only, never to the carried
//! memory. Unlike [`burn::nn::Dropout`] it is active on every backend as
//! soon as the owning cell enables it.

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

/// Inverted dropout: zero each entry with probability `1 - keep_prob` and
/// rescale the survivors by `1 / keep_prob`.
pub fn recurrent_dropout<B: Backend>(candidate: Tensor<B, 2>, keep_prob: f64) -> Tensor<B, 2> {
    if keep_prob >= 1.0 {
        return candidate;
    }
    let mask = Tensor::<B, 2>::random(
        candidate.shape(),
        Distribution::Bernoulli(keep_prob),
        &candidate.device(),
    );
    (candidate * mask).div_scalar(keep_prob)
}
