//! Typed recurrent state and its flat packing
//!
//! Cells exchange state with their callers as a single `[batch, width]`
//! tensor. Internally the halves are kept as named fields and converted
//! with explicit `pack` / `unpack` calls.
//!
//! Packing order:
//!
//! | Type | [`StateLayout::MemoryFirst`] | [`StateLayout::HiddenFirst`] |
//! |------|------------------------------|------------------------------|
//! | [`LstmState`] | `[c, h]` | `[h, c]` |
//! | [`HyperLstmState`] | `[c, c_hyper, h, h_hyper]` | `[h, h_hyper, c, c_hyper]` |

use crate::error::{CellError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Which half of a packed state comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateLayout {
    /// `[memory, hidden]`, used by [`LstmCell`](crate::cells::LstmCell).
    MemoryFirst,
    /// `[hidden, memory]`, used by [`LayerNormLstmCell`](crate::cells::LayerNormLstmCell)
    /// and [`HyperLstmCell`](crate::cells::HyperLstmCell).
    HiddenFirst,
}

impl StateLayout {
    fn order<T>(self, memory: T, hidden: T) -> [T; 2] {
        match self {
            StateLayout::MemoryFirst => [memory, hidden],
            StateLayout::HiddenFirst => [hidden, memory],
        }
    }

    /// Split a packed tensor into `(memory, hidden)` halves of `half` columns.
    fn split<B: Backend>(self, state: Tensor<B, 2>, half: usize) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let first = state.clone().narrow(1, 0, half);
        let second = state.narrow(1, half, half);
        match self {
            StateLayout::MemoryFirst => (first, second),
            StateLayout::HiddenFirst => (second, first),
        }
    }
}

fn check_state_width<B: Backend>(state: &Tensor<B, 2>, expected: usize) -> Result<()> {
    let actual = state.dims()[1];
    if actual != expected {
        return Err(CellError::shape("state", expected, actual));
    }
    Ok(())
}

/// Memory and hidden output of one LSTM-style cell.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    /// Cell memory `c`, `[batch, units]`.
    pub memory: Tensor<B, 2>,
    /// Hidden output `h`, `[batch, units]`.
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn new(memory: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Self {
        Self { memory, hidden }
    }

    pub fn zeros(batch_size: usize, units: usize, device: &B::Device) -> Self {
        Self {
            memory: Tensor::zeros([batch_size, units], device),
            hidden: Tensor::zeros([batch_size, units], device),
        }
    }

    pub fn units(&self) -> usize {
        self.hidden.dims()[1]
    }

    pub fn pack(self, layout: StateLayout) -> Tensor<B, 2> {
        Tensor::cat(Vec::from(layout.order(self.memory, self.hidden)), 1)
    }

    /// Inverse of [`pack`](Self::pack); fails unless `state` is exactly
    /// `2 * units` wide.
    pub fn unpack(state: Tensor<B, 2>, units: usize, layout: StateLayout) -> Result<Self> {
        check_state_width(&state, 2 * units)?;
        let (memory, hidden) = layout.split(state, units);
        Ok(Self { memory, hidden })
    }
}

/// State of a [`HyperLstmCell`](crate::cells::HyperLstmCell): the main
/// cell's pair plus the pair owned by its hyper sub-cell.
#[derive(Debug, Clone)]
pub struct HyperLstmState<B: Backend> {
    pub outer: LstmState<B>,
    pub hyper: LstmState<B>,
}

impl<B: Backend> HyperLstmState<B> {
    pub fn new(outer: LstmState<B>, hyper: LstmState<B>) -> Self {
        Self { outer, hyper }
    }

    pub fn zeros(batch_size: usize, units: usize, hyper_units: usize, device: &B::Device) -> Self {
        Self {
            outer: LstmState::zeros(batch_size, units, device),
            hyper: LstmState::zeros(batch_size, hyper_units, device),
        }
    }

    /// Concatenate `(outer, hyper)` memories and hiddens, then order the two
    /// blocks by `layout`.
    pub fn pack(self, layout: StateLayout) -> Tensor<B, 2> {
        let memory = Tensor::cat(vec![self.outer.memory, self.hyper.memory], 1);
        let hidden = Tensor::cat(vec![self.outer.hidden, self.hyper.hidden], 1);
        Tensor::cat(Vec::from(layout.order(memory, hidden)), 1)
    }

    pub fn unpack(
        state: Tensor<B, 2>,
        units: usize,
        hyper_units: usize,
        layout: StateLayout,
    ) -> Result<Self> {
        let total = units + hyper_units;
        check_state_width(&state, 2 * total)?;
        let (memory, hidden) = layout.split(state, total);

        let outer = LstmState {
            memory: memory.clone().narrow(1, 0, units),
            hidden: hidden.clone().narrow(1, 0, units),
        };
        let hyper = LstmState {
            memory: memory.narrow(1, units, hyper_units),
            hidden: hidden.narrow(1, units, hyper_units),
        };
        Ok(Self { outer, hyper })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn row(values: &[f32]) -> Tensor<TestBackend, 2> {
        Tensor::<TestBackend, 1>::from_floats(values, &Default::default()).reshape([1, values.len()])
    }

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_memory_first_layout() {
        let state = LstmState::new(row(&[1.0, 2.0]), row(&[3.0, 4.0]));
        let packed = state.pack(StateLayout::MemoryFirst);
        assert_eq!(values(packed.clone()), vec![1.0, 2.0, 3.0, 4.0]);

        let back = LstmState::unpack(packed, 2, StateLayout::MemoryFirst).unwrap();
        assert_eq!(values(back.memory), vec![1.0, 2.0]);
        assert_eq!(values(back.hidden), vec![3.0, 4.0]);
    }

    #[test]
    fn test_hidden_first_layout() {
        let state = LstmState::new(row(&[1.0, 2.0]), row(&[3.0, 4.0]));
        let packed = state.pack(StateLayout::HiddenFirst);
        assert_eq!(values(packed.clone()), vec![3.0, 4.0, 1.0, 2.0]);

        let back = LstmState::unpack(packed, 2, StateLayout::HiddenFirst).unwrap();
        assert_eq!(values(back.memory), vec![1.0, 2.0]);
        assert_eq!(values(back.hidden), vec![3.0, 4.0]);
    }

    #[test]
    fn test_hyper_layout() {
        let state = HyperLstmState::new(
            LstmState::new(row(&[1.0, 2.0]), row(&[3.0, 4.0])),
            LstmState::new(row(&[5.0]), row(&[6.0])),
        );
        let packed = state.clone().pack(StateLayout::HiddenFirst);
        assert_eq!(values(packed.clone()), vec![3.0, 4.0, 6.0, 1.0, 2.0, 5.0]);

        let back = HyperLstmState::unpack(packed, 2, 1, StateLayout::HiddenFirst).unwrap();
        assert_eq!(values(back.outer.memory), vec![1.0, 2.0]);
        assert_eq!(values(back.outer.hidden), vec![3.0, 4.0]);
        assert_eq!(values(back.hyper.memory), vec![5.0]);
        assert_eq!(values(back.hyper.hidden), vec![6.0]);

        let packed = state.pack(StateLayout::MemoryFirst);
        assert_eq!(values(packed), vec![1.0, 2.0, 5.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_unpack_rejects_wrong_width() {
        let err = LstmState::unpack(row(&[0.0; 5]), 2, StateLayout::MemoryFirst).unwrap_err();
        assert!(matches!(
            err,
            CellError::ShapeMismatch {
                expected: 4,
                actual: 5,
                ..
            }
        ));
        assert!(HyperLstmState::unpack(row(&[0.0; 6]), 2, 2, StateLayout::HiddenFirst).is_err());
    }
}
