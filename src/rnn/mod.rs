//! # Sequence Processing
//!
//! [`Rnn`] unrolls any [`RecurrentCell`] over a `[batch, seq_len, features]`
//! tensor, threading the packed state from one step to the next. The cell
//! itself stays stateless; the final state is handed back so callers can
//! continue a sequence across batches.
//!
//! ```ignore
//! use supercell::prelude::*;
//!
//! let mut store = ParamStore::<Backend>::seeded(&device, 7);
//! let cell = HyperLstmCellConfig::new(64)
//!     .with_hyper_num_units(16)
//!     .bind(&mut store, &ParamPath::root("HyperLSTMCell"), 32)?;
//! let rnn = Rnn::new(cell);
//!
//! let (output, state) = rnn.forward(batch1, None)?;        // [4, 10, 64]
//! let (output, state) = rnn.forward(batch2, Some(state))?; // continues
//! ```
//!
//! ## Tensor Shapes
//!
//! | Setting | Input | Output |
//! |---------|-------|--------|
//! | `batch_first=true` (default) | `[batch, seq_len, features]` | `[batch, seq_len, output_size]` |
//! | `batch_first=false` | `[seq_len, batch, features]` | `[batch, seq_len, output_size]` |
//! | `return_sequences=false` | either | `[batch, 1, output_size]` |
//!
//! The state is always `[batch, cell.state_size()]`.

use crate::cells::RecurrentCell;
use crate::error::{CellError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Unrolls a cell over the time axis.
#[derive(Debug, Clone)]
pub struct Rnn<C> {
    cell: C,
    batch_first: bool,
    return_sequences: bool,
}

impl<C> Rnn<C> {
    pub fn new(cell: C) -> Self {
        Self {
            cell,
            batch_first: true,
            return_sequences: true,
        }
    }

    /// Set whether input is batch-first (default: true)
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    /// Set whether to return full sequences (default: true)
    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn cell(&self) -> &C {
        &self.cell
    }

    pub fn into_cell(self) -> C {
        self.cell
    }
}

impl<C> Rnn<C> {
    /// Run the cell over every time step.
    ///
    /// # Arguments
    /// * `input` - Input tensor, layout set by `batch_first`
    /// * `state` - Optional initial packed state `[batch, state_size]`;
    ///   zeros when `None`
    ///
    /// # Returns
    /// Tuple of (output, final_state)
    pub fn forward<B: Backend>(
        &self,
        input: Tensor<B, 3>,
        state: Option<Tensor<B, 2>>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 2>)>
    where
        C: RecurrentCell<B>,
    {
        let device = input.device();
        let [d0, d1, features] = input.dims();
        let (batch_size, seq_len) = if self.batch_first { (d0, d1) } else { (d1, d0) };
        let time_axis = if self.batch_first { 1 } else { 0 };

        if seq_len == 0 {
            return Err(CellError::invalid("cannot unroll an empty sequence"));
        }

        let mut current_state =
            state.unwrap_or_else(|| self.cell.zero_state(batch_size, &device));

        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let step_input = input
                .clone()
                .narrow(time_axis, t, 1)
                .reshape([batch_size, features]);

            let (output, new_state) = self.cell.step(step_input, current_state)?;
            current_state = new_state;

            if self.return_sequences || t == seq_len - 1 {
                outputs.push(output);
            }
        }

        Ok((Tensor::stack(outputs, 1), current_state))
    }
}
