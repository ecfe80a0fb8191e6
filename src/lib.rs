//! # Supercell - LSTM cell variants (Rust)
//!
//! Recurrent cells for sequence models built on the Burn framework.
//!
//! ## Features
//!
//! - **LSTM**: orthogonally initialized LSTM with recurrent dropout without memory loss
//! - **LayerNorm LSTM**: layer normalization on every gate and on the new memory
//! - **HyperLSTM**: a small hyper LSTM that rescales the main cell's gates each step
//! - **Orthogonal init**: SVD-based initializer for arbitrary-rank shapes
//! - **Parameter store**: scoped, get-or-create weights shared across bindings
//!
//! ## Quick Start
//!
//! ```rust
//! use supercell::prelude::*;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = Default::default();
//! let mut store = ParamStore::<Backend>::seeded(&device, 42);
//! let cell = HyperLstmCellConfig::new(32)
//!     .with_hyper_num_units(8)
//!     .bind(&mut store, &ParamPath::root("HyperLSTMCell"), 16)
//!     .unwrap();
//!
//! let input = Tensor::<Backend, 2>::zeros([4, 16], &device);
//! let state = cell.zero_state(4, &device);
//! let (output, state) = cell.step(input, state).unwrap();
//!
//! assert_eq!(output.dims(), [4, 32]);
//! assert_eq!(state.dims(), [4, 2 * (32 + 8)]);
//! ```
//!
//! ## Sequence-level Usage
//!
//! For whole sequences, wrap any cell in [`rnn::Rnn`]:
//!
//! ```ignore
//! use supercell::prelude::*;
//!
//! let rnn = Rnn::new(cell).with_return_sequences(false);
//! let (last, state) = rnn.forward(sequence, None)?;
//! ```

pub mod cells;
pub mod error;
pub mod init;
pub mod nn;
pub mod rnn;
pub mod store;

pub mod prelude {
    pub use crate::cells::{
        HyperLstmCell, HyperLstmCellConfig, HyperLstmState, LayerNormLstmCell,
        LayerNormLstmCellConfig, LstmCell, LstmCellConfig, LstmState, RecurrentCell, StateLayout,
    };
    pub use crate::error::{CellError, Result};
    pub use crate::init::Initializer;
    pub use crate::nn::{SuperLinear, SuperLinearConfig};
    pub use crate::rnn::Rnn;
    pub use crate::store::{ParamPath, ParamStore, Reuse};
}
