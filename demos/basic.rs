//! Basic usage example of the supercell LSTM variants
//!
//! This example builds each cell type against one parameter store and
//! unrolls them over a random batch of sequences.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use supercell::prelude::*;

type Backend = NdArray<f32>;

fn main() -> Result<()> {
    println!("=== Supercell Basic Example ===\n");

    let device = Default::default();
    let mut store = ParamStore::<Backend>::seeded(&device, 42);

    // Input shape: [batch=4, seq=10, features=20]
    let input = Tensor::<Backend, 3>::random([4, 10, 20], Distribution::Uniform(-1.0, 1.0), &device);

    // Example 1: Plain LSTM with recurrent dropout
    println!("Example 1: LSTM cell");
    let lstm = LstmCellConfig::new(50)
        .with_use_recurrent_dropout(true)
        .with_dropout_keep_prob(0.9)
        .bind(&mut store, &ParamPath::root("LSTMCell"), 20)?;
    let (output, state) = Rnn::new(lstm).forward(input.clone(), None)?;

    println!("  Input shape:  [4, 10, 20]");
    println!("  Output shape: {:?}", output.dims());
    println!("  State shape:  {:?}  ([c, h])", state.dims());
    println!();

    // Example 2: Layer-normalized LSTM, last timestep only
    println!("Example 2: LayerNorm LSTM cell");
    let ln_lstm = LayerNormLstmCellConfig::new(32).bind(
        &mut store,
        &ParamPath::root("LayerNormLSTMCell"),
        20,
    )?;
    let rnn = Rnn::new(ln_lstm).with_return_sequences(false);
    let (output, state) = rnn.forward(input.clone(), None)?;

    println!("  Output shape: {:?}", output.dims());
    println!("  State shape:  {:?}  ([h, c])", state.dims());
    println!();

    // Example 3: HyperLSTM, continuing the state across two chunks
    println!("Example 3: HyperLSTM cell");
    let hyper = HyperLstmCellConfig::new(64)
        .with_hyper_num_units(16)
        .with_hyper_embedding_size(4)
        .bind(&mut store, &ParamPath::root("HyperLSTMCell"), 20)?;
    let rnn = Rnn::new(hyper);

    let (_, state) = rnn.forward(input.clone().narrow(1, 0, 5), None)?;
    let (output, state) = rnn.forward(input.narrow(1, 5, 5), Some(state))?;

    println!("  Output shape: {:?}", output.dims());
    println!("  State shape:  {:?}  ([h, h_hyper, c, c_hyper])", state.dims());
    println!();

    println!("Parameter store:");
    println!("  Tensors:    {}", store.len());
    println!("  Parameters: {}", store.num_params());
    for path in store.paths_under(&ParamPath::root("LSTMCell")) {
        println!("  {}", path);
    }
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
