#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, Tensor};
    use supercell::cells::{LstmCell, LstmCellConfig, LstmState, RecurrentCell, StateLayout};
    use supercell::error::CellError;
    use supercell::init::Initializer;
    use supercell::store::{ParamPath, ParamStore};

    type Backend = NdArray<f32>;

    fn to_vec(tensor: Tensor<Backend, 2>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    fn create_test_cell(config: LstmCellConfig, input_size: usize) -> LstmCell<Backend> {
        let device = Default::default();
        let mut store = ParamStore::seeded(&device, 4321);
        config
            .bind(&mut store, &ParamPath::root("LSTMCell"), input_size)
            .unwrap()
    }

    #[test]
    fn test_zero_weights_hand_computed() {
        let device = Default::default();
        let cell = create_test_cell(
            LstmCellConfig::new(1)
                .with_input_init(Initializer::Zeros)
                .with_hidden_init(Initializer::Zeros),
            1,
        );

        let input = Tensor::<Backend, 2>::zeros([1, 1], &device);
        let state = Tensor::<Backend, 2>::zeros([1, 2], &device);
        let (output, new_state) = cell.step(input, state).unwrap();

        // i = j = f = o = 0, so g = 0, c' = 0 * sigmoid(1) + sigmoid(0) * 0 = 0
        // and h' = tanh(0) * sigmoid(0) = 0
        assert_eq!(to_vec(output), vec![0.0]);
        assert_eq!(to_vec(new_state), vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_weights_with_memory() {
        let device = Default::default();
        let cell = create_test_cell(
            LstmCellConfig::new(1)
                .with_input_init(Initializer::Zeros)
                .with_hidden_init(Initializer::Zeros),
            1,
        );

        let input = Tensor::<Backend, 2>::ones([1, 1], &device);
        let state = Tensor::<Backend, 2>::from_floats([[2.0, 0.5]], &device);
        let (output, new_state) = cell.step(input, state).unwrap();

        let sigmoid = |x: f32| 1.0 / (1.0 + (-x).exp());
        let c = 2.0 * sigmoid(1.0);
        let h = c.tanh() * sigmoid(0.0);

        let new_state = to_vec(new_state);
        assert!((new_state[0] - c).abs() < 1e-6);
        assert!((new_state[1] - h).abs() < 1e-6);
        assert!((to_vec(output)[0] - h).abs() < 1e-6);
    }

    #[test]
    fn test_step_is_deterministic_without_dropout() {
        let device = Default::default();
        let cell = create_test_cell(LstmCellConfig::new(16), 8);

        let input = Tensor::<Backend, 2>::random([4, 8], Distribution::Uniform(-1.0, 1.0), &device);
        let state = Tensor::<Backend, 2>::random([4, 32], Distribution::Uniform(-1.0, 1.0), &device);

        let (out_a, state_a) = cell.step(input.clone(), state.clone()).unwrap();
        let (out_b, state_b) = cell.step(input, state).unwrap();

        assert_eq!(to_vec(out_a), to_vec(out_b));
        assert_eq!(to_vec(state_a), to_vec(state_b));
    }

    #[test]
    fn test_recurrent_dropout_is_stochastic() {
        let device = Default::default();
        let cell = create_test_cell(
            LstmCellConfig::new(64)
                .with_use_recurrent_dropout(true)
                .with_dropout_keep_prob(0.5),
            8,
        );

        let input = Tensor::<Backend, 2>::random([4, 8], Distribution::Uniform(-1.0, 1.0), &device);
        let state = cell.zero_state(4, &device);

        let (_, state_a) = cell.step(input.clone(), state.clone()).unwrap();
        let (_, state_b) = cell.step(input, state).unwrap();

        assert_ne!(to_vec(state_a), to_vec(state_b));
    }

    #[test]
    fn test_dropout_with_keep_one_is_deterministic() {
        let device = Default::default();
        let cell = create_test_cell(
            LstmCellConfig::new(16)
                .with_use_recurrent_dropout(true)
                .with_dropout_keep_prob(1.0),
            8,
        );

        let input = Tensor::<Backend, 2>::random([2, 8], Distribution::Uniform(-1.0, 1.0), &device);
        let state = cell.zero_state(2, &device);

        let (_, state_a) = cell.step(input.clone(), state.clone()).unwrap();
        let (_, state_b) = cell.step(input, state).unwrap();
        assert_eq!(to_vec(state_a), to_vec(state_b));
    }

    #[test]
    fn test_binding_same_scope_shares_weights() {
        let device = Default::default();
        let mut store = ParamStore::<Backend>::seeded(&device, 5);
        let scope = ParamPath::root("shared");

        let first = LstmCellConfig::new(12).bind(&mut store, &scope, 6).unwrap();
        let second = LstmCellConfig::new(12).bind(&mut store, &scope, 6).unwrap();
        assert_eq!(store.len(), 3);

        let input = Tensor::<Backend, 2>::random([3, 6], Distribution::Uniform(-1.0, 1.0), &device);
        let state = first.zero_state(3, &device);
        let (a, _) = first.step(input.clone(), state.clone()).unwrap();
        let (b, _) = second.step(input, state).unwrap();
        assert_eq!(to_vec(a), to_vec(b));
    }

    #[test]
    fn test_rebinding_with_other_width_fails() {
        let device = Default::default();
        let mut store = ParamStore::<Backend>::seeded(&device, 5);
        let scope = ParamPath::root("shared");

        LstmCellConfig::new(12).bind(&mut store, &scope, 6).unwrap();
        let err = LstmCellConfig::new(12).bind(&mut store, &scope, 7).unwrap_err();
        assert!(matches!(err, CellError::ParamShapeMismatch { .. }));
    }

    #[test]
    fn test_typed_and_packed_steps_agree() {
        let device = Default::default();
        let cell = create_test_cell(LstmCellConfig::new(10), 5);

        let memory = Tensor::<Backend, 2>::random([2, 10], Distribution::Uniform(-1.0, 1.0), &device);
        let hidden = Tensor::<Backend, 2>::random([2, 10], Distribution::Uniform(-1.0, 1.0), &device);
        let input = Tensor::<Backend, 2>::random([2, 5], Distribution::Uniform(-1.0, 1.0), &device);

        let state = LstmState::new(memory, hidden);
        let packed = state.clone().pack(StateLayout::MemoryFirst);

        let (out_typed, state_typed) = cell.step_state(input.clone(), state).unwrap();
        let (out_packed, state_packed) = cell.step(input, packed).unwrap();

        assert_eq!(to_vec(out_typed), to_vec(out_packed));
        assert_eq!(
            to_vec(state_typed.pack(StateLayout::MemoryFirst)),
            to_vec(state_packed)
        );
    }

    #[test]
    fn test_unknown_initializer_name() {
        assert!(matches!(
            Initializer::from_name("xavier", 0.1),
            Err(CellError::UnknownInitializer(_))
        ));
    }

    #[test]
    fn test_batch_mismatch_is_an_error() {
        let device = Default::default();
        let cell = create_test_cell(LstmCellConfig::new(6), 3);

        let input = Tensor::<Backend, 2>::zeros([2, 3], &device);
        let state = Tensor::<Backend, 2>::zeros([3, 12], &device);
        assert!(matches!(
            cell.step(input, state),
            Err(CellError::ShapeMismatch { expected: 2, actual: 3, .. })
        ));
    }
}
