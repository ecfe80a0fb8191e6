#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::tensor::Tensor;
    use supercell::cells::{HyperLstmCellConfig, LstmCellConfig};
    use supercell::error::CellError;
    use supercell::init::Initializer;
    use supercell::store::{ParamPath, ParamStore, Reuse, StoredParam};

    type Backend = NdArray<f32>;

    fn max_identity_error(gram: Tensor<Backend, 2>) -> f32 {
        let n = gram.dims()[0];
        let eye = Tensor::<Backend, 2>::eye(n, &gram.device());
        (gram - eye).abs().max().into_scalar()
    }

    #[test]
    fn test_orthogonal_parameters() {
        let device = Default::default();
        let mut store = ParamStore::<Backend>::seeded(&device, 11);
        let init = Initializer::Orthogonal { gain: 1.0 };

        for (name, rows, cols) in [("square", 16, 16), ("tall", 24, 8), ("wide", 8, 32)] {
            let w = store
                .matrix(&ParamPath::root(name), [rows, cols], init, Reuse::Auto)
                .unwrap()
                .val();
            let gram = if rows >= cols {
                w.clone().transpose().matmul(w)
            } else {
                w.clone().matmul(w.transpose())
            };
            let err = max_identity_error(gram);
            assert!(err < 1e-4, "{name}: max deviation {err}");
        }
    }

    #[test]
    fn test_seeded_stores_agree() {
        let device = Default::default();
        let path = ParamPath::root("w");
        let init = Initializer::Orthogonal { gain: 1.0 };

        let mut a = ParamStore::<Backend>::seeded(&device, 8);
        let mut b = ParamStore::<Backend>::seeded(&device, 8);
        let wa = a.matrix(&path, [6, 6], init, Reuse::Auto).unwrap().val();
        let wb = b.matrix(&path, [6, 6], init, Reuse::Auto).unwrap().val();

        let diff: f32 = (wa - wb).abs().max().into_scalar();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn test_strict_reuse_needs_existing() {
        let device = Default::default();
        let mut store = ParamStore::<Backend>::seeded(&device, 8);
        let path = ParamPath::root("cell").child("bias");

        assert!(matches!(
            store.vector(&path, 4, Initializer::Zeros, Reuse::Existing),
            Err(CellError::MissingParam(_))
        ));
        store.vector(&path, 4, Initializer::Zeros, Reuse::Auto).unwrap();
        assert!(store
            .vector(&path, 4, Initializer::Zeros, Reuse::Existing)
            .is_ok());
        assert!(matches!(
            store.vector(&path, 5, Initializer::Zeros, Reuse::Existing),
            Err(CellError::ParamShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_cells_in_distinct_scopes() {
        let device = Default::default();
        let mut store = ParamStore::<Backend>::seeded(&device, 8);
        let layer1 = ParamPath::root("layer1");
        let layer2 = ParamPath::root("layer2");

        LstmCellConfig::new(8).bind(&mut store, &layer1, 4).unwrap();
        HyperLstmCellConfig::new(8)
            .with_hyper_num_units(4)
            .bind(&mut store, &layer2, 8)
            .unwrap();

        assert_eq!(store.paths_under(&layer1).len(), 3);
        assert!(store
            .paths_under(&layer2)
            .iter()
            .all(|p| p.starts_with(&layer2)));
        assert!(store.contains(&layer2.child("hyper_cell").child("W_xh")));

        match store.get(&layer2.child("hyper_cell").child("W_xh")) {
            Some(StoredParam::Matrix(w)) => assert_eq!(w.val().dims(), [8 + 8, 16]),
            other => panic!("unexpected entry: {:?}", other.map(|p| p.dims())),
        }
    }

    #[test]
    fn test_path_display() {
        let path = ParamPath::root("HyperLSTMCell").child("hyper_ix").child("zw");
        assert_eq!(path.to_string(), "HyperLSTMCell/hyper_ix/zw");
        assert_eq!(path.name(), "zw");
    }
}
