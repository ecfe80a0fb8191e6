//! Named parameter store
//!
//! Every learned tensor lives in a [`ParamStore`] under a structured
//! [`ParamPath`]. The first request for a path creates the parameter; later
//! requests for the same path hand back the same [`Param`], which is how a
//! cell applied at successive time steps (or two cells bound under the same
//! scope) share one set of weights.

use crate::error::{CellError, Result};
use crate::init::Initializer;
use burn::module::Param;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Hierarchical parameter name, e.g. `HyperLSTMCell/hyper_ix/zw/super_linear_w`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamPath {
    segments: Vec<String>,
}

impl ParamPath {
    /// Path with a single top-level scope.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Nested scope (or leaf parameter name) below this path.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether `self` is `scope` or lies below it.
    pub fn starts_with(&self, scope: &ParamPath) -> bool {
        self.segments.starts_with(&scope.segments)
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// How a request treats a path that is not registered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reuse {
    /// Create on first access, reuse afterwards.
    #[default]
    Auto,
    /// The parameter must already exist.
    Existing,
}

impl From<bool> for Reuse {
    fn from(reuse: bool) -> Self {
        if reuse {
            Reuse::Existing
        } else {
            Reuse::Auto
        }
    }
}

/// A stored parameter of rank 1 or 2.
#[derive(Debug, Clone)]
pub enum StoredParam<B: Backend> {
    Vector(Param<Tensor<B, 1>>),
    Matrix(Param<Tensor<B, 2>>),
}

impl<B: Backend> StoredParam<B> {
    pub fn dims(&self) -> Vec<usize> {
        match self {
            StoredParam::Vector(p) => p.val().dims().to_vec(),
            StoredParam::Matrix(p) => p.val().dims().to_vec(),
        }
    }

    pub fn num_elements(&self) -> usize {
        self.dims().iter().product()
    }
}

/// Owner of all learned parameters, keyed by [`ParamPath`].
#[derive(Debug)]
pub struct ParamStore<B: Backend> {
    device: B::Device,
    rng: StdRng,
    params: HashMap<ParamPath, StoredParam<B>>,
}

impl<B: Backend> ParamStore<B> {
    /// Empty store whose initializers draw from OS entropy.
    pub fn new(device: &B::Device) -> Self {
        Self::with_rng(device, StdRng::from_entropy())
    }

    /// Empty store with a reproducible initializer stream.
    pub fn seeded(device: &B::Device, seed: u64) -> Self {
        Self::with_rng(device, StdRng::seed_from_u64(seed))
    }

    fn with_rng(device: &B::Device, rng: StdRng) -> Self {
        Self {
            device: device.clone(),
            rng,
            params: HashMap::new(),
        }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Get or create a rank-1 parameter of length `len`.
    pub fn vector(
        &mut self,
        path: &ParamPath,
        len: usize,
        init: Initializer,
        reuse: Reuse,
    ) -> Result<Param<Tensor<B, 1>>> {
        let shape = [len];
        if let Some(stored) = self.lookup(path, &shape, reuse)? {
            if let StoredParam::Vector(param) = stored {
                return Ok(param.clone());
            }
        }

        let tensor = init.init_tensor::<B, 1, _>(shape, &mut self.rng, &self.device)?;
        let param = Param::from_tensor(tensor);
        debug!(path = %path, shape = ?shape, init = ?init, "created parameter");
        self.params
            .insert(path.clone(), StoredParam::Vector(param.clone()));
        Ok(param)
    }

    /// Get or create a rank-2 parameter of shape `[rows, cols]`.
    pub fn matrix(
        &mut self,
        path: &ParamPath,
        shape: [usize; 2],
        init: Initializer,
        reuse: Reuse,
    ) -> Result<Param<Tensor<B, 2>>> {
        if let Some(stored) = self.lookup(path, &shape, reuse)? {
            if let StoredParam::Matrix(param) = stored {
                return Ok(param.clone());
            }
        }

        let tensor = init.init_tensor::<B, 2, _>(shape, &mut self.rng, &self.device)?;
        let param = Param::from_tensor(tensor);
        debug!(path = %path, shape = ?shape, init = ?init, "created parameter");
        self.params
            .insert(path.clone(), StoredParam::Matrix(param.clone()));
        Ok(param)
    }

    /// Existing entry under `path`, checked against `shape`.
    ///
    /// A shape match implies a rank match, so the caller's variant check
    /// cannot fall through once this returns `Some`.
    fn lookup(
        &self,
        path: &ParamPath,
        shape: &[usize],
        reuse: Reuse,
    ) -> Result<Option<&StoredParam<B>>> {
        match self.params.get(path) {
            Some(stored) => {
                let actual = stored.dims();
                if actual != shape {
                    return Err(CellError::ParamShapeMismatch {
                        path: path.to_string(),
                        expected: shape.to_vec(),
                        actual,
                    });
                }
                trace!(path = %path, "reusing parameter");
                Ok(Some(stored))
            }
            None if reuse == Reuse::Existing => Err(CellError::MissingParam(path.to_string())),
            None => Ok(None),
        }
    }

    pub fn get(&self, path: &ParamPath) -> Option<&StoredParam<B>> {
        self.params.get(path)
    }

    pub fn contains(&self, path: &ParamPath) -> bool {
        self.params.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// All registered paths in sorted order.
    pub fn paths(&self) -> Vec<&ParamPath> {
        let mut paths: Vec<_> = self.params.keys().collect();
        paths.sort();
        paths
    }

    /// Registered paths below `scope`, sorted.
    pub fn paths_under(&self, scope: &ParamPath) -> Vec<&ParamPath> {
        self.paths()
            .into_iter()
            .filter(|p| p.starts_with(scope))
            .collect()
    }

    /// Total number of scalar parameters.
    pub fn num_params(&self) -> usize {
        self.params.values().map(StoredParam::num_elements).sum()
    }
}
