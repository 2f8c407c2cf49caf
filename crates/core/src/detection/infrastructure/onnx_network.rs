use std::fmt::Display;
use std::path::{Path, PathBuf};

use ndarray::{Array4, ArrayD};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::detection::domain::network::{Network, NetworkError};

/// CoreML on macOS, DirectML on Windows, CPU elsewhere. Unavailable
/// providers fall back to CPU inside ort.
fn execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// A cascade network backed by an ONNX Runtime session.
pub struct OnnxNetwork {
    session: Session,
    path: PathBuf,
}

impl OnnxNetwork {
    /// Load an ONNX model with at most `intra_threads` operator threads.
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self, NetworkError> {
        let load_error = |e: &dyn Display| NetworkError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let session = Session::builder()
            .map_err(|e| load_error(&e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(&e))?
            .with_inter_threads(1)
            .map_err(|e| load_error(&e))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| load_error(&e))?
            .with_execution_providers(execution_providers())
            .map_err(|e| load_error(&e))?
            .commit_from_file(path)
            .map_err(|e| load_error(&e))?;
        log::debug!("loaded {}", path.display());
        Ok(Self {
            session,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Network for OnnxNetwork {
    fn forward(&mut self, input: Array4<f32>, outputs: &[&str]) -> Result<Vec<ArrayD<f32>>, NetworkError> {
        let tensor = Tensor::from_array(input).map_err(|e| NetworkError::Inference(e.to_string()))?;
        let results = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| NetworkError::Inference(e.to_string()))?;

        outputs
            .iter()
            .map(|&name| {
                let (_, value) = results
                    .iter()
                    .find(|(n, _)| *n == name)
                    .ok_or_else(|| NetworkError::MissingOutput(name.to_string()))?;
                let array = value
                    .try_extract_array::<f32>()
                    .map_err(|e| NetworkError::Inference(format!("{name}: {e}")))?;
                Ok(array.to_owned())
            })
            .collect()
    }
}
