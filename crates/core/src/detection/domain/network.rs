use std::path::PathBuf;

use ndarray::{Array4, ArrayD, Ix4};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("failed to load model {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model has no output named `{0}`")]
    MissingOutput(String),
    #[error("output `{name}` has shape {shape:?}, expected a [1, C, H, W] map")]
    Shape { name: String, shape: Vec<usize> },
    #[error("output `{name}` has {actual} values, expected at least {expected}")]
    ShortOutput {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// A feed-forward network with named outputs.
///
/// `input` is a `[1, 3, H, W]` BGR tensor with the network mean already
/// subtracted. Outputs come back in the order `outputs` names them.
pub trait Network: Send {
    fn forward(&mut self, input: Array4<f32>, outputs: &[&str]) -> Result<Vec<ArrayD<f32>>, NetworkError>;
}

/// Flatten an output and require at least `expected` values.
pub fn flat_output(tensor: &ArrayD<f32>, name: &str, expected: usize) -> Result<Vec<f32>, NetworkError> {
    let values: Vec<f32> = tensor.iter().copied().collect();
    if values.len() < expected {
        return Err(NetworkError::ShortOutput {
            name: name.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// View a dense score/regression output as `[1, C, H, W]` with at least
/// `channels` channels.
pub fn map_output(tensor: ArrayD<f32>, name: &str, channels: usize) -> Result<Array4<f32>, NetworkError> {
    let shape = tensor.shape().to_vec();
    let map = tensor
        .into_dimensionality::<Ix4>()
        .map_err(|_| NetworkError::Shape {
            name: name.to_string(),
            shape: shape.clone(),
        })?;
    if map.shape()[0] < 1 || map.shape()[1] < channels {
        return Err(NetworkError::Shape {
            name: name.to_string(),
            shape,
        });
    }
    Ok(map)
}
