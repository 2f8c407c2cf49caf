use std::path::Path;

use crate::shared::frame::Frame;

/// Writes a BGR frame to an image file.
pub trait ImageWriter: Send {
    /// The file format follows the extension of `path`.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
