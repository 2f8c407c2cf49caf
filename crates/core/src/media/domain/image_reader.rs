use std::path::Path;

use crate::shared::frame::Frame;

/// Reads a still image into a BGR frame.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
