use std::path::Path;

use crate::media::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Encodes BGR frames with the `image` crate.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut rgb = frame.data().to_vec();
        for px in rgb.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), rgb)
            .ok_or("Frame data does not match its dimensions")?;
        img.save(path)?;
        Ok(())
    }
}
