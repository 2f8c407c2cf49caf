use crate::blurring::domain::face_obscurer::FaceObscurer;
use crate::imaging::affine::AffineTransform;
use crate::shared::constants::DRAW_OVER_BGR;
use crate::shared::frame::Frame;

/// Covers the face with a flat colour.
pub struct FillObscurer {
    colour: [u8; 3],
}

impl FillObscurer {
    pub fn new(colour: [u8; 3]) -> Self {
        Self { colour }
    }
}

impl Default for FillObscurer {
    fn default() -> Self {
        Self::new(DRAW_OVER_BGR)
    }
}

impl FaceObscurer for FillObscurer {
    fn render(&self, _roi: &Frame, _to_square: &AffineTransform, size: usize) -> Option<Frame> {
        (size > 0).then(|| Frame::filled(size as u32, size as u32, self.colour))
    }
}
