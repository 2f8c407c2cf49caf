use crate::shared::frame::Frame;

use super::window::Face;

pub type DetectionError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for per-tile face detection.
///
/// Each tile owns its detector, so implementations may keep history
/// between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    /// Full detection with no temporal state.
    fn detect(&mut self, tile: &Frame) -> Result<Vec<Face>, DetectionError>;

    /// Detection on key frames, tracking and smoothing on every frame.
    fn detect_track(&mut self, tile: &Frame) -> Result<Vec<Face>, DetectionError>;
}
