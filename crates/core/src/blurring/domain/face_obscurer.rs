use serde::{Deserialize, Serialize};

use crate::imaging::affine::AffineTransform;
use crate::shared::frame::Frame;

/// How a detected face is hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObscureMode {
    /// Gaussian blur of the face's own pixels.
    #[default]
    Blur,
    /// A flat grey square.
    DrawOver,
}

/// Domain interface for producing the upright patch that replaces a face.
///
/// `roi` is the axis-aligned region around the rotated face and `to_square`
/// maps it onto the `size` × `size` upright square the patch covers. The
/// compositor warps the returned patch back over the face.
pub trait FaceObscurer: Send {
    fn render(&self, roi: &Frame, to_square: &AffineTransform, size: usize) -> Option<Frame>;
}
