use nalgebra::{Matrix3, Vector3};

use crate::shared::frame::Frame;
use crate::shared::geometry::Point;

use super::remap::{sample_bilinear, BorderMode};

/// A 2D affine map held as a homogeneous 3×3 matrix (last row `0 0 1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// The unique affine map sending each `src[i]` onto `dst[i]`.
    ///
    /// Returns `None` when the source points are collinear.
    pub fn from_triangles(src: [(f64, f64); 3], dst: [(f64, f64); 3]) -> Option<Self> {
        let points = Matrix3::new(
            src[0].0, src[1].0, src[2].0, //
            src[0].1, src[1].1, src[2].1, //
            1.0, 1.0, 1.0,
        );
        let targets = Matrix3::new(
            dst[0].0, dst[1].0, dst[2].0, //
            dst[0].1, dst[1].1, dst[2].1, //
            1.0, 1.0, 1.0,
        );
        let inv = points.try_inverse()?;
        Some(Self {
            matrix: targets * inv,
        })
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.matrix * Vector3::new(x, y, 1.0);
        (p.x, p.y)
    }
}

/// Map the first three of four square corners (see
/// [`crate::shared::geometry::rotated_quad`] for the order) onto an upright
/// `size` × `size` square.
pub fn square_from_corners(corners: &[(f64, f64); 4], size: usize) -> Option<AffineTransform> {
    let last = size as f64 - 1.0;
    AffineTransform::from_triangles(
        [corners[0], corners[1], corners[2]],
        [(0.0, 0.0), (0.0, last), (last, last)],
    )
}

/// [`square_from_corners`] for integer corners shifted by `-origin`.
pub fn square_from_quad(quad: &[Point; 4], origin: (i32, i32), size: usize) -> Option<AffineTransform> {
    let corners = quad.map(|p| ((p.x - origin.0) as f64, (p.y - origin.1) as f64));
    square_from_corners(&corners, size)
}

/// Warp `src` through `transform` (source → destination) into a new
/// `width` × `height` frame. Unsampled pixels stay black.
pub fn warp_affine(
    src: &Frame,
    transform: &AffineTransform,
    width: usize,
    height: usize,
    border: BorderMode,
) -> Option<Frame> {
    let inverse = transform.inverse()?;
    let mut dst = Frame::filled(width as u32, height as u32, [0, 0, 0]);
    warp_affine_inverse_into(src, &inverse, &mut dst, border);
    Some(dst)
}

/// For every pixel `p` of `dst`, sample `src` at `inverse(p)`.
/// With [`BorderMode::Transparent`] pixels mapping outside `src` are left as they were.
pub fn warp_affine_inverse_into(
    src: &Frame,
    inverse: &AffineTransform,
    dst: &mut Frame,
    border: BorderMode,
) {
    for y in 0..dst.height() as usize {
        for x in 0..dst.width() as usize {
            let (sx, sy) = inverse.apply(x as f64, y as f64);
            if let Some(px) = sample_bilinear(src, sx, sy, border) {
                dst.pixel_mut(x, y).copy_from_slice(&px);
            }
        }
    }
}
