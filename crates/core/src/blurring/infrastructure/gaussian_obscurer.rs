use std::cell::RefCell;

use crate::blurring::domain::face_obscurer::FaceObscurer;
use crate::imaging::affine::{warp_affine, AffineTransform};
use crate::imaging::remap::BorderMode;
use crate::shared::constants::{OBSCURE_KERNEL_SIZE, OBSCURE_SIGMA};
use crate::shared::frame::Frame;

use super::gaussian;

/// Straightens the face into an upright square and blurs it.
pub struct GaussianObscurer {
    kernel: Vec<f32>,
    blur_temp: RefCell<Vec<f32>>,
}

impl GaussianObscurer {
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size | 1, sigma),
            blur_temp: RefCell::new(Vec::new()),
        }
    }
}

impl Default for GaussianObscurer {
    fn default() -> Self {
        Self::new(OBSCURE_KERNEL_SIZE, OBSCURE_SIGMA)
    }
}

impl FaceObscurer for GaussianObscurer {
    fn render(&self, roi: &Frame, to_square: &AffineTransform, size: usize) -> Option<Frame> {
        if roi.is_empty() || size == 0 {
            return None;
        }
        let mut patch = warp_affine(roi, to_square, size, size, BorderMode::Constant([0, 0, 0]))?;
        gaussian::blur_frame(&mut patch, &self.kernel, &mut self.blur_temp.borrow_mut());
        Some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> Frame {
        let mut frame = Frame::filled(size, size, [0, 0, 0]);
        for y in 0..size as usize {
            for x in 0..size as usize {
                if (x / 2 + y / 2) % 2 == 0 {
                    frame.pixel_mut(x, y).copy_from_slice(&[255, 255, 255]);
                }
            }
        }
        frame
    }

    fn contrast(frame: &Frame) -> u8 {
        let values: Vec<u8> = frame.data().iter().step_by(3).copied().collect();
        values.iter().max().unwrap() - values.iter().min().unwrap()
    }

    #[test]
    fn test_blur_flattens_detail() {
        let roi = checkerboard(40);
        let obscurer = GaussianObscurer::default();
        let patch = obscurer.render(&roi, &AffineTransform::identity(), 40).unwrap();
        assert_eq!((patch.width(), patch.height()), (40, 40));
        assert!(contrast(&patch) < 60, "contrast {}", contrast(&patch));
    }

    #[test]
    fn test_uniform_region_stays_uniform() {
        let roi = Frame::filled(32, 32, [50, 100, 150]);
        let patch = GaussianObscurer::default()
            .render(&roi, &AffineTransform::identity(), 32)
            .unwrap();
        assert_eq!(patch.pixel(16, 16), &[50, 100, 150]);
    }

    #[test]
    fn test_empty_roi_renders_nothing() {
        let roi = Frame::filled(0, 0, [0, 0, 0]);
        assert!(GaussianObscurer::default()
            .render(&roi, &AffineTransform::identity(), 10)
            .is_none());
    }
}
