use crate::detection::domain::network::{Network, NetworkError};
use crate::detection::domain::window::Window;
use crate::imaging::affine::{square_from_quad, warp_affine};
use crate::imaging::remap::BorderMode;
use crate::shared::constants::{
    ANGLE_RANGE, AUGMENT_SCALE, MIN_TRACKED_SIZE, TRACKING_INPUT_SIZE, TRACKING_OUTPUTS,
};
use crate::shared::frame::Frame;
use crate::shared::geometry::{deg_to_rad, rotate_point, rotated_quad, Point};

use super::cascade::read_outputs;
use super::tensor::to_input_tensor;

const LANDMARK_COUNT: usize = 14;

/// Re-localises windows from the previous frame with the tracking network.
pub struct Tracker {
    network: Box<dyn Network>,
}

impl Tracker {
    pub fn new(network: Box<dyn Network>) -> Self {
        Self { network }
    }

    /// Track every window into the current padded tile.
    ///
    /// A `threshold <= 0` keeps every track that stays inside the tile.
    pub fn track(
        &mut self,
        padded: &Frame,
        threshold: f32,
        windows: &[Window],
    ) -> Result<Vec<Window>, NetworkError> {
        let mut tracked = Vec::with_capacity(windows.len());
        for window in windows {
            if let Some(next) = self.track_one(padded, threshold, window)? {
                tracked.push(next);
            }
        }
        Ok(tracked)
    }

    fn track_one(
        &mut self,
        padded: &Frame,
        threshold: f32,
        window: &Window,
    ) -> Result<Option<Window>, NetworkError> {
        let size = window.size as f64;
        let crop_x = (window.x as f64 - AUGMENT_SCALE * size).floor() as i32;
        let crop_y = (window.y as f64 - AUGMENT_SCALE * size).floor() as i32;
        let crop_w = (size + 2.0 * AUGMENT_SCALE * size).ceil() as i32;
        let angle = window.angle.round();

        let last = (crop_w - 1) as f64;
        let (x1, y1) = (crop_x as f64, crop_y as f64);
        let quad = rotated_quad(x1, y1, x1 + last, y1 + last, angle);
        let Some(transform) = square_from_quad(&quad, (0, 0), TRACKING_INPUT_SIZE) else {
            return Ok(None);
        };
        let Some(crop) = warp_affine(
            padded,
            &transform,
            TRACKING_INPUT_SIZE,
            TRACKING_INPUT_SIZE,
            BorderMode::Constant([0, 0, 0]),
        ) else {
            return Ok(None);
        };

        let outputs = self.network.forward(to_input_tensor(&crop), &TRACKING_OUTPUTS)?;
        let [regression, prob, points, rotation] =
            read_outputs(&outputs, &TRACKING_OUTPUTS, [3, 2, 2 * LANDMARK_COUNT, 1])?;

        let score = prob[1];
        let (sn, xn, yn) = (regression[0] as f64, regression[1] as f64, regression[2] as f64);
        let cw = crop_w as f64;
        let theta = -deg_to_rad(angle);
        let (sin, cos) = theta.sin_cos();
        let w = (sn * cw).ceil() as i32;
        let x = (x1 - 0.5 * sn * cw + cw * sn * (xn * cos - yn * sin) + 0.5 * cw).floor() as i32;
        let y = (y1 - 0.5 * sn * cw + cw * sn * (xn * sin + yn * cos) + 0.5 * cw).floor() as i32;

        let (cx, cy) = (x1 + last / 2.0, y1 + last / 2.0);
        let landmarks: Vec<Point> = points
            .chunks_exact(2)
            .take(LANDMARK_COUNT)
            .map(|p| {
                let px = (p[0] as f64 + 0.5) * last + x1;
                let py = (p[1] as f64 + 0.5) * last + y1;
                rotate_point(px, py, cx, cy, angle)
            })
            .collect();

        let side = w as f64 / (1.0 + 2.0 * AUGMENT_SCALE);
        let offset = (AUGMENT_SCALE * side) as i32;
        let mut next = Window::new(
            x + offset,
            y + offset,
            side.ceil() as i32,
            window.angle + ANGLE_RANGE * rotation[0] as f64,
            window.scale,
            score,
        );
        next.landmarks = landmarks;

        if next.size <= 0 || !next.is_legal_in(padded.width() as usize, padded.height() as usize) {
            return Ok(None);
        }
        if threshold > 0.0 && (score <= threshold || next.size < MIN_TRACKED_SIZE) {
            return Ok(None);
        }
        Ok(Some(next))
    }
}
