use crate::detection::domain::detector_config::DetectorConfig;
use crate::detection::domain::network::{flat_output, map_output, Network, NetworkError};
use crate::detection::domain::orientation::Orientation;
use crate::detection::domain::suppression::{filter_contained, nms};
use crate::detection::domain::window::Window;
use crate::imaging::transform::{flip_vertical, resize_by, transpose};
use crate::shared::constants::{
    ANGLE_RANGE, NMS_THRESHOLDS, SCAN_STRIDE, STAGE1_INPUT_SIZE, STAGE1_OUTPUTS, STAGE2_INPUT_SIZE,
    STAGE2_OUTPUTS, STAGE3_INPUT_SIZE, STAGE3_OUTPUTS,
};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::tensor::{crop_to_input, to_input_tensor, PaddedTile};

/// The padded tile in all four orientations the later stages crop from.
pub struct OrientedTiles {
    upright: Frame,
    inverted: Frame,
    rotated_90: Frame,
    rotated_neg_90: Frame,
}

impl OrientedTiles {
    pub fn new(padded: &Frame) -> Self {
        let rotated_90 = transpose(padded);
        Self {
            upright: padded.clone(),
            inverted: flip_vertical(padded),
            rotated_neg_90: flip_vertical(&rotated_90),
            rotated_90,
        }
    }

    pub fn get(&self, orientation: Orientation) -> &Frame {
        match orientation {
            Orientation::Upright => &self.upright,
            Orientation::Inverted => &self.inverted,
            Orientation::Rotated90 => &self.rotated_90,
            Orientation::RotatedNeg90 => &self.rotated_neg_90,
        }
    }

    fn width(&self) -> i32 {
        self.upright.width() as i32
    }

    fn height(&self) -> i32 {
        self.upright.height() as i32
    }
}

/// Refine a square `(x, y, size)` with a `[sn, xn, yn]` calibration.
/// Returns the new `(x, y, size)`.
fn calibrate(x: i32, y: i32, size: i32, reg: &[f32]) -> (i32, i32, i32) {
    let (sn, xn, yn) = (reg[0] as f64, reg[1] as f64, reg[2] as f64);
    let cw = size as f64;
    let w = (sn * cw).ceil() as i32;
    let nx = (x as f64 - 0.5 * sn * cw + sn * xn * cw + 0.5 * cw).floor() as i32;
    let ny = (y as f64 - 0.5 * sn * cw + sn * yn * cw + 0.5 * cw).floor() as i32;
    (nx, ny, w)
}

/// Index of the largest strictly positive score, 0 when none is.
fn argmax_positive(scores: &[f32]) -> usize {
    let mut best = 0.0f32;
    let mut index = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > best {
            best = s;
            index = i;
        }
    }
    index
}

/// The three detection networks of the rotation-invariant cascade.
pub struct Cascade {
    stage1: Box<dyn Network>,
    stage2: Box<dyn Network>,
    stage3: Box<dyn Network>,
}

impl Cascade {
    pub fn new(stage1: Box<dyn Network>, stage2: Box<dyn Network>, stage3: Box<dyn Network>) -> Self {
        Self {
            stage1,
            stage2,
            stage3,
        }
    }

    /// Run all three stages with suppression in between. Windows are in
    /// padded tile coordinates.
    pub fn detect(
        &mut self,
        tile: &Frame,
        padded: &PaddedTile,
        config: &DetectorConfig,
    ) -> Result<Vec<Window>, NetworkError> {
        let oriented = OrientedTiles::new(&padded.image);

        let windows = self.stage1(tile, padded, config)?;
        let windows = nms(windows, true, NMS_THRESHOLDS[0] as f64);
        log::trace!("stage 1 kept {} windows", windows.len());

        let windows = self.stage2(&oriented, config.thresholds[1], windows)?;
        let windows = nms(windows, true, NMS_THRESHOLDS[1] as f64);
        log::trace!("stage 2 kept {} windows", windows.len());

        let windows = self.stage3(&oriented, config.thresholds[2], windows)?;
        let windows = nms(windows, false, NMS_THRESHOLDS[2] as f64);
        let windows = filter_contained(windows);
        log::trace!("stage 3 kept {} windows", windows.len());
        Ok(windows)
    }

    /// Dense multi-scale scan of the unpadded tile.
    fn stage1(
        &mut self,
        tile: &Frame,
        padded: &PaddedTile,
        config: &DetectorConfig,
    ) -> Result<Vec<Window>, NetworkError> {
        let net_size = STAGE1_INPUT_SIZE as f64;
        let threshold = config.thresholds[0];
        let mut windows = Vec::new();

        let mut scale = config.effective_min_face() as f64 / net_size;
        let mut resized = resize_by(tile, scale);
        while (resized.width().min(resized.height()) as usize) >= STAGE1_INPUT_SIZE {
            let mut outputs = self
                .stage1
                .forward(to_input_tensor(&resized), &STAGE1_OUTPUTS)?
                .into_iter();
            let mut next = |name: &str, channels: usize| match outputs.next() {
                Some(t) => map_output(t, name, channels),
                None => Err(NetworkError::MissingOutput(name.to_string())),
            };
            let regression = next(STAGE1_OUTPUTS[0], 3)?;
            let prob = next(STAGE1_OUTPUTS[1], 2)?;
            let rotation = next(STAGE1_OUTPUTS[2], 2)?;

            let rows = prob.shape()[2].min(regression.shape()[2]).min(rotation.shape()[2]);
            let cols = prob.shape()[3].min(regression.shape()[3]).min(rotation.shape()[3]);
            let w = net_size * scale;
            let stride = SCAN_STRIDE as f64;
            for i in 0..rows {
                for j in 0..cols {
                    let score = prob[[0, 1, i, j]];
                    if score <= threshold {
                        continue;
                    }
                    let sn = regression[[0, 0, i, j]] as f64;
                    let xn = regression[[0, 1, i, j]] as f64;
                    let yn = regression[[0, 2, i, j]] as f64;

                    let rx = (j as f64 * scale * stride - 0.5 * sn * w + sn * xn * w + 0.5 * w
                        + padded.pad_cols as f64)
                        .floor() as i32;
                    let ry = (i as f64 * scale * stride - 0.5 * sn * w + sn * yn * w + 0.5 * w
                        + padded.pad_rows as f64)
                        .floor() as i32;
                    let rw = (w * sn).ceil() as i32;
                    let angle = if rotation[[0, 1, i, j]] > 0.5 { 0.0 } else { 180.0 };

                    let window = Window::new(rx, ry, rw, angle, scale, score);
                    if rw > 0 && window.is_legal_in(padded.width(), padded.height()) {
                        windows.push(window);
                    }
                }
            }

            resized = resize_by(&resized, config.pyramid_scale);
            if resized.height() == 0 {
                break;
            }
            scale = tile.height() as f64 / resized.height() as f64;
        }
        Ok(windows)
    }

    /// Upright/inverted re-scoring with a three-way coarse rotation class.
    fn stage2(
        &mut self,
        oriented: &OrientedTiles,
        threshold: f32,
        windows: Vec<Window>,
    ) -> Result<Vec<Window>, NetworkError> {
        let (width, height) = (oriented.width(), oriented.height());
        let mut refined = Vec::new();
        for window in windows {
            let orientation = if window.orientation() == Orientation::Upright {
                Orientation::Upright
            } else {
                Orientation::Inverted
            };
            let (ox, oy) = orientation.to_oriented(window.x, window.y, window.size, width, height);
            let input = crop_to_input(
                oriented.get(orientation),
                Rect::new(ox, oy, window.size, window.size),
                STAGE2_INPUT_SIZE,
            );
            let outputs = self.stage2.forward(input, &STAGE2_OUTPUTS)?;
            let [regression, prob, rotation] = read_outputs(&outputs, &STAGE2_OUTPUTS, [3, 2, 3])?;

            let score = prob[1];
            if score <= threshold {
                continue;
            }
            let (x, y, size) = calibrate(ox, oy, window.size, &regression);
            let candidate = Window::new(x, y, size, 0.0, window.scale, score);
            if size <= 0 || !candidate.is_legal_in(width as usize, height as usize) {
                continue;
            }
            let (px, py) = orientation.from_oriented(x, y, size, width, height);
            let angle = orientation.coarse_angle(argmax_positive(&rotation[..3]));
            refined.push(Window::new(px, py, size, angle, window.scale, score));
        }
        Ok(refined)
    }

    /// Final re-scoring on the matching pre-rotated tile with a continuous
    /// rotation regression.
    fn stage3(
        &mut self,
        oriented: &OrientedTiles,
        threshold: f32,
        windows: Vec<Window>,
    ) -> Result<Vec<Window>, NetworkError> {
        let (width, height) = (oriented.width(), oriented.height());
        let mut refined = Vec::new();
        for window in windows {
            let orientation = window.orientation();
            let (ox, oy) = orientation.to_oriented(window.x, window.y, window.size, width, height);
            let image = oriented.get(orientation);
            let input = crop_to_input(
                image,
                Rect::new(ox, oy, window.size, window.size),
                STAGE3_INPUT_SIZE,
            );
            let outputs = self.stage3.forward(input, &STAGE3_OUTPUTS)?;
            let [regression, prob, rotation] = read_outputs(&outputs, &STAGE3_OUTPUTS, [3, 2, 1])?;

            let score = prob[1];
            if score <= threshold {
                continue;
            }
            let (x, y, size) = calibrate(ox, oy, window.size, &regression);
            let candidate = Window::new(x, y, size, 0.0, window.scale, score);
            let (oriented_w, oriented_h) = orientation.oriented_size(width as usize, height as usize);
            if size <= 0 || !candidate.is_legal_in(oriented_w, oriented_h) {
                continue;
            }
            let (px, py) = orientation.from_oriented(x, y, size, width, height);
            let angle = orientation.compose_angle(ANGLE_RANGE * rotation[0] as f64);
            refined.push(Window::new(px, py, size, angle, window.scale, score));
        }
        Ok(refined)
    }
}

/// Flatten the per-crop outputs of stages 2, 3 and the tracker.
pub(crate) fn read_outputs<const N: usize>(
    outputs: &[ndarray::ArrayD<f32>],
    names: &[&str; N],
    lengths: [usize; N],
) -> Result<[Vec<f32>; N], NetworkError> {
    let mut flat: [Vec<f32>; N] = std::array::from_fn(|_| Vec::new());
    for i in 0..N {
        let tensor = outputs
            .get(i)
            .ok_or_else(|| NetworkError::MissingOutput(names[i].to_string()))?;
        flat[i] = flat_output(tensor, names[i], lengths[i])?;
    }
    Ok(flat)
}
