use crate::shared::constants::INITIAL_WINDOW_AGE;
use crate::shared::geometry::{is_legal, smooth_angle, Point};

use super::orientation::Orientation;

/// A square face hypothesis in padded tile coordinates.
///
/// Created by the first cascade stage, refined by the later stages and the
/// tracker, and merged or aged out by the smoother.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    /// In-plane rotation in degrees.
    pub angle: f64,
    /// Pyramid scale the window was found at.
    pub scale: f64,
    pub confidence: f32,
    /// Frames left in smoothing memory.
    pub age: u32,
    pub landmarks: Vec<Point>,
}

impl Window {
    pub fn new(x: i32, y: i32, size: i32, angle: f64, scale: f64, confidence: f32) -> Self {
        Self {
            x,
            y,
            size,
            angle,
            scale,
            confidence,
            age: INITIAL_WINDOW_AGE,
            landmarks: Vec::new(),
        }
    }

    /// Last pixel column covered by the window.
    pub fn last_x(&self) -> i32 {
        self.x + self.size - 1
    }

    /// Last pixel row covered by the window.
    pub fn last_y(&self) -> i32 {
        self.y + self.size - 1
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::classify(self.angle)
    }

    /// Both corner pixels lie inside a `width` × `height` image.
    pub fn is_legal_in(&self, width: usize, height: usize) -> bool {
        is_legal(self.x, self.y, width, height) && is_legal(self.last_x(), self.last_y(), width, height)
    }

    /// Axis-aligned IoU with inclusive pixel counting; rotation is ignored.
    pub fn iou(&self, other: &Window) -> f64 {
        let x_overlap = (self.last_x().min(other.last_x()) - self.x.max(other.x) + 1).max(0) as f64;
        let y_overlap = (self.last_y().min(other.last_y()) - self.y.max(other.y) + 1).max(0) as f64;
        let intersection = x_overlap * y_overlap;
        if intersection == 0.0 {
            return 0.0;
        }
        let union = (self.size as f64).powi(2) + (other.size as f64).powi(2) - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.size && y < self.y + self.size
    }

    /// Both corners of `other` lie inside this window.
    pub fn contains(&self, other: &Window) -> bool {
        self.contains_point(other.x, other.y) && self.contains_point(other.last_x(), other.last_y())
    }

    /// Take `remembered`'s geometry, average confidence, blend landmarks 4:6.
    pub fn snap_to(&mut self, remembered: &Window) {
        self.confidence = (self.confidence + remembered.confidence) / 2.0;
        self.x = remembered.x;
        self.y = remembered.y;
        self.size = remembered.size;
        self.angle = remembered.angle;
        blend_landmarks(&mut self.landmarks, &remembered.landmarks, 4, 6);
    }

    /// Integer-average geometry, circular-average angle, average confidence,
    /// blend landmarks 7:3.
    pub fn average_with(&mut self, remembered: &Window) {
        self.confidence = (self.confidence + remembered.confidence) / 2.0;
        self.x = (self.x + remembered.x) / 2;
        self.y = (self.y + remembered.y) / 2;
        self.size = (self.size + remembered.size) / 2;
        self.angle = smooth_angle(self.angle, remembered.angle);
        blend_landmarks(&mut self.landmarks, &remembered.landmarks, 7, 3);
    }

    /// Translate from padded to unpadded tile coordinates.
    pub fn to_face(&self, pad_cols: i32, pad_rows: i32) -> Option<Face> {
        if self.size <= 0 {
            return None;
        }
        Some(Face {
            x: self.x - pad_cols,
            y: self.y - pad_rows,
            size: self.size,
            angle: self.angle.round() as i32,
            confidence: self.confidence,
            landmarks: self
                .landmarks
                .iter()
                .map(|p| p.offset(-pad_cols, -pad_rows))
                .collect(),
        })
    }
}

/// Weighted integer blend, pairing points positionally.
fn blend_landmarks(current: &mut [Point], remembered: &[Point], w_current: i32, w_remembered: i32) {
    let total = w_current + w_remembered;
    for (cur, rem) in current.iter_mut().zip(remembered) {
        cur.x = (w_current * cur.x + w_remembered * rem.x) / total;
        cur.y = (w_current * cur.y + w_remembered * rem.y) / total;
    }
}

/// A detected face in unpadded tile coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    /// Whole degrees.
    pub angle: i32,
    pub confidence: f32,
    pub landmarks: Vec<Point>,
}
