use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::MIN_FACE_FLOOR;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("pyramid scale factor must be greater than 1 (got {0})")]
    PyramidScale(f64),
    #[error("stage {stage} threshold must be finite and non-negative (got {value})")]
    Threshold { stage: usize, value: f32 },
    #[error("tracking threshold must be finite (got {0})")]
    TrackingThreshold(f32),
}

/// Tunable parameters of one tile's cascade detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Smallest face side in pixels; values below 20 are raised to 20.
    pub min_face_size: u32,
    /// Downscale factor between pyramid levels of the first stage.
    pub pyramid_scale: f64,
    /// Per-stage classification thresholds; a score must exceed its threshold.
    pub thresholds: [f32; 3],
    /// Frames between full detections when tracking; 0 behaves like 1.
    pub tracking_period: u32,
    /// Tracker acceptance threshold; `<= 0` accepts every track.
    pub tracking_threshold: f32,
    /// Temporal smoothing of tracked windows.
    pub smooth: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            pyramid_scale: 1.25,
            thresholds: [0.9175; 3],
            tracking_period: 1,
            tracking_threshold: 0.9,
            smooth: false,
        }
    }
}

impl DetectorConfig {
    /// Parameters tuned for continuous video streams.
    pub fn video() -> Self {
        Self {
            min_face_size: 32,
            pyramid_scale: 1.5,
            thresholds: [0.56, 0.65, 1.274],
            tracking_period: 30,
            tracking_threshold: 0.9,
            smooth: true,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.thresholds = [threshold; 3];
        self
    }

    pub fn effective_min_face(&self) -> u32 {
        self.min_face_size.max(MIN_FACE_FLOOR)
    }

    pub fn effective_period(&self) -> u32 {
        self.tracking_period.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pyramid_scale.is_finite() || self.pyramid_scale <= 1.0 {
            return Err(ConfigError::PyramidScale(self.pyramid_scale));
        }
        for (i, &t) in self.thresholds.iter().enumerate() {
            if !t.is_finite() || t < 0.0 {
                return Err(ConfigError::Threshold {
                    stage: i + 1,
                    value: t,
                });
            }
        }
        if !self.tracking_threshold.is_finite() {
            return Err(ConfigError::TrackingThreshold(self.tracking_threshold));
        }
        Ok(())
    }
}
