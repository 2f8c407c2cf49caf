use crate::detection::domain::detector_config::{ConfigError, DetectorConfig};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::network::{Network, NetworkError};
use crate::detection::domain::suppression::{filter_contained, nms};
use crate::detection::domain::window::{Face, Window};
use crate::detection::domain::window_smoother::{TemporalSmoother, WindowSmoother};
use crate::shared::constants::NMS_THRESHOLDS;
use crate::shared::frame::Frame;

use super::cascade::Cascade;
use super::model_resolver::ModelPaths;
use super::onnx_network::OnnxNetwork;
use super::tensor::PaddedTile;
use super::tracker::Tracker;

/// The four networks one detector needs.
pub struct PcnNetworks {
    pub stage1: Box<dyn Network>,
    pub stage2: Box<dyn Network>,
    pub stage3: Box<dyn Network>,
    pub tracking: Box<dyn Network>,
}

impl PcnNetworks {
    pub fn load(paths: &ModelPaths, intra_threads: usize) -> Result<Self, NetworkError> {
        Ok(Self {
            stage1: Box::new(OnnxNetwork::load(&paths.stage1, intra_threads)?),
            stage2: Box::new(OnnxNetwork::load(&paths.stage2, intra_threads)?),
            stage3: Box::new(OnnxNetwork::load(&paths.stage3, intra_threads)?),
            tracking: Box::new(OnnxNetwork::load(&paths.tracking, intra_threads)?),
        })
    }
}

/// Progressive calibration network detector with tracking and smoothing.
///
/// One instance per tile. History (last windows, smoothing memory and the
/// key-frame counter) only advances through [`FaceDetector::detect_track`].
pub struct PcnDetector {
    cascade: Cascade,
    tracker: Tracker,
    smoother: Box<dyn TemporalSmoother>,
    previous: Vec<Window>,
    frame_count: u64,
    config: DetectorConfig,
}

impl PcnDetector {
    /// Fails when `config` does not validate; a pyramid scale of 1 or less
    /// would never shrink the stage-1 scan.
    pub fn new(networks: PcnNetworks, config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cascade: Cascade::new(networks.stage1, networks.stage2, networks.stage3),
            tracker: Tracker::new(networks.tracking),
            smoother: Box::new(WindowSmoother::new()),
            previous: Vec::new(),
            frame_count: 0,
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn is_key_frame(&self) -> bool {
        self.frame_count % self.config.effective_period() as u64 == 0
    }
}

fn to_faces(windows: &[Window], padded: &PaddedTile) -> Vec<Face> {
    windows
        .iter()
        .filter_map(|w| w.to_face(padded.pad_cols as i32, padded.pad_rows as i32))
        .collect()
}

impl FaceDetector for PcnDetector {
    fn detect(&mut self, tile: &Frame) -> Result<Vec<Face>, DetectionError> {
        let padded = PaddedTile::new(tile);
        let windows = self.cascade.detect(tile, &padded, &self.config)?;
        Ok(to_faces(&windows, &padded))
    }

    fn detect_track(&mut self, tile: &Frame) -> Result<Vec<Face>, DetectionError> {
        let padded = PaddedTile::new(tile);

        let mut windows = std::mem::take(&mut self.previous);
        if self.is_key_frame() {
            windows.extend(self.cascade.detect(tile, &padded, &self.config)?);
        }
        self.frame_count += 1;

        let windows = nms(windows, false, NMS_THRESHOLDS[2] as f64);
        let windows = self
            .tracker
            .track(&padded.image, self.config.tracking_threshold, &windows)?;
        let windows = nms(windows, false, NMS_THRESHOLDS[2] as f64);
        let mut windows = filter_contained(windows);
        if self.config.smooth {
            windows = self.smoother.smooth(windows);
        }

        let faces = to_faces(&windows, &padded);
        self.previous = windows;
        Ok(faces)
    }
}
