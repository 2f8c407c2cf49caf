use crate::blurring::domain::face_obscurer::FaceObscurer;
use crate::blurring::infrastructure::compositor::{obscure_face, project_to_frame};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::window::Face;
use crate::imaging::remap::{remap, BorderMode, SampleMap};
use crate::projection::domain::sphere_sampler::SphereSampler;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Which detector entry point a frame runs through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectMode {
    /// Independent detection per frame.
    #[default]
    Detect,
    /// Key-frame detection with tracking and smoothing in between.
    Track,
}

/// One virtual camera: its sampling maps, its own detector and the tile
/// regions it obscured in the latest frame.
pub struct Projection {
    sampler: SphereSampler,
    forward: SampleMap,
    detector: Box<dyn FaceDetector>,
    faces: Vec<Rect>,
}

impl Projection {
    pub fn new(sampler: SphereSampler, detector: Box<dyn FaceDetector>) -> Self {
        let forward = sampler.forward_map();
        Self {
            sampler,
            forward,
            detector,
            faces: Vec::new(),
        }
    }

    pub fn sampler(&self) -> &SphereSampler {
        &self.sampler
    }

    /// Tile regions obscured in the most recent frame.
    pub fn faces(&self) -> &[Rect] {
        &self.faces
    }

    /// Sample this tile out of the equirectangular frame, wrapping at the seams.
    pub fn extract(&self, frame: &Frame) -> Frame {
        let mut tile = remap(frame, &self.forward, BorderMode::Wrap);
        tile.set_index(frame.index());
        tile
    }

    pub fn detect(&mut self, tile: &Frame, mode: DetectMode) -> Result<Vec<Face>, DetectionError> {
        match mode {
            DetectMode::Detect => self.detector.detect(tile),
            DetectMode::Track => self.detector.detect_track(tile),
        }
    }

    /// Obscure `faces` in `tile` and record the touched regions, replacing
    /// those of the previous frame.
    pub fn obscure(&mut self, tile: &mut Frame, faces: &[Face], obscurer: &dyn FaceObscurer) {
        self.faces = faces
            .iter()
            .filter_map(|face| obscure_face(tile, face, obscurer))
            .collect();
    }

    pub fn clear_faces(&mut self) {
        self.faces.clear();
    }

    /// Copy the recorded regions of `tile` back into `frame`.
    pub fn composite(&self, tile: &Frame, frame: &mut Frame) -> usize {
        if self.faces.is_empty() {
            return 0;
        }
        project_to_frame(&self.sampler, &self.forward, tile, &self.faces, frame)
    }
}
