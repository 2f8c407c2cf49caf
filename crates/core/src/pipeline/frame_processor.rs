use std::time::Instant;

use crate::blurring::domain::face_obscurer::FaceObscurer;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::window::Face;
use crate::projection::domain::sphere_sampler::SphereSampler;
use crate::projection::domain::tile_layout::{LayoutError, TileLayout};
use crate::projection::infrastructure::tile_projection::{DetectMode, Projection};
use crate::shared::frame::Frame;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("frame is {}x{}, expected {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    FrameSizeMismatch { expected: (u32, u32), actual: (u32, u32) },
    #[error("invalid tile layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("failed to create detector: {0}")]
    DetectorSetup(String),
    #[error("detection failed on tile {tile}: {message}")]
    Detection { tile: usize, message: String },
}

/// What one call to [`FrameProcessor::process_frame`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub faces: usize,
    pub pixels_written: usize,
    /// Summed over tiles.
    pub extract_ms: f64,
    /// Summed over tiles.
    pub detect_ms: f64,
    pub composite_ms: f64,
}

struct TileResult {
    index: usize,
    faces: Result<Vec<Face>, DetectionError>,
    extract_ms: f64,
    detect_ms: f64,
}

/// Runs every tile of one frame resolution: parallel extraction and
/// detection, then sequential obscuring and compositing in tile order.
///
/// Each tile is extracted again from the partly composited frame before it
/// is obscured, so a later tile never writes back pixels an earlier tile
/// has already obscured.
pub struct FrameProcessor {
    frame_width: u32,
    frame_height: u32,
    projections: Vec<Projection>,
    obscurer: Box<dyn FaceObscurer>,
    workers: usize,
}

fn worker_count(jobs: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(jobs)
        .max(1)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl FrameProcessor {
    /// Builds one projection per tile of `layout`, each with a detector from
    /// `make_detector`. Sampling maps are computed on scoped worker threads.
    pub fn new<F>(
        frame_width: u32,
        frame_height: u32,
        layout: &TileLayout,
        obscurer: Box<dyn FaceObscurer>,
        make_detector: F,
    ) -> Result<Self, ProcessError>
    where
        F: Fn() -> Result<Box<dyn FaceDetector>, DetectionError> + Sync,
    {
        layout.validate()?;
        let orientations = layout.orientations();
        let workers = worker_count(orientations.len());
        let chunk = orientations.len().div_ceil(workers).max(1);

        let built: Vec<Result<Vec<Projection>, ProcessError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = orientations
                .chunks(chunk)
                .map(|part| {
                    let make_detector = &make_detector;
                    scope.spawn(move || {
                        part.iter()
                            .map(|&orientation| -> Result<Projection, ProcessError> {
                                let detector =
                                    make_detector().map_err(|e| ProcessError::DetectorSetup(e.to_string()))?;
                                let sampler = SphereSampler::new(frame_width, frame_height, layout, orientation);
                                Ok(Projection::new(sampler, detector))
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut projections = Vec::with_capacity(orientations.len());
        for part in built {
            projections.extend(part?);
        }

        let (tile_w, tile_h) = layout.tile_size(frame_width, frame_height);
        log::info!(
            "Prepared {} tiles of {}x{} for {}x{} frames on {} threads",
            projections.len(),
            tile_w,
            tile_h,
            frame_width,
            frame_height,
            workers
        );

        Ok(Self {
            frame_width,
            frame_height,
            projections,
            obscurer,
            workers,
        })
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Detect and obscure faces across all tiles, writing the result into
    /// `frame` in place. The frame is untouched when any tile fails.
    pub fn process_frame(&mut self, frame: &mut Frame, mode: DetectMode) -> Result<FrameStats, ProcessError> {
        let actual = (frame.width(), frame.height());
        let expected = self.frame_size();
        if actual != expected {
            return Err(ProcessError::FrameSizeMismatch { expected, actual });
        }

        let mut results = self.detect_tiles(frame, mode);
        results.sort_by_key(|r| r.index);

        let mut stats = FrameStats::default();
        let mut detected = Vec::with_capacity(results.len());
        for r in results {
            let faces = r.faces.map_err(|e| ProcessError::Detection {
                tile: r.index,
                message: e.to_string(),
            })?;
            log::debug!("Tile {}: {} faces", r.index, faces.len());
            stats.faces += faces.len();
            stats.extract_ms += r.extract_ms;
            stats.detect_ms += r.detect_ms;
            detected.push((r.index, faces));
        }

        for (index, faces) in detected {
            let projection = &mut self.projections[index];
            if faces.is_empty() {
                projection.clear_faces();
                continue;
            }
            let start = Instant::now();
            let mut tile = projection.extract(frame);
            stats.extract_ms += elapsed_ms(start);

            let start = Instant::now();
            projection.obscure(&mut tile, &faces, &*self.obscurer);
            stats.pixels_written += projection.composite(&tile, frame);
            stats.composite_ms += elapsed_ms(start);
        }
        Ok(stats)
    }

    fn detect_tiles(&mut self, frame: &Frame, mode: DetectMode) -> Vec<TileResult> {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, &mut Projection)>(self.projections.len());
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<TileResult>();
        let workers = self.workers;
        let projections = &mut self.projections;

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, projection) in job_rx {
                        let start = Instant::now();
                        let tile = projection.extract(frame);
                        let extract_ms = elapsed_ms(start);

                        let start = Instant::now();
                        let faces = projection.detect(&tile, mode);
                        let detect_ms = elapsed_ms(start);

                        let result = TileResult {
                            index,
                            faces,
                            extract_ms,
                            detect_ms,
                        };
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for job in projections.iter_mut().enumerate() {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            result_rx.iter().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::infrastructure::fill_obscurer::FillObscurer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reports the same faces on every tile and counts tracking calls.
    struct StubDetector {
        faces: Vec<Face>,
        fail: bool,
        tracked: Arc<AtomicUsize>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _tile: &Frame) -> Result<Vec<Face>, DetectionError> {
            if self.fail {
                return Err("inference failed".into());
            }
            Ok(self.faces.clone())
        }

        fn detect_track(&mut self, tile: &Frame) -> Result<Vec<Face>, DetectionError> {
            self.tracked.fetch_add(1, Ordering::SeqCst);
            self.detect(tile)
        }
    }

    fn centre_face() -> Face {
        Face {
            x: 70,
            y: 70,
            size: 40,
            angle: 0,
            confidence: 0.99,
            landmarks: Vec::new(),
        }
    }

    fn processor(faces: Vec<Face>, fail: bool, tracked: Arc<AtomicUsize>) -> FrameProcessor {
        FrameProcessor::new(720, 360, &TileLayout::default(), Box::new(FillObscurer::default()), || {
            Ok(Box::new(StubDetector {
                faces: faces.clone(),
                fail,
                tracked: tracked.clone(),
            }) as Box<dyn FaceDetector>)
        })
        .unwrap()
    }

    #[test]
    fn test_builds_one_projection_per_tile_in_order() {
        let p = processor(Vec::new(), false, Arc::default());
        let expected = TileLayout::default().orientations();
        assert_eq!(p.projections().len(), expected.len());
        for (projection, orientation) in p.projections().iter().zip(expected) {
            assert_eq!(projection.sampler().orientation(), orientation);
        }
    }

    #[test]
    fn test_size_mismatch_leaves_frame_untouched() {
        let mut p = processor(vec![centre_face()], false, Arc::default());
        let mut frame = Frame::filled(640, 320, [255, 255, 255]);
        let err = p.process_frame(&mut frame, DetectMode::Detect).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::FrameSizeMismatch {
                expected: (720, 360),
                actual: (640, 320)
            }
        ));
        assert!(frame.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_faces_are_obscured_in_the_frame() {
        let mut p = processor(vec![centre_face()], false, Arc::default());
        let mut frame = Frame::filled(720, 360, [255, 255, 255]);
        let stats = p.process_frame(&mut frame, DetectMode::Detect).unwrap();
        assert_eq!(stats.faces, p.projections().len());
        assert!(stats.pixels_written > 0);
        assert_eq!(frame.pixel(360, 180), &[64, 64, 64]);
        assert!(p.projections().iter().all(|pr| pr.faces().len() == 1));
    }

    #[test]
    fn test_overlapping_tiles_keep_earlier_obscuring() {
        use std::f64::consts::{FRAC_PI_8, TAU};

        // one column of tiles, a phi step apart, so neighbours overlap
        let layout = TileLayout {
            step_x: TAU,
            step_y: FRAC_PI_8,
            ..TileLayout::default()
        };
        let faces = vec![
            centre_face(),
            Face {
                x: 140,
                y: 100,
                size: 40,
                angle: 45,
                confidence: 0.99,
                landmarks: Vec::new(),
            },
        ];
        let make = || {
            Ok(Box::new(StubDetector {
                faces: faces.clone(),
                fail: false,
                tracked: Arc::default(),
            }) as Box<dyn FaceDetector>)
        };
        let mut p = FrameProcessor::new(720, 360, &layout, Box::new(FillObscurer::default()), make).unwrap();
        let mut frame = Frame::filled(720, 360, [255, 255, 255]);
        p.process_frame(&mut frame, DetectMode::Detect).unwrap();

        // tile by tile, each one sampled from the frame as composited so far
        let mut expected = Frame::filled(720, 360, [255, 255, 255]);
        for orientation in layout.orientations() {
            let sampler = SphereSampler::new(720, 360, &layout, orientation);
            let mut projection = Projection::new(sampler, make().unwrap());
            let mut tile = projection.extract(&expected);
            let found = projection.detect(&tile, DetectMode::Detect).unwrap();
            projection.obscure(&mut tile, &found, &FillObscurer::default());
            projection.composite(&tile, &mut expected);
        }

        assert_eq!(frame.data(), expected.data());
        assert_eq!(frame.pixel(360, 180), &[64, 64, 64]);
    }

    #[test]
    fn test_no_faces_leaves_frame_untouched() {
        let mut p = processor(Vec::new(), false, Arc::default());
        let mut frame = Frame::filled(720, 360, [10, 20, 30]);
        let stats = p.process_frame(&mut frame, DetectMode::Detect).unwrap();
        assert_eq!(stats.pixels_written, 0);
        assert!(frame.data().chunks(3).all(|px| px == [10, 20, 30]));
    }

    #[test]
    fn test_detector_failure_leaves_frame_untouched() {
        let mut p = processor(vec![centre_face()], true, Arc::default());
        let mut frame = Frame::filled(720, 360, [255, 255, 255]);
        let err = p.process_frame(&mut frame, DetectMode::Detect).unwrap_err();
        assert!(matches!(err, ProcessError::Detection { tile: 0, .. }));
        assert!(frame.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_track_mode_runs_every_tile() {
        let tracked = Arc::new(AtomicUsize::new(0));
        let mut p = processor(Vec::new(), false, tracked.clone());
        let mut frame = Frame::filled(720, 360, [0, 0, 0]);
        p.process_frame(&mut frame, DetectMode::Track).unwrap();
        p.process_frame(&mut frame, DetectMode::Detect).unwrap();
        assert_eq!(tracked.load(Ordering::SeqCst), p.projections().len());
    }

    #[test]
    fn test_detector_factory_failure_is_reported() {
        let result = FrameProcessor::new(720, 360, &TileLayout::default(), Box::new(FillObscurer::default()), || {
            Err("no models".into())
        });
        assert!(matches!(result, Err(ProcessError::DetectorSetup(msg)) if msg == "no models"));
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        let layout = TileLayout {
            step_x: 0.0,
            ..TileLayout::default()
        };
        let result = FrameProcessor::new(720, 360, &layout, Box::new(FillObscurer::default()), || {
            Ok(Box::new(StubDetector {
                faces: Vec::new(),
                fail: false,
                tracked: Arc::default(),
            }) as Box<dyn FaceDetector>)
        });
        assert!(matches!(result, Err(ProcessError::Layout(_))));
    }
}
