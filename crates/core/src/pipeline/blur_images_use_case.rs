use crate::media::domain::image_reader::ImageReader;
use crate::media::domain::image_writer::ImageWriter;
use crate::media::infrastructure::image_directory::ImageJob;
use crate::pipeline::frame_processor::{FrameProcessor, ProcessError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::projection::infrastructure::tile_projection::DetectMode;

/// Builds the processor for the resolution of the first image.
pub type ProcessorFactory = Box<dyn Fn(u32, u32) -> Result<FrameProcessor, ProcessError>>;

/// Blurs a sequence of equirectangular stills: read, process, write.
///
/// Every image must share the first image's size; the run stops at the
/// first one that does not.
pub struct BlurImagesUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    build_processor: ProcessorFactory,
    mode: DetectMode,
}

impl BlurImagesUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        build_processor: ProcessorFactory,
        mode: DetectMode,
    ) -> Self {
        Self {
            reader,
            writer,
            build_processor,
            mode,
        }
    }

    /// Returns the number of images written.
    pub fn execute(
        &self,
        jobs: &[ImageJob],
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut processor: Option<FrameProcessor> = None;
        let mut written = 0;

        for (i, job) in jobs.iter().enumerate() {
            let mut frame = self.reader.read(&job.input)?;
            frame.set_index(i);

            if processor.is_none() {
                processor = Some((self.build_processor)(frame.width(), frame.height())?);
            }
            let processor = processor.as_mut().ok_or("frame processor missing")?;

            let stats = match processor.process_frame(&mut frame, self.mode) {
                Ok(stats) => stats,
                Err(ProcessError::FrameSizeMismatch { expected, actual }) => {
                    log::warn!(
                        "{} is {}x{} but the run started at {}x{}, stopping",
                        job.input.display(),
                        actual.0,
                        actual.1,
                        expected.0,
                        expected.1
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            self.writer.write(&job.output, &frame)?;
            written += 1;

            logger.timing("extract", stats.extract_ms);
            logger.timing("detect", stats.detect_ms);
            logger.timing("composite", stats.composite_ms);
            logger.metric("faces", stats.faces as f64);
            logger.info(&format!(
                "{} -> {} ({} faces)",
                job.input.display(),
                job.output.display(),
                stats.faces
            ));
            logger.progress(i + 1, jobs.len());
        }

        logger.summary();
        Ok(written)
    }
}
