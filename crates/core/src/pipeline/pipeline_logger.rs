use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for frame processing runs.
///
/// Use cases report through this instead of printing, so the CLI and tests
/// can each decide what to do with the events.
pub trait PipelineLogger: Send {
    /// `current` of `total` frames are done.
    fn progress(&mut self, current: usize, total: usize);

    /// Time spent in a named stage (`extract`, `detect`, `composite`, ...)
    /// for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame count such as faces found.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: nothing.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Tally {
    count: usize,
    total: f64,
}

impl Tally {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Forwards events to the `log` facade and keeps running totals for a
/// summary at the end of the run. Progress lines are written every
/// `throttle` frames and on the last one.
pub struct StdoutPipelineLogger {
    throttle: usize,
    started: Instant,
    frames_done: usize,
    timings: BTreeMap<String, Tally>,
    metrics: BTreeMap<String, Tally>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            started: Instant::now(),
            frames_done: 0,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Tally::mean)
    }

    pub fn metric_total(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(|t| t.total)
    }

    /// `None` until a timing or metric has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!("Processed {} frames in {elapsed:.1}s", self.frames_done)];

        for (stage, tally) in &self.timings {
            lines.push(format!(
                "  {stage:10} avg {:7.1}ms  total {:8.0}ms",
                tally.mean(),
                tally.total
            ));
        }
        for (name, tally) in &self.metrics {
            lines.push(format!("  {name:10} avg {:.1}  total {:.0}", tally.mean(), tally.total));
        }
        if self.frames_done > 0 && elapsed > 0.0 {
            lines.push(format!("  {:.2} s/frame", elapsed / self.frames_done as f64));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_done = current;
        if current % self.throttle == 0 || current == total {
            log::info!("Frame {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_string()).or_default().add(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().add(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
