use super::window::Window;

/// Above this IoU a current window snaps onto the remembered one.
pub const SNAP_IOU: f64 = 0.9;
/// Above this IoU (and up to [`SNAP_IOU`]) the two are averaged.
pub const BLEND_IOU: f64 = 0.6;

/// Domain interface for temporal stabilisation of a tile's windows.
pub trait TemporalSmoother: Send {
    fn smooth(&mut self, windows: Vec<Window>) -> Vec<Window>;
}

/// Blends each frame's windows with a short decaying memory of earlier ones.
///
/// Remembered windows matched this frame are absorbed. Unmatched ones lose
/// one unit of age and, while age stays positive, are re-emitted so brief
/// misses do not make a face flicker.
#[derive(Default)]
pub struct WindowSmoother {
    memory: Vec<Window>,
}

impl WindowSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &[Window] {
        &self.memory
    }
}

impl TemporalSmoother for WindowSmoother {
    fn smooth(&mut self, mut windows: Vec<Window>) -> Vec<Window> {
        for window in windows.iter_mut() {
            for remembered in self.memory.iter_mut() {
                let iou = window.iou(remembered);
                if iou > SNAP_IOU {
                    window.snap_to(remembered);
                    remembered.age = 0;
                } else if iou > BLEND_IOU {
                    window.average_with(remembered);
                    remembered.age = 0;
                }
            }
        }

        for remembered in self.memory.drain(..) {
            if remembered.age == 0 {
                continue;
            }
            let age = remembered.age - 1;
            if age > 0 {
                windows.push(Window { age, ..remembered });
            }
        }

        self.memory = windows.clone();
        windows
    }
}
