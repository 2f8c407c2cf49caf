use std::cmp::Ordering;

use crate::shared::constants::EPS;

use super::window::Window;

fn sort_by_confidence(windows: &mut [Window]) {
    windows.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
}

/// Greedy removal of windows that a higher-confidence survivor suppresses.
fn suppress(mut windows: Vec<Window>, suppresses: impl Fn(&Window, &Window) -> bool) -> Vec<Window> {
    if windows.is_empty() {
        return windows;
    }
    sort_by_confidence(&mut windows);

    let mut removed = vec![false; windows.len()];
    for i in 0..windows.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..windows.len() {
            if !removed[j] && suppresses(&windows[i], &windows[j]) {
                removed[j] = true;
            }
        }
    }
    windows
        .into_iter()
        .zip(removed)
        .filter_map(|(w, gone)| (!gone).then_some(w))
        .collect()
}

/// Non-max suppression, sorted by descending confidence.
///
/// With `local_only`, windows found at different pyramid scales never
/// suppress each other.
pub fn nms(windows: Vec<Window>, local_only: bool, threshold: f64) -> Vec<Window> {
    suppress(windows, |kept, other| {
        if local_only && (kept.scale - other.scale).abs() > EPS {
            return false;
        }
        kept.iou(other) > threshold
    })
}

/// Drop windows lying entirely inside a higher-confidence window.
pub fn filter_contained(windows: Vec<Window>) -> Vec<Window> {
    suppress(windows, |kept, other| kept.contains(other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(x: i32, y: i32, size: i32, confidence: f32, scale: f64) -> Window {
        Window::new(x, y, size, 0.0, scale, confidence)
    }

    // ── NMS ──

    #[test]
    fn test_empty_input() {
        assert!(nms(Vec::new(), false, 0.3).is_empty());
        assert!(filter_contained(Vec::new()).is_empty());
    }

    #[test]
    fn test_nms_keeps_highest_confidence() {
        let windows = vec![
            win(0, 0, 40, 0.7, 1.0),
            win(2, 2, 40, 0.95, 1.0),
            win(100, 100, 40, 0.5, 1.0),
        ];
        let kept = nms(windows, false, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].x, kept[0].confidence), (2, 0.95));
        assert_eq!(kept[1].x, 100);
    }

    #[test]
    fn test_nms_output_sorted_descending() {
        let windows = vec![
            win(0, 0, 10, 0.2, 1.0),
            win(50, 0, 10, 0.9, 1.0),
            win(100, 0, 10, 0.5, 1.0),
        ];
        let kept = nms(windows, false, 0.3);
        let confidences: Vec<f32> = kept.iter().map(|w| w.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn test_local_nms_ignores_other_scales() {
        let windows = vec![win(0, 0, 40, 0.9, 1.0), win(0, 0, 40, 0.8, 1.5)];
        assert_eq!(nms(windows.clone(), true, 0.8).len(), 2);
        assert_eq!(nms(windows, false, 0.8).len(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        // identical boxes have IoU exactly 1.0
        let windows = vec![win(0, 0, 20, 0.9, 1.0), win(0, 0, 20, 0.8, 1.0)];
        assert_eq!(nms(windows, false, 1.0).len(), 2);
    }

    #[test]
    fn test_nms_idempotent() {
        let windows = vec![
            win(0, 0, 40, 0.9, 1.0),
            win(5, 5, 40, 0.85, 1.0),
            win(30, 30, 40, 0.8, 1.0),
            win(60, 0, 30, 0.7, 1.0),
            win(62, 3, 28, 0.6, 1.0),
        ];
        let once = nms(windows, false, 0.3);
        let twice = nms(once.clone(), false, 0.3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_suppressed_window_cannot_suppress_others() {
        // b is suppressed by a; c overlaps only b, so c must survive
        let a = win(0, 0, 20, 0.9, 1.0);
        let b = win(8, 0, 20, 0.8, 1.0);
        let c = win(16, 0, 20, 0.7, 1.0);
        let kept = nms(vec![a, b, c], false, 0.3);
        let xs: Vec<i32> = kept.iter().map(|w| w.x).collect();
        assert_eq!(xs, vec![0, 16]);
    }

    // ── Containment ──

    #[test]
    fn test_filter_contained_removes_nested_lower_confidence() {
        let a = win(0, 0, 100, 0.9, 1.0);
        let b = win(10, 10, 50, 0.6, 1.0);
        let kept = filter_contained(vec![b, a.clone()]);
        assert_eq!(kept, vec![a]);
    }

    #[test]
    fn test_filter_contained_keeps_more_confident_inner_window() {
        let outer = win(0, 0, 100, 0.5, 1.0);
        let inner = win(10, 10, 50, 0.9, 1.0);
        assert_eq!(filter_contained(vec![outer, inner]).len(), 2);
    }

    #[test]
    fn test_filter_contained_keeps_partial_overlap() {
        let a = win(0, 0, 100, 0.9, 1.0);
        let b = win(80, 80, 50, 0.6, 1.0);
        assert_eq!(filter_contained(vec![a, b]).len(), 2);
    }
}
