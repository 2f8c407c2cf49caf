pub const STAGE1_MODEL_NAME: &str = "PCN-1.onnx";
pub const STAGE2_MODEL_NAME: &str = "PCN-2.onnx";
pub const STAGE3_MODEL_NAME: &str = "PCN-3.onnx";
pub const TRACKING_MODEL_NAME: &str = "PCN-Tracking.onnx";

pub const MODEL_NAMES: [&str; 4] = [
    STAGE1_MODEL_NAME,
    STAGE2_MODEL_NAME,
    STAGE3_MODEL_NAME,
    TRACKING_MODEL_NAME,
];

/// Overrides the models directory when no explicit path is given.
pub const MODELS_DIR_ENV: &str = "EQUIRECT_BLUR_MODELS";

/// Per-channel BGR mean subtracted before inference; also the padding colour.
pub const NETWORK_MEAN_BGR: [u8; 3] = [104, 117, 123];

pub const STAGE1_INPUT_SIZE: usize = 24;
pub const STAGE2_INPUT_SIZE: usize = 24;
pub const STAGE3_INPUT_SIZE: usize = 48;
pub const TRACKING_INPUT_SIZE: usize = 96;

pub const STAGE1_OUTPUTS: [&str; 3] = ["bbox_reg_1", "cls_prob", "rotate_cls_prob"];
pub const STAGE2_OUTPUTS: [&str; 3] = ["bbox_reg_2", "cls_prob", "rotate_cls_prob"];
pub const STAGE3_OUTPUTS: [&str; 3] = ["bbox_reg_3", "cls_prob", "rotate_reg_3"];
pub const TRACKING_OUTPUTS: [&str; 4] = ["bbox_reg", "cls_prob", "points_reg", "rotate_reg"];

pub const NMS_THRESHOLDS: [f32; 3] = [0.8, 0.8, 0.3];
pub const SCAN_STRIDE: usize = 8;
/// Degrees covered by a full-scale stage 3 / tracker rotation regression.
pub const ANGLE_RANGE: f64 = 45.0;
/// Fraction added on each side of a window before tracking.
pub const AUGMENT_SCALE: f64 = 0.15;
/// Frames a remembered window survives without being matched.
pub const INITIAL_WINDOW_AGE: u32 = 5;
pub const MIN_FACE_FLOOR: u32 = 20;
pub const MIN_TRACKED_SIZE: i32 = 20;
/// Tolerance for comparing discrete angles and pyramid scales.
pub const EPS: f64 = 1e-5;

/// Padding fraction and cap applied to each tile border before detection.
pub const PAD_FRACTION: f64 = 0.2;
pub const PAD_MAX: usize = 100;

pub const OBSCURE_KERNEL_SIZE: usize = 31;
pub const OBSCURE_SIGMA: f64 = 10.0;
pub const DRAW_OVER_BGR: [u8; 3] = [64, 64, 64];

/// Processing stops after this many inputs in a single directory run.
pub const MAX_INPUT_FILES: usize = 100;
pub const INPUT_EXTENSIONS: &[&str] = &["jpg"];
pub const OUTPUT_EXTENSION: &str = "png";
