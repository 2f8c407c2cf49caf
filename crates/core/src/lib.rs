//! Face detection and obscuring for equirectangular 360° imagery.
//!
//! Each frame is swept with overlapping rectilinear tiles; faces found in a
//! tile are obscured there and the touched pixels are projected back into
//! the frame.

pub mod blurring {
    pub mod domain {
        pub mod face_obscurer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detector_config;
        pub mod face_detector;
        pub mod network;
        pub mod orientation;
        pub mod suppression;
        pub mod window;
        pub mod window_smoother;
    }
    pub mod infrastructure;
}

pub mod imaging {
    pub mod affine;
    pub mod remap;
    pub mod transform;
}

pub mod media {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod blur_images_use_case;
    pub mod frame_processor;
    pub mod pipeline_logger;
}

pub mod projection {
    pub mod domain {
        pub mod sphere_sampler;
        pub mod tile_layout;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod geometry;
    pub mod rect;
}
