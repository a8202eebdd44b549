//! Prism: Real-time two-pass webcam compositor
//!
//! Captures video from a webcam, runs it through an RGB-shift effect pass into
//! an offscreen target, then composites that target onto the screen through an
//! interactive 3D viewing plane.

pub mod capture;
pub mod frame;
pub mod gpu;
pub mod render;
