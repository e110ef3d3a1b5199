//! Visionary — image analysis with spoken descriptions for blind and
//! low-vision users.

pub mod app;
pub mod artifact;
pub mod config;
pub mod image;
pub mod playback;
pub mod session;
pub mod speech;
pub mod vision;
