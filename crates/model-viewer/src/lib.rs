//! Interactive 3D model viewer.
//!
//! A single-surface renderer that keeps up to [`renderer::frame::FRAME_COUNT`]
//! frames in flight, hot-swaps models through a deferred two-slot hand-off and
//! draws a fixed reference grid. Input and UI drive it through
//! [`controls::ViewerHandle`].

pub mod app;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod loader;
pub mod model;
pub mod renderer;
pub mod ui;

pub use error::{Result, ViewerError};
