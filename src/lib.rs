//! Skylabel - interactive image and video annotation engine
//!
//! Labels items of a source dataset one frame at a time and submits the
//! results to an output dataset. Four tools are supported: drawing shapes,
//! picking an integer per frame, linking detections into tracks, and
//! editing a GeoJSON feature collection.
//!
//! A [`session::SessionController`] owns the navigation state and the
//! active tool. It emits backend requests instead of performing them; a
//! [`backend::SessionDriver`] (or any host loop) executes them and feeds
//! the results back.

pub mod backend;
pub mod canvas;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod keybindings;
pub mod keyboard;
pub mod model;
pub mod session;
pub mod tools;
pub mod track;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use session::{SessionConfig, SessionController};
