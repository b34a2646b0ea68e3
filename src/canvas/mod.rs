//! Shape editing canvas.
//!
//! The canvas does not draw pixels. It maintains a [`Scene`], a display list
//! in natural image coordinates that the host renders on top of the frame
//! image, scaled by [`Scene::scale`].

mod editor;
mod mode;
mod scene;

pub use editor::ShapeCanvas;
pub use mode::ToolMode;
pub use scene::{Color, Geometry, Scene, Stage, Visual};
