//! Tool adapters built on the session controller.

mod geojson;
mod int_label;
mod shape;
mod track;

pub use geojson::{FeatureCollection, GeoJsonTool};
pub use int_label::IntTool;
pub use shape::{ShapeParams, ShapeTool};
pub use track::TrackTool;

use crate::keybindings::KeyBindings;
use crate::model::{AnnotationSet, Tool};
use crate::session::ToolAdapter;

/// The adapter for an annotation set, selected by its tool.
#[derive(Debug)]
pub enum Adapter {
    Shape(ShapeTool),
    Int(IntTool),
    Track(TrackTool),
    GeoJson(GeoJsonTool),
}

impl Adapter {
    /// Build the adapter for an annotation set. Returns `None` for unknown tools.
    pub fn for_annoset(annoset: &AnnotationSet, bindings: &KeyBindings) -> Option<Self> {
        let adapter = match &annoset.tool {
            Tool::Shape => Adapter::Shape(ShapeTool::new(annoset, bindings.clone())),
            Tool::Int => Adapter::Int(IntTool::new(annoset)),
            Tool::DetectionToTrack => Adapter::Track(TrackTool::new(bindings)),
            Tool::GeoJson => Adapter::GeoJson(GeoJsonTool::new(annoset)),
            Tool::Other(name) => {
                log::warn!("No adapter for tool {:?}", name);
                return None;
            }
        };
        Some(adapter)
    }

    pub fn tool(&self) -> Tool {
        match self {
            Adapter::Shape(_) => Tool::Shape,
            Adapter::Int(_) => Tool::Int,
            Adapter::Track(_) => Tool::DetectionToTrack,
            Adapter::GeoJson(_) => Tool::GeoJson,
        }
    }

    /// Whether the tool steps through items and frames. The GeoJSON tool
    /// edits a single collection instead.
    pub fn drives_items(&self) -> bool {
        !matches!(self, Adapter::GeoJson(_))
    }

    pub fn inner(&self) -> &dyn ToolAdapter {
        match self {
            Adapter::Shape(tool) => tool,
            Adapter::Int(tool) => tool,
            Adapter::Track(tool) => tool,
            Adapter::GeoJson(tool) => tool,
        }
    }

    pub fn inner_mut(&mut self) -> &mut dyn ToolAdapter {
        match self {
            Adapter::Shape(tool) => tool,
            Adapter::Int(tool) => tool,
            Adapter::Track(tool) => tool,
            Adapter::GeoJson(tool) => tool,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeTool> {
        match self {
            Adapter::Shape(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut ShapeTool> {
        match self {
            Adapter::Shape(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&IntTool> {
        match self {
            Adapter::Int(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_int_mut(&mut self) -> Option<&mut IntTool> {
        match self {
            Adapter::Int(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_track(&self) -> Option<&TrackTool> {
        match self {
            Adapter::Track(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_track_mut(&mut self) -> Option<&mut TrackTool> {
        match self {
            Adapter::Track(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_geojson(&self) -> Option<&GeoJsonTool> {
        match self {
            Adapter::GeoJson(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_geojson_mut(&mut self) -> Option<&mut GeoJsonTool> {
        match self {
            Adapter::GeoJson(tool) => Some(tool),
            _ => None,
        }
    }
}
