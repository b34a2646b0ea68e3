use serde::{Deserialize, Serialize};

use crate::model::ShapeType;

/// Drawing mode of the shape canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Two clicks span a box
    #[default]
    Box,
    /// Two clicks span a line
    Line,
    /// One click places a point
    Point,
    /// Selectable, but clicks on empty canvas create nothing
    Polygon,
}

impl ToolMode {
    /// Parse the `Mode` tool parameter. Empty or unknown values fall back to box.
    pub fn from_param(value: &str) -> Self {
        match value {
            "box" | "" => ToolMode::Box,
            "line" => ToolMode::Line,
            "point" => ToolMode::Point,
            "polygon" => ToolMode::Polygon,
            other => {
                log::warn!("Unknown drawing mode {:?}, using box", other);
                ToolMode::Box
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolMode::Box => "box",
            ToolMode::Line => "line",
            ToolMode::Point => "point",
            ToolMode::Polygon => "polygon",
        }
    }

    /// Shape type created in this mode, if any.
    pub fn shape_type(&self) -> Option<ShapeType> {
        match self {
            ToolMode::Box => Some(ShapeType::Box),
            ToolMode::Line => Some(ShapeType::Line),
            ToolMode::Point => Some(ShapeType::Point),
            ToolMode::Polygon => None,
        }
    }

    /// Whether creation takes a first click, pointer moves and a second click.
    pub fn is_two_phase(&self) -> bool {
        matches!(self, ToolMode::Box | ToolMode::Line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_param() {
        assert_eq!(ToolMode::from_param(""), ToolMode::Box);
        assert_eq!(ToolMode::from_param("line"), ToolMode::Line);
        assert_eq!(ToolMode::from_param("polygon"), ToolMode::Polygon);
        assert_eq!(ToolMode::from_param("spline"), ToolMode::Box);
    }

    #[test]
    fn test_polygon_creates_nothing() {
        assert_eq!(ToolMode::Polygon.shape_type(), None);
        assert!(!ToolMode::Polygon.is_two_phase());
        assert!(!ToolMode::Point.is_two_phase());
    }
}
