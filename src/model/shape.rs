//! Shape model and its two wire encodings.
//!
//! Shapes are kept in natural image pixel coordinates. Output datasets of
//! type `shape` store them as `{Type, Points}`; datasets of type `detection`
//! only hold boxes and store `{Left, Top, Right, Bottom}` instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DataType, parse_leading_int};
use crate::geometry::{Point, Rect};

/// Kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Box,
    Line,
    Point,
    Polyline,
    Polygon,
}

impl ShapeType {
    /// Minimum number of points for a drawable shape of this kind.
    pub fn min_points(&self) -> usize {
        match self {
            ShapeType::Point => 1,
            ShapeType::Box | ShapeType::Line | ShapeType::Polyline => 2,
            ShapeType::Polygon => 3,
        }
    }
}

/// A user-drawn annotation on one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub kind: ShapeType,
    /// Points in natural pixels; a box has exactly two, top-left then bottom-right
    pub points: Vec<[i64; 2]>,
    /// Category name, empty when unset
    pub category: String,
    pub track_id: Option<i64>,
    /// Free-form attributes carried through from the dataset
    pub metadata: BTreeMap<String, String>,
}

impl Shape {
    /// Create a box from two corners, normalized so the first point is top-left.
    pub fn new_box(p1: [i64; 2], p2: [i64; 2]) -> Self {
        Self {
            kind: ShapeType::Box,
            points: vec![
                [p1[0].min(p2[0]), p1[1].min(p2[1])],
                [p1[0].max(p2[0]), p1[1].max(p2[1])],
            ],
            ..Default::default()
        }
    }

    pub fn new_line(p1: [i64; 2], p2: [i64; 2]) -> Self {
        Self {
            kind: ShapeType::Line,
            points: vec![p1, p2],
            ..Default::default()
        }
    }

    pub fn new_point(p: [i64; 2]) -> Self {
        Self {
            kind: ShapeType::Point,
            points: vec![p],
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_track_id(mut self, track_id: i64) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Bounding rectangle of all points.
    pub fn bounds(&self) -> Option<Rect> {
        let first = Point::from(*self.points.first()?);
        let rect = self
            .points
            .iter()
            .map(|p| Point::from(*p))
            .fold(Rect::new(first.x, first.y, 0.0, 0.0), |r, p| {
                let min_x = r.x.min(p.x);
                let min_y = r.y.min(p.y);
                let max_x = (r.x + r.width).max(p.x);
                let max_y = (r.y + r.height).max(p.y);
                Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
            });
        Some(rect)
    }

    /// Whether the shape has enough points to be drawn.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= self.kind.min_points()
    }

    /// Set the track ID from free text; unparseable text clears it.
    pub fn set_track_id_text(&mut self, text: &str) {
        self.track_id = parse_leading_int(text);
    }

    /// Track ID as shown in the editable text field.
    pub fn track_id_text(&self) -> String {
        self.track_id.map(|id| id.to_string()).unwrap_or_default()
    }

    /// Restore the box invariant after an edit.
    pub(crate) fn normalize_box(&mut self) {
        if self.kind == ShapeType::Box && self.points.len() == 2 {
            let (a, b) = (self.points[0], self.points[1]);
            self.points = Shape::new_box(a, b).points;
        }
    }
}

/// Wire encoding selected by the output dataset's data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeEncoding {
    /// `{Type, Points}`
    Shape,
    /// `{Left, Top, Right, Bottom}`, boxes only
    Detection,
}

impl ShapeEncoding {
    /// Encoding for an output data type; anything but `detection` uses shapes.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Detection => ShapeEncoding::Detection,
            _ => ShapeEncoding::Shape,
        }
    }
}

/// A shape as stored in a dataset, in either encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireShape {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ShapeType>,
    #[serde(rename = "Points", default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[i64; 2]>>,
    #[serde(rename = "Left", default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
    #[serde(rename = "Top", default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i64>,
    #[serde(rename = "Right", default, skip_serializing_if = "Option::is_none")]
    pub right: Option<i64>,
    #[serde(rename = "Bottom", default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
    #[serde(rename = "Category", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        rename = "TrackID",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::de_track_id"
    )]
    pub track_id: Option<i64>,
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Encode a shape for the given dataset encoding.
///
/// Category and TrackID are only written when set. The detection encoding
/// stores the bounding box of non-box shapes.
pub fn encode_shape(shape: &Shape, encoding: ShapeEncoding) -> WireShape {
    let mut wire = WireShape {
        category: (!shape.category.is_empty()).then(|| shape.category.clone()),
        track_id: shape.track_id,
        metadata: (!shape.metadata.is_empty()).then(|| shape.metadata.clone()),
        ..Default::default()
    };
    match encoding {
        ShapeEncoding::Shape => {
            wire.kind = Some(shape.kind);
            wire.points = Some(shape.points.clone());
        }
        ShapeEncoding::Detection => {
            let (tl, br) = if shape.kind == ShapeType::Box && shape.points.len() == 2 {
                (shape.points[0], shape.points[1])
            } else {
                log::warn!("Encoding {:?} shape as detection via its bounds", shape.kind);
                let r = shape.bounds().unwrap_or_default();
                (r.top_left().truncated(), r.bottom_right().truncated())
            };
            wire.left = Some(tl[0]);
            wire.top = Some(tl[1]);
            wire.right = Some(br[0]);
            wire.bottom = Some(br[1]);
        }
    }
    wire
}

/// Decode a stored shape. Returns `None` if the fields the encoding needs are missing.
pub fn decode_shape(wire: &WireShape, encoding: ShapeEncoding) -> Option<Shape> {
    let (kind, points) = match encoding {
        ShapeEncoding::Shape => (wire.kind.unwrap_or_default(), wire.points.clone()?),
        ShapeEncoding::Detection => (
            ShapeType::Box,
            vec![[wire.left?, wire.top?], [wire.right?, wire.bottom?]],
        ),
    };
    let shape = Shape {
        kind,
        points,
        category: wire.category.clone().unwrap_or_default(),
        track_id: wire.track_id,
        metadata: wire.metadata.clone().unwrap_or_default(),
    };
    shape.is_drawable().then_some(shape)
}

/// Encode per-frame shape lists into the stored JSON payload.
pub fn encode_frames(frames: &[Vec<Shape>], encoding: ShapeEncoding) -> Value {
    let wire: Vec<Vec<WireShape>> = frames
        .iter()
        .map(|shapes| shapes.iter().map(|s| encode_shape(s, encoding)).collect())
        .collect();
    serde_json::to_value(wire).unwrap_or(Value::Null)
}

/// Decode a stored payload into per-frame shape lists.
///
/// Returns `None` when the payload is not a list of lists of shapes.
/// Individual shapes missing required fields are dropped.
pub fn decode_frames(data: &Value, encoding: ShapeEncoding) -> Option<Vec<Vec<Shape>>> {
    let wire: Vec<Vec<WireShape>> = match serde_json::from_value(data.clone()) {
        Ok(wire) => wire,
        Err(e) => {
            log::warn!("Malformed shape data: {}", e);
            return None;
        }
    };
    Some(
        wire.iter()
            .map(|frame| {
                frame
                    .iter()
                    .filter_map(|w| {
                        let shape = decode_shape(w, encoding);
                        if shape.is_none() {
                            log::warn!("Dropping incomplete shape {:?}", w);
                        }
                        shape
                    })
                    .collect()
            })
            .collect(),
    )
}

/// Metadata submitted alongside shape annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMetadata {
    #[serde(rename = "CanvasDims")]
    pub canvas_dims: Option<[u32; 2]>,
    #[serde(rename = "Categories")]
    pub categories: Vec<String>,
}
