//! Global constants for the annotation engine

use crate::canvas::Color;

/// Stroke width of committed shapes and detections (natural pixels).
pub const STROKE_WIDTH: f64 = 3.0;

/// Hit stroke width of boxes; wider than the visible stroke so thin boxes stay clickable.
pub const BOX_HIT_STROKE_WIDTH: f64 = 20.0;

/// Radius of a point marker.
pub const POINT_RADIUS: f64 = 5.0;

/// Stroke width of a point marker.
pub const POINT_STROKE_WIDTH: f64 = 2.0;

/// Radius of a box resize handle.
pub const HANDLE_RADIUS: f64 = 10.0;

/// Stroke width of a box resize handle.
pub const HANDLE_STROKE_WIDTH: f64 = 2.0;

/// Size of the provisional shape created by the first click.
pub const PROVISIONAL_SIZE: f64 = 1.0;

/// Committed shape, not selected.
pub const SHAPE_COLOR: Color = Color::Red;

/// Selected shape.
pub const SELECTED_COLOR: Color = Color::Orange;

/// Shape under the pointer.
pub const HOVER_COLOR: Color = Color::Yellow;

/// Provisional shape while drawing.
pub const DRAWING_COLOR: Color = Color::Yellow;

/// Resize handle fill.
pub const HANDLE_FILL: Color = Color::Blue;

/// Resize handle outline.
pub const HANDLE_STROKE: Color = Color::Black;

/// Detection that already carries a track ID.
pub const LABELED_DETECTION_COLOR: Color = Color::Red;

/// Detection without a track ID.
pub const UNLABELED_DETECTION_COLOR: Color = Color::Yellow;

/// Label range used by the integer tool when none is configured.
pub const DEFAULT_INT_RANGE: i64 = 2;

/// Key of the single item holding a GeoJSON feature collection.
pub const GEOJSON_ITEM_KEY: &str = "geojson";

/// Server message when the unlabeled pool is exhausted.
pub const EVERYTHING_LABELED: &str = "everything has been labeled already";

/// Server message when an item does not exist.
pub const NO_SUCH_ITEM: &str = "no such item";

/// Shown when the unlabeled pool is exhausted.
pub const MSG_EVERYTHING_LABELED: &str = "Everything has been labeled already. Switch to View Existing Labels to go through previously annotated items.";

/// Shown when the output dataset has no items to iterate.
pub const MSG_NO_LABELS: &str = "There are no labels in this dataset yet. Switch to Annotate New Items to add new labels based on the source image dataset.";
