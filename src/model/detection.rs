//! Detections as consumed by the track tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{Point, Rect};

/// An axis-aligned detection on one frame, optionally assigned to a track.
///
/// Fields this engine does not interpret (score, metadata, ...) are kept
/// in `extra` so a round trip through the track tool does not lose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "Left")]
    pub left: i64,
    #[serde(rename = "Top")]
    pub top: i64,
    #[serde(rename = "Right")]
    pub right: i64,
    #[serde(rename = "Bottom")]
    pub bottom: i64,
    #[serde(
        rename = "TrackID",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::de_track_id"
    )]
    pub track_id: Option<i64>,
    #[serde(rename = "Category", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Detection {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            track_id: None,
            category: None,
            extra: Map::new(),
        }
    }

    pub fn with_track_id(mut self, track_id: i64) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Rectangle in natural pixels.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left as f64,
            self.top as f64,
            (self.right - self.left) as f64,
            (self.bottom - self.top) as f64,
        )
    }

    /// Anchor used for nearest-detection matching.
    pub fn top_left(&self) -> Point {
        Point::new(self.left as f64, self.top as f64)
    }

    pub fn is_labeled(&self) -> bool {
        self.track_id.is_some()
    }
}

/// Decode a per-frame detection payload.
///
/// `null` frames are read as empty. Returns `None` when the payload
/// is not a list of detection lists.
pub fn decode_detection_frames(data: &Value) -> Option<Vec<Vec<Detection>>> {
    match serde_json::from_value::<Vec<Option<Vec<Detection>>>>(data.clone()) {
        Ok(frames) => Some(frames.into_iter().map(Option::unwrap_or_default).collect()),
        Err(e) => {
            log::warn!("Malformed detection data: {}", e);
            None
        }
    }
}
