//! Item-level payloads exchanged with the backend.

use serde::{Deserialize, Serialize};

use super::DataType;

/// Answer of the annotate endpoint: which item to label next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateResponse {
    /// Key of the item to label
    #[serde(rename = "Key")]
    pub key: String,
    /// Whether the output dataset already has annotations for this key
    #[serde(rename = "IsExisting", default)]
    pub is_existing: bool,
    /// Item ID in the output dataset, set when annotating an existing key
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl AnnotateResponse {
    pub fn new(key: impl Into<String>, is_existing: bool) -> Self {
        Self {
            key: key.into(),
            is_existing,
            id: None,
        }
    }

    /// Whether stored annotation data should be fetched for this item.
    pub fn has_existing(&self) -> bool {
        self.is_existing || self.id.is_some()
    }
}

/// Source item metadata. Images carry none of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMeta {
    #[serde(rename = "Dims", default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<[u32; 2]>,
    #[serde(rename = "Framerate", default, skip_serializing_if = "Option::is_none")]
    pub framerate: Option<[u32; 2]>,
    #[serde(rename = "Duration", default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Number of frames of an item: 1 for images,
/// `floor(duration * framerate_num / framerate_den)` for video.
///
/// Never returns zero, so frame navigation modulo the count stays defined.
pub fn frame_count(source_type: &DataType, meta: &ItemMeta) -> usize {
    if *source_type != DataType::Video {
        return 1;
    }
    let frames = match (meta.duration, meta.framerate) {
        (Some(duration), Some([num, den])) if den > 0 => {
            (duration * f64::from(num) / f64::from(den)).floor()
        }
        _ => 0.0,
    };
    if frames < 1.0 {
        log::warn!("Video metadata yields no frames ({:?}), using a single frame", meta);
        return 1;
    }
    frames as usize
}

/// Submission body for the annotate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    #[serde(rename = "Key")]
    pub key: String,
    /// JSON-encoded annotation payload
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "Format")]
    pub format: String,
    /// JSON-encoded metadata, omitted when the tool has none
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl AnnotateRequest {
    /// Build a JSON-format submission.
    pub fn json(
        key: impl Into<String>,
        data: &serde_json::Value,
        metadata: Option<&serde_json::Value>,
    ) -> Self {
        Self {
            key: key.into(),
            data: data.to_string(),
            format: "json".to_string(),
            metadata: metadata.map(|m| m.to_string()),
        }
    }
}

/// Entry of a dataset item listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemListing {
    #[serde(rename = "Key")]
    pub key: String,
}
