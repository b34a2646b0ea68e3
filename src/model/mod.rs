//! Data models for the annotation engine.

mod annoset;
mod detection;
mod item;
mod shape;

pub use annoset::{AnnotationSet, DataType, Dataset, Tool};
pub use detection::{Detection, decode_detection_frames};
pub use item::{AnnotateRequest, AnnotateResponse, ItemListing, ItemMeta, frame_count};
pub use shape::{
    Shape, ShapeEncoding, ShapeMetadata, ShapeType, WireShape, decode_frames, decode_shape,
    encode_frames, encode_shape,
};

use serde::{Deserialize, Deserializer};

/// Parse the leading integer of a string, the way form input is coerced.
///
/// Leading whitespace and a sign are accepted, trailing garbage is ignored
/// (`"12abc"` is 12). Returns `None` when no digit starts the string.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: &str = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| sign * v)
}

/// Track IDs of zero mean "no track", matching how the backend omits them.
pub(crate) fn de_track_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.filter(|&id| id != 0))
}
