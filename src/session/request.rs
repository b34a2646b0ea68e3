//! Backend requests issued by the session, and their completions.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geometry::Dims;
use crate::model::{AnnotateRequest, AnnotateResponse};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Representation of an item to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFormat {
    /// Source metadata (dimensions, framerate, duration)
    Meta,
    /// Stored JSON payload
    Json,
}

impl ItemFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ItemFormat::Meta => "meta",
            ItemFormat::Json => "json",
        }
    }
}

/// A backend call. The session only describes calls; a driver executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `GET /annotate-datasets/{id}`
    GetAnnotationSet { annoset: i64 },
    /// `GET {annotate_url}[?key=K]`
    NextResponse { url: String, key: Option<String> },
    /// `GET /datasets/{id}/items/{key}/get?format=...`
    GetItem {
        dataset: i64,
        key: String,
        format: ItemFormat,
        /// Cache-busting timestamp in milliseconds
        cache_bust: Option<u64>,
    },
    /// `GET /datasets/{id}/items`
    ListItems { dataset: i64 },
    /// `POST {annotate_url}`
    Annotate { url: String, body: AnnotateRequest },
    /// `POST /annotate-datasets/{id}` with `{Params}`
    SaveParams { annoset: i64, params: String },
    /// Frame image of an item; the completion carries its natural size
    LoadFrameImage {
        dataset: i64,
        key: String,
        /// Frame index for video sources, `None` for still images
        video_frame: Option<usize>,
    },
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::Annotate { .. } | Request::SaveParams { .. } => Method::Post,
            _ => Method::Get,
        }
    }

    /// Path relative to the server root.
    pub fn path(&self) -> String {
        match self {
            Request::GetAnnotationSet { annoset } | Request::SaveParams { annoset, .. } => {
                format!("/annotate-datasets/{}", annoset)
            }
            Request::NextResponse { url, .. } | Request::Annotate { url, .. } => url.clone(),
            Request::GetItem { dataset, key, .. } => {
                format!("/datasets/{}/items/{}/get", dataset, key)
            }
            Request::ListItems { dataset } => format!("/datasets/{}/items", dataset),
            Request::LoadFrameImage {
                dataset,
                key,
                video_frame,
            } => match video_frame {
                Some(_) => format!("/datasets/{}/items/{}/get-video-frame", dataset, key),
                None => format!("/datasets/{}/items/{}/get", dataset, key),
            },
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Request::NextResponse { key: Some(key), .. } => vec![("key", key.clone())],
            Request::GetItem {
                format, cache_bust, ..
            } => {
                let mut query = vec![("format", format.as_str().to_string())];
                if let Some(t) = cache_bust {
                    query.push(("t", t.to_string()));
                }
                query
            }
            Request::LoadFrameImage { video_frame, .. } => match video_frame {
                Some(idx) => vec![("idx", idx.to_string())],
                None => vec![("format", "jpeg".to_string())],
            },
            _ => Vec::new(),
        }
    }

    /// JSON body of a POST.
    pub fn body(&self) -> Option<Value> {
        match self {
            Request::Annotate { body, .. } => serde_json::to_value(body).ok(),
            Request::SaveParams { params, .. } => Some(serde_json::json!({ "Params": params })),
            _ => None,
        }
    }

    /// Whether the completion carries image bytes rather than JSON.
    pub fn wants_image(&self) -> bool {
        matches!(self, Request::LoadFrameImage { .. })
    }
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Parsed JSON body (`Null` for an empty body)
    Json(Value),
    /// Natural dimensions of a loaded image
    Image(Dims),
}

impl Payload {
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Image(_) => Err(Error::unexpected("JSON body")),
        }
    }

    pub fn parse<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_json()?)?)
    }

    pub fn image_dims(&self) -> Result<Dims> {
        match self {
            Payload::Image(dims) => Ok(*dims),
            Payload::Json(_) => Err(Error::unexpected("image")),
        }
    }
}

/// Requests issued by a tool adapter on its own behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPurpose {
    /// Detections computed upstream for the current item
    FreshDetections,
    /// Metadata of the upstream detection item
    FreshMetadata,
    /// The stored feature collection
    FeatureCollection,
    /// Submission of the feature collection
    SaveFeatures,
}

/// Why a request was issued; decides how its completion is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Purpose {
    AnnotationSet,
    Response,
    ItemMeta { response: AnnotateResponse },
    ExistingData,
    KeyList { index: i64 },
    Submit,
    SaveParams,
    FrameImage { frame_seq: u64 },
    Tool(ToolPurpose),
}

impl Purpose {
    /// Requests that choose which item is shown. Only the latest navigation counts.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Purpose::Response | Purpose::ItemMeta { .. } | Purpose::KeyList { .. }
        )
    }

    /// Requests whose result belongs to the item that was current when issued.
    pub fn is_item_scoped(&self) -> bool {
        matches!(self, Purpose::ExistingData | Purpose::Tool(_))
    }
}

/// Identifies an issued request. Hand it back with the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: u64,
    pub purpose: Purpose,
    /// Navigation sequence or item generation at issue time, per purpose
    pub generation: u64,
}
