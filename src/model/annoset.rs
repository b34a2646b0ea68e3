//! Annotation set descriptor: tool, output dataset and input datasets.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Data type of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Image,
    Video,
    Detection,
    Shape,
    Int,
    GeoJson,
    /// Any data type the annotation tools do not interpret
    Other(String),
}

impl From<String> for DataType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "image" => DataType::Image,
            "video" => DataType::Video,
            "detection" => DataType::Detection,
            "shape" => DataType::Shape,
            "int" => DataType::Int,
            "geojson" => DataType::GeoJson,
            _ => DataType::Other(s),
        }
    }
}

impl From<DataType> for String {
    fn from(t: DataType) -> Self {
        match t {
            DataType::Image => "image".to_string(),
            DataType::Video => "video".to_string(),
            DataType::Detection => "detection".to_string(),
            DataType::Shape => "shape".to_string(),
            DataType::Int => "int".to_string(),
            DataType::GeoJson => "geojson".to_string(),
            DataType::Other(s) => s,
        }
    }
}

/// Annotation tool selected for an annotation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tool {
    Shape,
    Int,
    DetectionToTrack,
    GeoJson,
    /// A tool this engine has no adapter for
    Other(String),
}

impl From<String> for Tool {
    fn from(s: String) -> Self {
        match s.as_str() {
            "shape" => Tool::Shape,
            "int" => Tool::Int,
            "detection-to-track" => Tool::DetectionToTrack,
            "geojson" => Tool::GeoJson,
            _ => Tool::Other(s),
        }
    }
}

impl From<Tool> for String {
    fn from(t: Tool) -> Self {
        match t {
            Tool::Shape => "shape".to_string(),
            Tool::Int => "int".to_string(),
            Tool::DetectionToTrack => "detection-to-track".to_string(),
            Tool::GeoJson => "geojson".to_string(),
            Tool::Other(s) => s,
        }
    }
}

/// A dataset as described by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DataType")]
    pub data_type: DataType,
}

impl Dataset {
    pub fn new(id: i64, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
        }
    }
}

/// A configured labeling task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(rename = "ID")]
    pub id: i64,
    /// Output dataset receiving the annotations
    #[serde(rename = "Dataset")]
    pub dataset: Dataset,
    /// Source datasets, in order; the first one is displayed
    #[serde(rename = "InputDatasets", alias = "Inputs", default)]
    pub inputs: Vec<Dataset>,
    #[serde(rename = "Tool")]
    pub tool: Tool,
    /// Tool parameters as a JSON string
    #[serde(rename = "Params", default)]
    pub params: Option<String>,
}

impl AnnotationSet {
    /// Endpoint for fetching and submitting annotations.
    pub fn annotate_url(&self) -> String {
        format!("/annotate-datasets/{}/annotate", self.id)
    }

    /// The displayed source dataset.
    pub fn source(&self) -> Option<&Dataset> {
        self.inputs.first()
    }

    /// Data type of the displayed source, if any.
    pub fn source_type(&self) -> Option<&DataType> {
        self.source().map(|ds| &ds.data_type)
    }

    /// Data type of the output dataset.
    pub fn data_type(&self) -> &DataType {
        &self.dataset.data_type
    }

    /// Parse the tool parameters leniently.
    ///
    /// Missing or malformed parameters yield `None`; callers fill in defaults.
    pub fn parse_params<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.params.as_deref()?;
        match serde_json::from_str::<Option<T>>(raw) {
            Ok(params) => params,
            Err(e) => {
                log::debug!("Ignoring unparseable params for annotation set {}: {}", self.id, e);
                None
            }
        }
    }
}
