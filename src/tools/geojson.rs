//! GeoJSON tool: edits one feature collection stored under a fixed key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::GEOJSON_ITEM_KEY;
use crate::error::Result;
use crate::model::{AnnotateRequest, AnnotationSet, ItemMeta};
use crate::session::{ItemFormat, Payload, Request, ToolAdapter, ToolContext, ToolPurpose};

const FEATURE_COLLECTION: &str = "FeatureCollection";

/// A GeoJSON feature collection. Features are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Value>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: FEATURE_COLLECTION.to_string(),
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    /// Read a payload, returning `None` unless it is a feature collection.
    pub fn from_value(value: Value) -> Option<Self> {
        let collection: Self = serde_json::from_value(value).ok()?;
        (collection.kind == FEATURE_COLLECTION).then_some(collection)
    }

    /// Append a feature; nested collections are flattened into this one.
    pub fn add(&mut self, feature: Value) {
        match Self::from_value(feature.clone()) {
            Some(nested) => nested.features.into_iter().for_each(|f| self.add(f)),
            None => self.features.push(feature),
        }
    }
}

#[derive(Deserialize)]
struct RawGeoJsonParams {
    #[serde(rename = "TileURL", default)]
    tile_url: Option<String>,
}

/// Adapter for the GeoJSON tool.
#[derive(Debug)]
pub struct GeoJsonTool {
    tile_url: String,
    collection: FeatureCollection,
    loaded: bool,
}

impl GeoJsonTool {
    pub fn new(annoset: &AnnotationSet) -> Self {
        let tile_url = annoset
            .parse_params::<RawGeoJsonParams>()
            .and_then(|raw| raw.tile_url)
            .unwrap_or_default();
        Self {
            tile_url,
            collection: FeatureCollection::default(),
            loaded: false,
        }
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Whether the stored collection has been fetched (or found missing).
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tile_url(&self) -> &str {
        &self.tile_url
    }

    pub fn set_tile_url(&mut self, url: impl Into<String>) {
        self.tile_url = url.into();
    }

    /// The map is only shown once a tile server is configured.
    pub fn shows_map(&self) -> bool {
        !self.tile_url.is_empty()
    }

    pub fn add_feature(&mut self, feature: Value) {
        self.collection.add(feature);
    }

    pub fn replace_feature(&mut self, index: usize, feature: Value) -> bool {
        match self.collection.features.get_mut(index) {
            Some(slot) => {
                *slot = feature;
                true
            }
            None => false,
        }
    }

    pub fn remove_feature(&mut self, index: usize) -> Option<Value> {
        (index < self.collection.features.len()).then(|| self.collection.features.remove(index))
    }

    /// Store the collection in the output dataset.
    pub fn save(&self, ctx: &mut ToolContext) {
        let (data, _) = self.annotate_data(ctx);
        let url = ctx.annoset.annotate_url();
        ctx.fetch(
            ToolPurpose::SaveFeatures,
            Request::Annotate {
                url,
                body: AnnotateRequest::json(GEOJSON_ITEM_KEY, &data, None),
            },
        );
    }
}

impl ToolAdapter for GeoJsonTool {
    fn on_created_ready(&mut self, ctx: &mut ToolContext) {
        let dataset = ctx.annoset.dataset.id;
        ctx.fetch(
            ToolPurpose::FeatureCollection,
            Request::GetItem {
                dataset,
                key: GEOJSON_ITEM_KEY.to_string(),
                format: ItemFormat::Json,
                cache_bust: Some(crate::session::cache_bust()),
            },
        );
    }

    fn on_update(&mut self, _ctx: &mut ToolContext) {}

    fn on_item_data(&mut self, _data: Value, _meta: Option<&ItemMeta>, _ctx: &mut ToolContext) {}

    fn on_image_loaded(&mut self, _ctx: &mut ToolContext) {}

    fn on_tool_data(&mut self, purpose: ToolPurpose, result: Result<Payload>, ctx: &mut ToolContext) {
        match (purpose, result.and_then(Payload::into_json)) {
            (ToolPurpose::FeatureCollection, Ok(value)) => {
                self.loaded = true;
                match FeatureCollection::from_value(value) {
                    Some(collection) => {
                        log::info!("Loaded {} features", collection.features.len());
                        self.collection = collection;
                    }
                    None => log::warn!("Stored geojson is not a feature collection, ignoring"),
                }
            }
            (ToolPurpose::FeatureCollection, Err(e)) if e.is_no_such_item() => {
                self.loaded = true;
                log::debug!("No stored feature collection yet");
            }
            (ToolPurpose::SaveFeatures, Ok(_)) => {
                log::info!("Saved {} features", self.collection.features.len());
            }
            (_, Err(e)) => ctx.report_error(e.user_message()),
            (other, Ok(_)) => log::debug!("GeoJSON tool ignores {:?}", other),
        }
    }

    fn annotate_data(&self, _ctx: &ToolContext) -> (Value, Option<Value>) {
        let data = serde_json::to_value(&self.collection).unwrap_or(Value::Null);
        (data, None)
    }

    fn params_json(&self) -> Option<Value> {
        Some(serde_json::json!({ "TileURL": self.tile_url }))
    }
}
