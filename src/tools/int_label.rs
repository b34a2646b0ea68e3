//! Integer label tool: one integer per frame, picked by button, digit key
//! or free text.

use serde_json::{Map, Value};

use crate::constants::DEFAULT_INT_RANGE;
use crate::keyboard::{KeyEvent, KeyKind};
use crate::model::{AnnotationSet, ItemMeta, parse_leading_int};
use crate::session::{ToolAdapter, ToolContext};

/// Coerce a stored `Range` value. Missing, null, zero and empty values fall
/// back to the default; strings are parsed by their leading integer.
fn parse_range(value: &Value) -> i64 {
    match value {
        Value::Null => DEFAULT_INT_RANGE,
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
            Some(0) | None => DEFAULT_INT_RANGE,
            Some(range) => range,
        },
        Value::String(s) if s.is_empty() => DEFAULT_INT_RANGE,
        Value::String(s) => parse_leading_int(s).unwrap_or(0),
        other => {
            log::warn!("Ignoring int Range {}", other);
            DEFAULT_INT_RANGE
        }
    }
}

/// Adapter for the integer tool.
#[derive(Debug)]
pub struct IntTool {
    range: i64,
    /// Stored params; keys other than `Range` are saved back untouched
    params: Map<String, Value>,
    /// Label text per frame; empty when unset
    labels: Vec<String>,
}

impl IntTool {
    pub fn new(annoset: &AnnotationSet) -> Self {
        let params = annoset
            .parse_params::<Map<String, Value>>()
            .unwrap_or_default();
        let range = params.get("Range").map_or(DEFAULT_INT_RANGE, parse_range);
        Self {
            range,
            params,
            labels: Vec::new(),
        }
    }

    pub fn range(&self) -> i64 {
        self.range
    }

    pub fn set_range(&mut self, range: i64) {
        self.range = range;
    }

    /// Values offered as buttons; empty in text-input mode.
    pub fn buttons(&self) -> std::ops::Range<i64> {
        0..self.range.max(0)
    }

    pub fn uses_text_input(&self) -> bool {
        self.range <= 0
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, frame: usize) -> Option<&str> {
        self.labels.get(frame).map(String::as_str)
    }

    /// Label the current frame with `value` and move on.
    pub fn submit_button(&mut self, value: i64, ctx: &mut ToolContext) {
        if self.set_input(&value.to_string(), ctx) {
            ctx.finish_frame();
        }
    }

    /// Edit the free-text label of the current frame.
    pub fn set_input(&mut self, text: &str, ctx: &ToolContext) -> bool {
        let Some(label) = ctx.frame_idx.and_then(|frame| self.labels.get_mut(frame)) else {
            return false;
        };
        *label = text.to_string();
        true
    }

    /// Accept the free-text label of the current frame.
    pub fn submit_input(&mut self, ctx: &mut ToolContext) {
        if ctx.frame_idx.is_some() {
            ctx.finish_frame();
        }
    }
}

impl ToolAdapter for IntTool {
    fn on_update(&mut self, ctx: &mut ToolContext) {
        self.labels = vec![String::new(); ctx.num_frames];
    }

    fn on_item_data(&mut self, data: Value, _meta: Option<&ItemMeta>, ctx: &mut ToolContext) {
        let Value::Array(values) = data else {
            log::warn!("Malformed int data: {}", data);
            return;
        };
        if values.is_empty() {
            return;
        }
        let mut labels: Vec<String> = values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        if labels.len() != ctx.num_frames {
            log::warn!(
                "Stored labels cover {} frames, item has {}",
                labels.len(),
                ctx.num_frames
            );
            labels.resize(ctx.num_frames, String::new());
        }
        self.labels = labels;
    }

    fn on_image_loaded(&mut self, _ctx: &mut ToolContext) {}

    fn annotate_data(&self, _ctx: &ToolContext) -> (Value, Option<Value>) {
        let values: Vec<i64> = self
            .labels
            .iter()
            .map(|text| parse_leading_int(text).unwrap_or(-1))
            .collect();
        (serde_json::json!(values), None)
    }

    fn handle_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext) -> bool {
        if event.kind != KeyKind::Press || event.input_focused {
            return false;
        }
        let Some(digit) = event.key.digit() else {
            return false;
        };
        self.submit_button(i64::from(digit), ctx);
        true
    }

    fn params_json(&self) -> Option<Value> {
        let mut params = self.params.clone();
        params.insert("Range".to_string(), Value::from(self.range));
        Some(Value::Object(params))
    }
}
