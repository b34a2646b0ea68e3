//! Shape tool: boxes, lines and points drawn per frame.

use serde::Deserialize;
use serde_json::Value;

use crate::canvas::{Scene, ShapeCanvas, ToolMode};
use crate::geometry::Point;
use crate::keybindings::KeyBindings;
use crate::keyboard::KeyEvent;
use crate::model::{
    AnnotationSet, ItemMeta, Shape, ShapeEncoding, ShapeMetadata, decode_frames, encode_frames,
};
use crate::session::{ToolAdapter, ToolContext};

/// Shape tool parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeParams {
    pub mode: ToolMode,
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
struct RawShapeParams {
    #[serde(rename = "Mode", default)]
    mode: Option<String>,
    #[serde(rename = "Categories", default)]
    categories: Option<Vec<String>>,
}

impl ShapeParams {
    pub fn from_annoset(annoset: &AnnotationSet) -> Self {
        match annoset.parse_params::<RawShapeParams>() {
            Some(raw) => Self {
                mode: ToolMode::from_param(raw.mode.as_deref().unwrap_or_default()),
                categories: raw.categories.unwrap_or_default(),
            },
            None => Self::default(),
        }
    }

    /// Categories as the editable comma-separated string.
    pub fn categories_str(&self) -> String {
        self.categories.join(",")
    }

    /// Split the comma-separated string; an empty string is no categories.
    pub fn split_categories(text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        text.split(',').map(str::to_string).collect()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "Mode": self.mode.as_str(),
            "Categories": self.categories,
        })
    }
}

/// Adapter for the shape tool.
#[derive(Debug)]
pub struct ShapeTool {
    params: ShapeParams,
    encoding: ShapeEncoding,
    shapes: Vec<Vec<Shape>>,
    canvas: ShapeCanvas,
}

impl ShapeTool {
    pub fn new(annoset: &AnnotationSet, bindings: KeyBindings) -> Self {
        let params = ShapeParams::from_annoset(annoset);
        let encoding = ShapeEncoding::from_data_type(annoset.data_type());
        let canvas = ShapeCanvas::new(params.mode, params.categories.clone(), bindings);
        Self {
            params,
            encoding,
            shapes: Vec::new(),
            canvas,
        }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    pub fn encoding(&self) -> ShapeEncoding {
        self.encoding
    }

    pub fn shapes(&self) -> &[Vec<Shape>] {
        &self.shapes
    }

    pub fn canvas(&self) -> &ShapeCanvas {
        &self.canvas
    }

    /// Shapes of the displayed frame.
    pub fn frame_shapes(&self, ctx: &ToolContext) -> &[Shape] {
        ctx.frame_idx
            .and_then(|frame| self.shapes.get(frame))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn set_mode(&mut self, mode: ToolMode, ctx: &ToolContext) {
        self.params.mode = mode;
        let shapes = frame_slice(&self.shapes, ctx);
        self.canvas.set_mode(mode, shapes);
    }

    /// Apply an edited comma-separated category list.
    pub fn set_categories_str(&mut self, text: &str, ctx: &ToolContext) {
        self.params.categories = ShapeParams::split_categories(text);
        self.canvas.set_categories(self.params.categories.clone());
        self.canvas.set_mode(self.params.mode, frame_slice(&self.shapes, ctx));
    }

    /// Category assigned to newly drawn shapes.
    pub fn set_category(&mut self, category: &str) -> bool {
        self.canvas.set_category(category)
    }

    pub fn set_selected_category(&mut self, category: &str, ctx: &ToolContext) -> bool {
        let Some(shapes) = frame_vec(&mut self.shapes, ctx) else {
            return false;
        };
        self.canvas.set_selected_category(shapes, category)
    }

    pub fn set_selected_track_id(&mut self, text: &str, ctx: &ToolContext) -> bool {
        let Some(shapes) = frame_vec(&mut self.shapes, ctx) else {
            return false;
        };
        self.canvas.set_selected_track_id(shapes, text)
    }

    /// The "Delete" button next to the selection.
    pub fn delete_selection(&mut self, ctx: &ToolContext) -> Option<Shape> {
        let shapes = frame_vec(&mut self.shapes, ctx)?;
        self.canvas.delete_selection(shapes)
    }

    pub fn cancel_draw(&mut self, ctx: &ToolContext) -> bool {
        self.canvas.cancel_draw(frame_slice(&self.shapes, ctx))
    }
}

fn frame_slice<'a>(shapes: &'a [Vec<Shape>], ctx: &ToolContext) -> &'a [Shape] {
    ctx.frame_idx
        .and_then(|frame| shapes.get(frame))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn frame_vec<'a>(shapes: &'a mut [Vec<Shape>], ctx: &ToolContext) -> Option<&'a mut Vec<Shape>> {
    ctx.frame_idx.and_then(|frame| shapes.get_mut(frame))
}

impl ToolAdapter for ShapeTool {
    fn on_update(&mut self, ctx: &mut ToolContext) {
        self.shapes = vec![Vec::new(); ctx.num_frames];
    }

    fn on_item_data(&mut self, data: Value, _meta: Option<&ItemMeta>, ctx: &mut ToolContext) {
        if data.as_array().is_some_and(|frames| frames.is_empty()) {
            return;
        }
        let Some(mut frames) = decode_frames(&data, self.encoding) else {
            return;
        };
        if frames.len() != ctx.num_frames {
            log::warn!(
                "Stored shapes cover {} frames, item has {}",
                frames.len(),
                ctx.num_frames
            );
            frames.resize_with(ctx.num_frames, Vec::new);
        }
        self.shapes = frames;
        if ctx.is_rendered() {
            self.render(ctx);
        }
    }

    fn on_image_loaded(&mut self, ctx: &mut ToolContext) {
        if let Some(dims) = ctx.image_dims {
            self.canvas.attach_image(dims);
        }
        self.render(ctx);
    }

    fn reset_frame(&mut self) {
        self.canvas.reset_frame();
    }

    fn annotate_data(&self, ctx: &ToolContext) -> (Value, Option<Value>) {
        let data = encode_frames(&self.shapes, self.encoding);
        let metadata = ShapeMetadata {
            canvas_dims: ctx.image_dims.map(|d| [d.width, d.height]),
            categories: self.params.categories.clone(),
        };
        (data, serde_json::to_value(metadata).ok())
    }

    fn handle_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext) -> bool {
        match frame_vec(&mut self.shapes, ctx) {
            Some(shapes) => self.canvas.handle_key(shapes, event),
            None => false,
        }
    }

    fn click(&mut self, display: Point, ctx: &mut ToolContext) {
        if let Some(shapes) = frame_vec(&mut self.shapes, ctx) {
            self.canvas.click(shapes, display);
        }
    }

    fn pointer_move(&mut self, display: Point, ctx: &mut ToolContext) {
        self.canvas.pointer_move(frame_slice(&self.shapes, ctx), display);
    }

    fn drag_start(&mut self, display: Point, ctx: &mut ToolContext) -> bool {
        self.canvas.drag_start(frame_slice(&self.shapes, ctx), display)
    }

    fn drag_move(&mut self, display: Point, ctx: &mut ToolContext) {
        if let Some(shapes) = frame_vec(&mut self.shapes, ctx) {
            self.canvas.drag_move(shapes, display);
        }
    }

    fn drag_end(&mut self, ctx: &mut ToolContext) {
        self.canvas.drag_end(frame_slice(&self.shapes, ctx));
    }

    fn resize_display(&mut self, width: f64, height: f64, ctx: &mut ToolContext) {
        self.canvas.resize_display(width, height);
        self.render(ctx);
    }

    fn render(&mut self, ctx: &mut ToolContext) {
        self.canvas.render(frame_slice(&self.shapes, ctx));
    }

    fn scene(&self) -> Option<&Scene> {
        Some(self.canvas.scene())
    }

    fn params_json(&self) -> Option<Value> {
        Some(self.params.to_json())
    }
}
