//! Detection-to-track tool: assigns track IDs to detections computed
//! upstream, one click per frame.

use serde_json::Value;

use crate::canvas::{Scene, Stage};
use crate::error::Result;
use crate::geometry::Point;
use crate::keybindings::KeyBindings;
use crate::keyboard::{Key, KeyEvent, KeyKind};
use crate::model::{ItemMeta, decode_detection_frames};
use crate::session::{ItemFormat, Payload, Request, ToolAdapter, ToolContext, ToolPurpose};
use crate::track::{TrackClick, TrackEngine};

/// Adapter for the detection-to-track tool.
///
/// The second input dataset holds the detections to link. Stored tracks
/// from the output dataset take precedence over them, whichever arrives first.
#[derive(Debug)]
pub struct TrackTool {
    engine: TrackEngine,
    stage: Stage,
    scene: Scene,
    end_track_key: Key,
}

impl TrackTool {
    pub fn new(bindings: &KeyBindings) -> Self {
        Self {
            engine: TrackEngine::new(),
            stage: Stage::new(),
            scene: Scene::default(),
            end_track_key: bindings.end_track,
        }
    }

    pub fn engine(&self) -> &TrackEngine {
        &self.engine
    }

    /// Close the active track and go to the first frame still needing labels,
    /// or re-show the current frame when everything is labeled.
    pub fn end_track(&mut self, ctx: &mut ToolContext) {
        if let Some(frame) = self.engine.end_track().or(ctx.frame_idx) {
            ctx.go_to_frame(frame);
        }
    }

    fn apply_fresh(&mut self, purpose: ToolPurpose, value: Value) {
        match purpose {
            ToolPurpose::FreshDetections => match decode_detection_frames(&value) {
                Some(frames) => {
                    self.engine.apply_fresh_detections(frames);
                }
                None => log::warn!("Ignoring malformed detections"),
            },
            ToolPurpose::FreshMetadata => {
                self.engine.apply_fresh_metadata(value);
            }
            other => log::debug!("Track tool ignores {:?}", other),
        }
    }
}

impl ToolAdapter for TrackTool {
    fn on_update(&mut self, ctx: &mut ToolContext) {
        self.engine.reset(ctx.num_frames);
        let (Some(response), Some(detections)) = (ctx.response, ctx.annoset.inputs.get(1)) else {
            log::warn!("Annotation set {} has no detection input", ctx.annoset.id);
            return;
        };
        let (dataset, key) = (detections.id, response.key.clone());
        let cache_bust = Some(crate::session::cache_bust());
        ctx.fetch(
            ToolPurpose::FreshDetections,
            Request::GetItem {
                dataset,
                key: key.clone(),
                format: ItemFormat::Json,
                cache_bust,
            },
        );
        ctx.fetch(
            ToolPurpose::FreshMetadata,
            Request::GetItem {
                dataset,
                key,
                format: ItemFormat::Meta,
                cache_bust,
            },
        );
    }

    fn on_item_data(&mut self, data: Value, meta: Option<&ItemMeta>, ctx: &mut ToolContext) {
        let Some(frames) = decode_detection_frames(&data) else {
            return;
        };
        let metadata = meta.and_then(|m| serde_json::to_value(m).ok());
        if self.engine.apply_existing(frames, metadata) {
            self.render(ctx);
        }
    }

    fn on_tool_data(&mut self, purpose: ToolPurpose, result: Result<Payload>, ctx: &mut ToolContext) {
        match result.and_then(Payload::into_json) {
            Ok(value) => {
                self.apply_fresh(purpose, value);
                self.render(ctx);
            }
            Err(e) => ctx.report_error(e.user_message()),
        }
    }

    fn on_image_loaded(&mut self, ctx: &mut ToolContext) {
        if let Some(dims) = ctx.image_dims {
            self.stage.attach_image(dims);
        }
        self.render(ctx);
    }

    fn reset_frame(&mut self) {
        self.stage.detach();
        self.scene = Scene::default();
    }

    fn annotate_data(&self, _ctx: &ToolContext) -> (Value, Option<Value>) {
        self.engine.annotate_data()
    }

    fn handle_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext) -> bool {
        if event.kind != KeyKind::Release || event.input_focused || event.key != self.end_track_key
        {
            return false;
        }
        self.end_track(ctx);
        true
    }

    fn click(&mut self, display: Point, ctx: &mut ToolContext) {
        let Some(frame) = ctx.frame_idx else {
            return;
        };
        if !self.stage.is_attached() {
            return;
        }
        let p = self.stage.to_natural(display);
        match self.engine.click(frame, p) {
            TrackClick::Unlabeled { .. } => self.render(ctx),
            TrackClick::Assigned { next_frame, .. } => ctx.go_to_frame(next_frame),
        }
    }

    fn resize_display(&mut self, width: f64, height: f64, ctx: &mut ToolContext) {
        self.stage.resize_display(width, height);
        self.render(ctx);
    }

    fn render(&mut self, ctx: &mut ToolContext) {
        self.scene = match ctx.frame_idx {
            Some(frame) => self.engine.render(frame, &self.stage),
            None => Scene::default(),
        };
    }

    fn scene(&self) -> Option<&Scene> {
        Some(&self.scene)
    }

    fn params_json(&self) -> Option<Value> {
        None
    }
}
