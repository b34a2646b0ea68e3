//! Interface between the session controller and tool adapters.

use serde_json::Value;

use super::request::{Payload, Request, ToolPurpose};
use crate::canvas::Scene;
use crate::error::Result;
use crate::geometry::{Dims, Point};
use crate::keyboard::KeyEvent;
use crate::model::{AnnotateResponse, AnnotationSet, ItemMeta};

/// Action requested by a tool adapter, carried out by the controller
/// once the adapter call returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    Fetch { purpose: ToolPurpose, request: Request },
    GoToFrame(usize),
    FinishFrame,
    AnnotateItem,
    ReportError(String),
}

/// Read-only view of the session handed to adapter hooks, plus a queue
/// for the commands the adapter issues.
#[derive(Debug)]
pub struct ToolContext<'a> {
    pub annoset: &'a AnnotationSet,
    pub response: Option<&'a AnnotateResponse>,
    pub item_meta: Option<&'a ItemMeta>,
    pub frame_idx: Option<usize>,
    pub num_frames: usize,
    /// Natural size of the displayed frame image, once loaded
    pub image_dims: Option<Dims>,
    commands: Vec<ToolCommand>,
}

impl<'a> ToolContext<'a> {
    pub fn new(annoset: &'a AnnotationSet) -> Self {
        Self {
            annoset,
            response: None,
            item_meta: None,
            frame_idx: None,
            num_frames: 0,
            image_dims: None,
            commands: Vec::new(),
        }
    }

    /// Whether the frame image is loaded, so a render shows something.
    pub fn is_rendered(&self) -> bool {
        self.image_dims.is_some()
    }

    pub fn fetch(&mut self, purpose: ToolPurpose, request: Request) {
        self.commands.push(ToolCommand::Fetch { purpose, request });
    }

    pub fn go_to_frame(&mut self, frame: usize) {
        self.commands.push(ToolCommand::GoToFrame(frame));
    }

    pub fn finish_frame(&mut self) {
        self.commands.push(ToolCommand::FinishFrame);
    }

    pub fn annotate_item(&mut self) {
        self.commands.push(ToolCommand::AnnotateItem);
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        self.commands.push(ToolCommand::ReportError(message.into()));
    }

    pub fn commands(&self) -> &[ToolCommand] {
        &self.commands
    }

    pub(crate) fn into_commands(self) -> Vec<ToolCommand> {
        self.commands
    }
}

/// Per-tool logic plugged into the session controller.
///
/// Pointer positions are in display coordinates of the frame image.
pub trait ToolAdapter {
    /// Annotation set loaded; parameters are available.
    fn on_created_ready(&mut self, _ctx: &mut ToolContext) {}

    /// New item shown: reinitialize per-frame arrays to `ctx.num_frames`.
    fn on_update(&mut self, ctx: &mut ToolContext);

    /// Stored annotation payload for the current item.
    fn on_item_data(&mut self, data: Value, meta: Option<&ItemMeta>, ctx: &mut ToolContext);

    /// Frame image loaded; `ctx.image_dims` is set.
    fn on_image_loaded(&mut self, ctx: &mut ToolContext);

    /// Completion of a request the adapter issued itself.
    fn on_tool_data(&mut self, purpose: ToolPurpose, result: Result<Payload>, ctx: &mut ToolContext) {
        let _ = (result, ctx);
        log::debug!("Unhandled tool completion {:?}", purpose);
    }

    /// Frame about to change; drop image-dependent state.
    fn reset_frame(&mut self) {}

    /// Payload and metadata to submit for the current item.
    fn annotate_data(&self, ctx: &ToolContext) -> (Value, Option<Value>);

    /// Returns true if the key was consumed.
    fn handle_key(&mut self, _event: &KeyEvent, _ctx: &mut ToolContext) -> bool {
        false
    }

    fn click(&mut self, _display: Point, _ctx: &mut ToolContext) {}

    fn pointer_move(&mut self, _display: Point, _ctx: &mut ToolContext) {}

    fn drag_start(&mut self, _display: Point, _ctx: &mut ToolContext) -> bool {
        false
    }

    fn drag_move(&mut self, _display: Point, _ctx: &mut ToolContext) {}

    fn drag_end(&mut self, _ctx: &mut ToolContext) {}

    /// The image element was laid out at a new on-screen size.
    fn resize_display(&mut self, _width: f64, _height: f64, _ctx: &mut ToolContext) {}

    /// Rebuild the scene for the current frame.
    fn render(&mut self, _ctx: &mut ToolContext) {}

    fn scene(&self) -> Option<&Scene> {
        None
    }

    /// Parameters to persist, or `None` if the tool has none.
    fn params_json(&self) -> Option<Value>;
}
