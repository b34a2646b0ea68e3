//! Session state machine: which item and frame is shown, and when the
//! current tool's annotations are submitted.

use std::collections::VecDeque;

use super::request::{ItemFormat, Payload, Purpose, Request, Ticket};
use super::tool::{ToolAdapter, ToolCommand, ToolContext};
use crate::canvas::Scene;
use crate::config::{EngineConfig, StaleResponses};
use crate::constants::{MSG_EVERYTHING_LABELED, MSG_NO_LABELS};
use crate::error::{Error, Result};
use crate::geometry::{Dims, Point};
use crate::keybindings::KeyBindings;
use crate::keyboard::{KeyEvent, KeySubscription, KeyboardHub};
use crate::model::{
    AnnotateRequest, AnnotateResponse, AnnotationSet, DataType, ItemListing, ItemMeta, frame_count,
};
use crate::tools::Adapter;

/// Settings the session reads from the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub stale_responses: StaleResponses,
    pub keybindings: KeyBindings,
}

impl From<&EngineConfig> for SessionConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            stale_responses: config.preferences.stale_responses,
            keybindings: config.keybindings.clone(),
        }
    }
}

/// How the next item is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavMode {
    /// Items the output dataset has no annotation for yet
    #[default]
    New,
    /// Stored annotations, in listing order
    Existing,
}

/// Work postponed to the next [`SessionController::tick`].
#[derive(Debug)]
enum Deferred {
    Begin {
        response: AnnotateResponse,
        generation: u64,
    },
    ShowFrame {
        index: i64,
        frame_seq: u64,
    },
}

/// Drives one annotation set through its items and frames.
#[derive(Debug)]
pub struct SessionController {
    annoset_id: i64,
    config: SessionConfig,
    annoset: Option<AnnotationSet>,
    adapter: Option<Adapter>,

    mode: NavMode,
    key_list: Option<Vec<String>>,
    item_idx: usize,
    response: Option<AnnotateResponse>,
    item_meta: Option<ItemMeta>,
    frame_idx: Option<usize>,
    num_frames: usize,
    image_dims: Option<Dims>,

    message: Option<String>,
    errors: Vec<String>,

    outbox: Vec<(Ticket, Request)>,
    deferred: VecDeque<Deferred>,
    next_ticket: u64,
    /// Bumped whenever a new item is requested
    nav_seq: u64,
    /// Bumped whenever the current item is dropped
    generation: u64,
    /// Bumped whenever the displayed frame is dropped
    frame_seq: u64,

    keys: KeySubscription,
}

impl SessionController {
    /// Create a session for an annotation set that still has to be fetched.
    pub fn new(annoset_id: i64, config: SessionConfig, keyboard: &KeyboardHub) -> Self {
        Self {
            annoset_id,
            config,
            annoset: None,
            adapter: None,
            mode: NavMode::New,
            key_list: None,
            item_idx: 0,
            response: None,
            item_meta: None,
            frame_idx: None,
            num_frames: 0,
            image_dims: None,
            message: None,
            errors: Vec::new(),
            outbox: Vec::new(),
            deferred: VecDeque::new(),
            next_ticket: 0,
            nav_seq: 0,
            generation: 0,
            frame_seq: 0,
            keys: keyboard.subscribe(),
        }
    }

    /// Create a session for an annotation set that is already known.
    pub fn with_annoset(annoset: AnnotationSet, config: SessionConfig, keyboard: &KeyboardHub) -> Self {
        let mut session = Self::new(annoset.id, config, keyboard);
        session.annoset = Some(annoset);
        session
    }

    /// Fetch the annotation set if needed, then load the first item.
    pub fn start(&mut self) {
        match self.annoset.take() {
            Some(annoset) => self.install_annoset(annoset),
            None => {
                let annoset = self.annoset_id;
                self.issue(Purpose::AnnotationSet, Request::GetAnnotationSet { annoset });
            }
        }
    }

    fn install_annoset(&mut self, annoset: AnnotationSet) {
        self.adapter = Adapter::for_annoset(&annoset, &self.config.keybindings);
        let tool = String::from(annoset.tool.clone());
        self.annoset = Some(annoset);
        let Some(drives_items) = self.adapter.as_ref().map(Adapter::drives_items) else {
            self.report_message(format!("Unsupported annotation tool: {}", tool));
            return;
        };
        log::info!("Annotation set {} ready, tool {}", self.annoset_id, tool);
        self.with_tool(|tool, ctx| tool.on_created_ready(ctx));
        if drives_items {
            self.get_new_item();
        }
    }

    /// Requests issued since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<(Ticket, Request)> {
        std::mem::take(&mut self.outbox)
    }

    /// Hand back the result of a request taken from [`Self::take_requests`].
    pub fn complete(&mut self, ticket: Ticket, result: Result<Payload>) {
        if self.is_stale(&ticket) {
            log::debug!("Discarding stale completion #{} ({:?})", ticket.id, ticket.purpose);
            return;
        }
        match ticket.purpose {
            Purpose::AnnotationSet => match result.and_then(Payload::parse::<AnnotationSet>) {
                Ok(annoset) => self.install_annoset(annoset),
                Err(e) => self.report(e),
            },
            Purpose::Response => self.on_response(result),
            Purpose::ItemMeta { response } => self.on_item_meta(response, result),
            Purpose::ExistingData => match result.and_then(Payload::into_json) {
                Ok(data) => {
                    self.with_tool(|tool, ctx| tool.on_item_data(data, ctx.item_meta, ctx));
                }
                Err(e) => self.report(e),
            },
            Purpose::KeyList { index } => {
                match result.and_then(Payload::parse::<Option<Vec<ItemListing>>>) {
                    Ok(listing) => {
                        let keys = listing.unwrap_or_default().into_iter().map(|i| i.key).collect();
                        self.key_list = Some(keys);
                        self.get_old_item(index);
                    }
                    Err(e) => self.report(e),
                }
            }
            Purpose::Submit => self.on_submitted(result),
            Purpose::SaveParams => match result {
                Ok(_) => log::info!("Saved params of annotation set {}", self.annoset_id),
                Err(e) => self.report(e),
            },
            Purpose::FrameImage { .. } => match result.and_then(|p| p.image_dims()) {
                Ok(dims) => self.image_loaded(dims),
                Err(e) => self.report(e),
            },
            Purpose::Tool(purpose) => {
                self.with_tool(|tool, ctx| tool.on_tool_data(purpose, result, ctx));
            }
        }
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        if let Purpose::FrameImage { frame_seq } = ticket.purpose {
            return frame_seq != self.frame_seq;
        }
        if self.config.stale_responses == StaleResponses::Apply {
            return false;
        }
        if ticket.purpose.is_navigation() {
            ticket.generation != self.nav_seq
        } else if ticket.purpose.is_item_scoped() {
            ticket.generation != self.generation
        } else {
            false
        }
    }

    fn issue(&mut self, purpose: Purpose, request: Request) {
        let generation = if purpose.is_navigation() {
            self.nav_seq
        } else {
            self.generation
        };
        let ticket = Ticket {
            id: self.next_ticket,
            purpose,
            generation,
        };
        self.next_ticket += 1;
        log::debug!("Request #{}: {:?} {}", ticket.id, request.method(), request.path());
        self.outbox.push((ticket, request));
    }

    /// Run the work deferred since the last tick. Work deferred while
    /// ticking waits for the next one.
    pub fn tick(&mut self) {
        let due: Vec<Deferred> = self.deferred.drain(..).collect();
        for task in due {
            match task {
                Deferred::Begin {
                    response,
                    generation,
                } => {
                    if generation != self.generation
                        && self.config.stale_responses == StaleResponses::Discard
                    {
                        log::debug!("Skipping superseded item {}", response.key);
                        continue;
                    }
                    self.begin_item(response);
                }
                Deferred::ShowFrame { index, frame_seq } => {
                    if frame_seq != self.frame_seq || self.num_frames == 0 {
                        continue;
                    }
                    self.frame_idx = Some(index.rem_euclid(self.num_frames as i64) as usize);
                    self.load_frame_image();
                }
            }
        }
    }

    /// Whether any work waits for [`Self::tick`].
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Ask the backend for the next item of the current mode.
    pub fn update(&mut self) {
        let Some(annoset) = &self.annoset else {
            log::warn!("Annotation set {} not loaded yet", self.annoset_id);
            return;
        };
        let key = match self.mode {
            NavMode::New => None,
            NavMode::Existing => match &self.key_list {
                Some(keys) if !keys.is_empty() => keys.get(self.item_idx).cloned(),
                _ => return,
            },
        };
        let url = annoset.annotate_url();
        self.nav_seq += 1;
        self.issue(Purpose::Response, Request::NextResponse { url, key });
    }

    fn on_response(&mut self, result: Result<Payload>) {
        match result.and_then(Payload::parse::<AnnotateResponse>) {
            Ok(response) => {
                let Some(source) = self.annoset.as_ref().and_then(AnnotationSet::source) else {
                    self.report_message(format!(
                        "Annotation set {} has no input dataset",
                        self.annoset_id
                    ));
                    return;
                };
                let request = Request::GetItem {
                    dataset: source.id,
                    key: response.key.clone(),
                    format: ItemFormat::Meta,
                    cache_bust: None,
                };
                self.issue(Purpose::ItemMeta { response }, request);
            }
            Err(e) if e.is_everything_labeled() => {
                log::info!("No unlabeled items left");
                self.reset_item();
                self.message = Some(MSG_EVERYTHING_LABELED.to_string());
            }
            Err(e) => self.report(e),
        }
    }

    fn on_item_meta(&mut self, response: AnnotateResponse, result: Result<Payload>) {
        let meta = match result.and_then(Payload::parse::<Option<ItemMeta>>) {
            Ok(meta) => meta.unwrap_or_default(),
            Err(e) => return self.report(e),
        };
        self.reset_item();
        self.num_frames = match self.annoset.as_ref().and_then(AnnotationSet::source_type) {
            Some(source_type) => frame_count(source_type, &meta),
            None => 1,
        };
        self.item_meta = Some(meta);
        log::info!("Item {} loaded, {} frame(s)", response.key, self.num_frames);
        self.deferred.push_back(Deferred::Begin {
            response,
            generation: self.generation,
        });
    }

    fn begin_item(&mut self, response: AnnotateResponse) {
        let existing = response.has_existing().then(|| response.key.clone());
        self.response = Some(response);
        self.frame_idx = Some(0);
        self.with_tool(|tool, ctx| tool.on_update(ctx));
        self.load_frame_image();

        let (Some(key), Some(annoset)) = (existing, &self.annoset) else {
            return;
        };
        let request = Request::GetItem {
            dataset: annoset.dataset.id,
            key,
            format: ItemFormat::Json,
            cache_bust: Some(super::cache_bust()),
        };
        self.issue(Purpose::ExistingData, request);
    }

    fn load_frame_image(&mut self) {
        let (Some(annoset), Some(response), Some(frame)) =
            (&self.annoset, &self.response, self.frame_idx)
        else {
            return;
        };
        let Some(source) = annoset.source() else {
            return;
        };
        let request = Request::LoadFrameImage {
            dataset: source.id,
            key: response.key.clone(),
            video_frame: (source.data_type == DataType::Video).then_some(frame),
        };
        let frame_seq = self.frame_seq;
        self.issue(Purpose::FrameImage { frame_seq }, request);
    }

    fn reset_item(&mut self) {
        self.generation += 1;
        self.response = None;
        self.item_meta = None;
        self.num_frames = 0;
        self.reset_frame();
    }

    /// Leave the current frame. Input is ignored until the next frame is shown.
    fn reset_frame(&mut self) {
        self.frame_seq += 1;
        self.frame_idx = None;
        self.image_dims = None;
        if let Some(adapter) = &mut self.adapter {
            adapter.inner_mut().reset_frame();
        }
    }

    /// Switch to unlabeled items, or skip the current one.
    pub fn get_new_item(&mut self) {
        self.mode = NavMode::New;
        self.message = None;
        self.key_list = None;
        self.item_idx = 0;
        self.update();
    }

    /// Show the stored annotation at `index`, wrapping around the listing.
    /// The listing is fetched first if it is not known yet.
    pub fn get_old_item(&mut self, index: i64) {
        self.mode = NavMode::Existing;
        self.message = None;
        let Some(keys) = &self.key_list else {
            let Some(dataset) = self.annoset.as_ref().map(|a| a.dataset.id) else {
                return;
            };
            self.nav_seq += 1;
            self.issue(Purpose::KeyList { index }, Request::ListItems { dataset });
            return;
        };
        if keys.is_empty() {
            self.reset_item();
            self.message = Some(MSG_NO_LABELS.to_string());
            return;
        }
        self.item_idx = index.rem_euclid(keys.len() as i64) as usize;
        self.update();
    }

    /// Show frame `index` of the current item, wrapping around.
    pub fn get_frame(&mut self, index: i64) {
        if self.response.is_none() || self.num_frames == 0 {
            return;
        }
        self.reset_frame();
        self.deferred.push_back(Deferred::ShowFrame {
            index,
            frame_seq: self.frame_seq,
        });
    }

    /// Jump to a position of the video given as a fraction of its length.
    pub fn jump_to_relative(&mut self, fraction: f64) {
        if self.num_frames == 0 {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.get_frame((self.num_frames as f64 * fraction).floor() as i64);
    }

    /// Advance to the next frame, or submit after the last one.
    pub fn finish_frame(&mut self) {
        let Some(frame) = self.frame_idx else {
            return;
        };
        if frame + 1 >= self.num_frames {
            self.annotate_item();
        } else {
            self.get_frame(frame as i64 + 1);
        }
    }

    /// Submit the current item's annotations.
    pub fn annotate_item(&mut self) {
        let (Some(annoset), Some(response), Some(adapter)) =
            (&self.annoset, &self.response, &self.adapter)
        else {
            log::warn!("Nothing to submit");
            return;
        };
        let mut ctx = ToolContext::new(annoset);
        ctx.response = Some(response);
        ctx.item_meta = self.item_meta.as_ref();
        ctx.frame_idx = self.frame_idx;
        ctx.num_frames = self.num_frames;
        ctx.image_dims = self.image_dims;
        let (data, metadata) = adapter.inner().annotate_data(&ctx);
        let body = AnnotateRequest::json(response.key.clone(), &data, metadata.as_ref());
        let url = annoset.annotate_url();
        log::info!("Submitting item {}", response.key);
        self.issue(Purpose::Submit, Request::Annotate { url, body });
    }

    fn on_submitted(&mut self, result: Result<Payload>) {
        if let Err(e) = result {
            return self.report(e);
        }
        log::info!("Submission accepted");
        match self.mode {
            NavMode::New => self.get_new_item(),
            NavMode::Existing => self.get_old_item(self.item_idx as i64 + 1),
        }
    }

    /// Persist the tool parameters on the annotation set.
    pub fn save_params(&mut self) {
        let Some(params) = self.adapter.as_ref().and_then(|a| a.inner().params_json()) else {
            return;
        };
        let params = params.to_string();
        if let Some(annoset) = &mut self.annoset {
            annoset.params = Some(params.clone());
        }
        let annoset = self.annoset_id;
        self.issue(Purpose::SaveParams, Request::SaveParams { annoset, params });
    }

    /// The frame image finished loading at its natural size.
    pub fn image_loaded(&mut self, dims: Dims) {
        if self.frame_idx.is_none() {
            log::debug!("Image loaded with no frame shown, ignoring");
            return;
        }
        self.image_dims = Some(dims);
        self.with_tool(|tool, ctx| tool.on_image_loaded(ctx));
    }

    /// The image element was laid out at a new on-screen size.
    pub fn display_resized(&mut self, width: f64, height: f64) {
        self.with_tool(|tool, ctx| tool.resize_display(width, height, ctx));
    }

    /// Feed keyboard events received since the last call to the tool.
    pub fn pump_keys(&mut self) {
        for event in self.keys.drain() {
            self.handle_key(&event);
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.with_tool(|tool, ctx| tool.handle_key(event, ctx))
            .unwrap_or(false)
    }

    pub fn click(&mut self, display: Point) {
        self.with_tool(|tool, ctx| tool.click(display, ctx));
    }

    pub fn pointer_move(&mut self, display: Point) {
        self.with_tool(|tool, ctx| tool.pointer_move(display, ctx));
    }

    pub fn drag_start(&mut self, display: Point) -> bool {
        self.with_tool(|tool, ctx| tool.drag_start(display, ctx))
            .unwrap_or(false)
    }

    pub fn drag_move(&mut self, display: Point) {
        self.with_tool(|tool, ctx| tool.drag_move(display, ctx));
    }

    pub fn drag_end(&mut self) {
        self.with_tool(|tool, ctx| tool.drag_end(ctx));
    }

    /// End the active track of the track tool.
    pub fn end_track(&mut self) {
        self.with_adapter(|adapter, ctx| {
            if let Some(tool) = adapter.as_track_mut() {
                tool.end_track(ctx);
            }
        });
    }

    /// Scene of the current tool, if it draws one.
    pub fn scene(&self) -> Option<&Scene> {
        self.adapter.as_ref().and_then(|a| a.inner().scene())
    }

    fn with_tool<R>(
        &mut self,
        f: impl FnOnce(&mut dyn ToolAdapter, &mut ToolContext<'_>) -> R,
    ) -> Option<R> {
        self.with_adapter(|adapter, ctx| f(adapter.inner_mut(), ctx))
    }

    /// Call into the adapter with a view of the session. Commands the
    /// adapter queues are carried out afterwards.
    pub fn with_adapter<R>(
        &mut self,
        f: impl FnOnce(&mut Adapter, &mut ToolContext<'_>) -> R,
    ) -> Option<R> {
        let (Some(annoset), Some(adapter)) = (&self.annoset, &mut self.adapter) else {
            return None;
        };
        let mut ctx = ToolContext::new(annoset);
        ctx.response = self.response.as_ref();
        ctx.item_meta = self.item_meta.as_ref();
        ctx.frame_idx = self.frame_idx;
        ctx.num_frames = self.num_frames;
        ctx.image_dims = self.image_dims;
        let result = f(adapter, &mut ctx);
        let commands = ctx.into_commands();
        self.apply_commands(commands);
        Some(result)
    }

    fn apply_commands(&mut self, commands: Vec<ToolCommand>) {
        for command in commands {
            match command {
                ToolCommand::Fetch { purpose, request } => {
                    self.issue(Purpose::Tool(purpose), request)
                }
                ToolCommand::GoToFrame(frame) => self.get_frame(frame as i64),
                ToolCommand::FinishFrame => self.finish_frame(),
                ToolCommand::AnnotateItem => self.annotate_item(),
                ToolCommand::ReportError(message) => self.report_message(message),
            }
        }
    }

    fn report(&mut self, error: Error) {
        self.report_message(error.user_message());
    }

    fn report_message(&mut self, message: String) {
        log::error!("{}", message);
        self.errors.push(message);
    }

    pub fn annoset(&self) -> Option<&AnnotationSet> {
        self.annoset.as_ref()
    }

    pub fn adapter(&self) -> Option<&Adapter> {
        self.adapter.as_ref()
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn response(&self) -> Option<&AnnotateResponse> {
        self.response.as_ref()
    }

    /// Key of the item being labeled.
    pub fn item_key(&self) -> Option<&str> {
        self.response.as_ref().map(|r| r.key.as_str())
    }

    pub fn item_meta(&self) -> Option<&ItemMeta> {
        self.item_meta.as_ref()
    }

    pub fn key_list(&self) -> Option<&[String]> {
        self.key_list.as_deref()
    }

    pub fn item_idx(&self) -> usize {
        self.item_idx
    }

    pub fn frame_idx(&self) -> Option<usize> {
        self.frame_idx
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn image_dims(&self) -> Option<Dims> {
        self.image_dims
    }

    /// Informational message shown instead of an item.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Drain the error channel.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }
}
