//! Session scenarios driven by hand-fed completions.

use serde_json::{Value, json};

use super::*;
use crate::config::StaleResponses;
use crate::constants::{MSG_EVERYTHING_LABELED, MSG_NO_LABELS};
use crate::error::{Error, Result};
use crate::geometry::{Dims, Point};
use crate::keyboard::{Key, KeyEvent, KeyboardHub};
use crate::model::{AnnotationSet, DataType, Dataset, Tool};

fn annoset(tool: Tool, output: DataType, source: DataType, params: Option<&str>) -> AnnotationSet {
    AnnotationSet {
        id: 7,
        dataset: Dataset::new(20, "out", output),
        inputs: vec![
            Dataset::new(10, "src", source),
            Dataset::new(11, "dets", DataType::Detection),
        ],
        tool,
        params: params.map(str::to_string),
    }
}

fn shape_annoset() -> AnnotationSet {
    annoset(Tool::Shape, DataType::Shape, DataType::Image, None)
}

fn started(annoset: AnnotationSet, stale_responses: StaleResponses) -> (SessionController, KeyboardHub) {
    let hub = KeyboardHub::new();
    let config = SessionConfig {
        stale_responses,
        ..Default::default()
    };
    let mut session = SessionController::with_annoset(annoset, config, &hub);
    session.start();
    (session, hub)
}

fn ok(value: Value) -> Result<Payload> {
    Ok(Payload::Json(value))
}

fn single(session: &mut SessionController) -> (Ticket, Request) {
    let mut requests = session.take_requests();
    assert_eq!(requests.len(), 1, "expected one request, got {:?}", requests);
    requests.remove(0)
}

/// Answer the pending next-item request and the item metadata, then run
/// the deferred item start. Returns the requests the start issued.
fn open_item(session: &mut SessionController, response: Value, meta: Value) -> Vec<(Ticket, Request)> {
    let (ticket, request) = single(session);
    assert!(matches!(request, Request::NextResponse { .. }), "{:?}", request);
    session.complete(ticket, ok(response));
    let (ticket, request) = single(session);
    assert!(
        matches!(request, Request::GetItem { dataset: 10, format: ItemFormat::Meta, .. }),
        "{:?}",
        request
    );
    session.complete(ticket, ok(meta));
    session.tick();
    session.take_requests()
}

fn ticket_for(requests: &[(Ticket, Request)], purpose: impl Fn(&Purpose) -> bool) -> Ticket {
    requests
        .iter()
        .find(|(ticket, _)| purpose(&ticket.purpose))
        .map(|(ticket, _)| ticket.clone())
        .expect("request issued")
}

fn is_frame_image(purpose: &Purpose) -> bool {
    matches!(purpose, Purpose::FrameImage { .. })
}

#[test]
fn test_fetches_annotation_set_first() {
    let hub = KeyboardHub::new();
    let mut session = SessionController::new(7, SessionConfig::default(), &hub);
    session.start();
    let (ticket, request) = single(&mut session);
    assert_eq!(request, Request::GetAnnotationSet { annoset: 7 });

    let annoset = serde_json::to_value(shape_annoset()).expect("serialize");
    session.complete(ticket, ok(annoset));
    let (_, request) = single(&mut session);
    assert_eq!(
        request,
        Request::NextResponse {
            url: "/annotate-datasets/7/annotate".to_string(),
            key: None,
        }
    );
}

#[test]
fn test_unsupported_tool_reported() {
    let (mut session, _hub) = started(
        annoset(Tool::Other("sketch".into()), DataType::Shape, DataType::Image, None),
        StaleResponses::Discard,
    );
    assert!(session.take_requests().is_empty());
    assert_eq!(session.take_errors(), vec!["Unsupported annotation tool: sketch"]);
}

#[test]
fn test_video_item_sizes_tool_arrays() {
    let (mut session, _hub) = started(
        annoset(Tool::Shape, DataType::Shape, DataType::Video, None),
        StaleResponses::Discard,
    );
    let requests = open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Dims": [64, 48], "Framerate": [5, 1], "Duration": 2.0}),
    );
    assert_eq!(session.num_frames(), 10);
    assert_eq!(session.frame_idx(), Some(0));
    assert_eq!(session.item_key(), Some("clip"));
    let shapes = session.adapter().and_then(|a| a.as_shape()).map(|t| t.shapes().len());
    assert_eq!(shapes, Some(10));

    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].1,
        Request::LoadFrameImage {
            dataset: 10,
            key: "clip".to_string(),
            video_frame: Some(0),
        }
    );
}

#[test]
fn test_image_item_has_one_frame() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    let requests = open_item(&mut session, json!({"Key": "a.jpg"}), Value::Null);
    assert_eq!(session.num_frames(), 1);
    let frame = ticket_for(&requests, is_frame_image);
    session.complete(frame, Ok(Payload::Image(Dims::new(320, 240))));
    assert_eq!(session.image_dims(), Some(Dims::new(320, 240)));
    assert!(session.scene().is_some_and(|scene| scene.size == Dims::new(320, 240)));
}

#[test]
fn test_existing_tracks_win_in_either_order() {
    let stored = json!([[{"Left": 0, "Top": 0, "Right": 5, "Bottom": 5, "TrackID": 4}], [], []]);
    let fresh = json!([[{"Left": 50, "Top": 50, "Right": 60, "Bottom": 60}], [], []]);
    let item_meta = json!({"Framerate": [1, 1], "Duration": 3.0});

    for existing_first in [true, false] {
        let (mut session, _hub) = started(
            annoset(Tool::DetectionToTrack, DataType::Detection, DataType::Video, None),
            StaleResponses::Discard,
        );
        let requests = open_item(
            &mut session,
            json!({"Key": "clip", "IsExisting": true}),
            item_meta.clone(),
        );
        let existing = ticket_for(&requests, |p| *p == Purpose::ExistingData);
        let detections =
            ticket_for(&requests, |p| *p == Purpose::Tool(ToolPurpose::FreshDetections));
        let metadata = ticket_for(&requests, |p| *p == Purpose::Tool(ToolPurpose::FreshMetadata));

        if existing_first {
            session.complete(existing, ok(stored.clone()));
            session.complete(detections, ok(fresh.clone()));
            session.complete(metadata, ok(json!({"Dims": [1, 1]})));
        } else {
            session.complete(detections, ok(fresh.clone()));
            session.complete(metadata, ok(json!({"Dims": [1, 1]})));
            session.complete(existing, ok(stored.clone()));
        }

        let engine = session
            .adapter()
            .and_then(|a| a.as_track())
            .map(|t| t.engine())
            .expect("track tool");
        assert_eq!(engine.num_frames(), 3, "existing first: {}", existing_first);
        assert_eq!(engine.frame(0)[0].track_id, Some(4));
        assert_eq!(engine.frame(0)[0].left, 0);
        assert_eq!(engine.next_track_id(), 5);
        assert_eq!(engine.metadata(), Some(&item_meta));
    }
}

#[test]
fn test_int_digit_advances_then_submits() {
    let (mut session, hub) = started(
        annoset(Tool::Int, DataType::Int, DataType::Video, Some(r#"{"Range": 3}"#)),
        StaleResponses::Discard,
    );
    open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [1, 1], "Duration": 2.0}),
    );
    assert_eq!(session.num_frames(), 2);

    hub.dispatch(KeyEvent::press(Key::Char('2')));
    session.pump_keys();
    assert!(session.take_requests().is_empty());
    session.tick();
    assert_eq!(session.frame_idx(), Some(1));
    let (_, request) = single(&mut session);
    assert!(matches!(request, Request::LoadFrameImage { video_frame: Some(1), .. }));

    hub.dispatch(KeyEvent::press(Key::Char('1')));
    session.pump_keys();
    let (ticket, request) = single(&mut session);
    assert_eq!(ticket.purpose, Purpose::Submit);
    let body = request.body().expect("post body");
    assert_eq!(body["Key"], "clip");
    assert_eq!(body["Data"], "[2,1]");
    assert!(body.get("Metadata").is_none());

    session.complete(ticket, ok(Value::Null));
    let (_, request) = single(&mut session);
    assert!(matches!(request, Request::NextResponse { key: None, .. }));
}

#[test]
fn test_keys_ignored_while_frame_switch_pending() {
    let (mut session, hub) = started(
        annoset(Tool::Int, DataType::Int, DataType::Video, Some(r#"{"Range": 3}"#)),
        StaleResponses::Discard,
    );
    open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [1, 1], "Duration": 3.0}),
    );

    hub.dispatch(KeyEvent::press(Key::Char('1')));
    hub.dispatch(KeyEvent::press(Key::Char('2')));
    session.pump_keys();
    assert_eq!(session.frame_idx(), None);
    session.finish_frame();
    session.tick();

    assert_eq!(session.frame_idx(), Some(1));
    let labels = session.adapter().and_then(|a| a.as_int()).map(|t| t.labels().to_vec());
    assert_eq!(labels, Some(vec!["1".to_string(), String::new(), String::new()]));
    let (_, request) = single(&mut session);
    assert!(matches!(request, Request::LoadFrameImage { video_frame: Some(1), .. }));
}

#[test]
fn test_track_clicks_ignored_while_frame_switch_pending() {
    let (mut session, _hub) = started(
        annoset(Tool::DetectionToTrack, DataType::Detection, DataType::Video, None),
        StaleResponses::Discard,
    );
    let requests = open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [1, 1], "Duration": 2.0}),
    );
    let detections = ticket_for(&requests, |p| *p == Purpose::Tool(ToolPurpose::FreshDetections));
    let frame = ticket_for(&requests, is_frame_image);
    session.complete(
        detections,
        ok(json!([
            [
                {"Left": 0, "Top": 0, "Right": 10, "Bottom": 10},
                {"Left": 100, "Top": 100, "Right": 110, "Bottom": 110},
            ],
            [{"Left": 50, "Top": 50, "Right": 60, "Bottom": 60}],
        ])),
    );
    session.complete(frame, Ok(Payload::Image(Dims::new(200, 200))));

    session.click(Point::new(5.0, 5.0));
    session.click(Point::new(90.0, 90.0));
    session.tick();

    assert_eq!(session.frame_idx(), Some(1));
    let track_ids: Vec<Option<i64>> = session
        .adapter()
        .and_then(|a| a.as_track())
        .map(|t| t.engine().frame(0).iter().map(|d| d.track_id).collect())
        .unwrap_or_default();
    assert_eq!(track_ids, vec![Some(1), None]);
}

#[test]
fn test_everything_labeled_shows_message() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    let (ticket, _) = single(&mut session);
    session.complete(
        ticket,
        Err(Error::transport(400, "everything has been labeled already")),
    );
    assert_eq!(session.message(), Some(MSG_EVERYTHING_LABELED));
    assert!(session.errors().is_empty());
    assert_eq!(session.item_key(), None);
}

#[test]
fn test_other_response_error_reported() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    let (ticket, _) = single(&mut session);
    session.complete(ticket, Err(Error::transport(500, "database is locked")));
    assert_eq!(session.message(), None);
    assert_eq!(session.take_errors(), vec!["database is locked"]);
}

#[test]
fn test_empty_key_list_shows_message() {
    for listing in [json!([]), Value::Null] {
        let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
        session.take_requests();
        session.get_old_item(0);
        let (ticket, request) = single(&mut session);
        assert_eq!(request, Request::ListItems { dataset: 20 });
        session.complete(ticket, ok(listing));
        assert_eq!(session.mode(), NavMode::Existing);
        assert_eq!(session.key_list(), Some(&[][..]));
        assert_eq!(session.message(), Some(MSG_NO_LABELS));
        assert!(session.take_requests().is_empty());
    }
}

fn existing_session() -> SessionController {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    session.take_requests();
    session.get_old_item(0);
    let (ticket, _) = single(&mut session);
    session.complete(ticket, ok(json!([{"Key": "a"}, {"Key": "b"}, {"Key": "c"}])));
    session
}

fn requested_key(session: &mut SessionController) -> Option<String> {
    match single(session).1 {
        Request::NextResponse { key, .. } => key,
        other => panic!("expected next response, got {:?}", other),
    }
}

#[test]
fn test_old_items_wrap_around() {
    let mut session = existing_session();
    assert_eq!(requested_key(&mut session).as_deref(), Some("a"));

    session.get_old_item(-1);
    assert_eq!(session.item_idx(), 2);
    assert_eq!(requested_key(&mut session).as_deref(), Some("c"));

    session.get_old_item(4);
    assert_eq!(session.item_idx(), 1);
    assert_eq!(requested_key(&mut session).as_deref(), Some("b"));
}

#[test]
fn test_submit_advances_to_next_old_item() {
    let mut session = existing_session();
    let requests = open_item(&mut session, json!({"Key": "a", "IsExisting": true}), Value::Null);
    assert!(requests.iter().any(|(_, r)| matches!(
        r,
        Request::GetItem { dataset: 20, format: ItemFormat::Json, .. }
    )));

    session.annotate_item();
    let (ticket, _) = single(&mut session);
    session.complete(ticket, ok(Value::Null));
    assert_eq!(session.item_idx(), 1);
    assert_eq!(requested_key(&mut session).as_deref(), Some("b"));
}

#[test]
fn test_submit_failure_stays_on_item() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    open_item(&mut session, json!({"Key": "a"}), Value::Null);
    session.annotate_item();
    let (ticket, request) = single(&mut session);
    assert_eq!(request.path(), "/annotate-datasets/7/annotate");
    session.complete(ticket, Err(Error::transport(500, "disk full")));
    assert_eq!(session.take_errors(), vec!["disk full"]);
    assert!(session.take_requests().is_empty());
    assert_eq!(session.item_key(), Some("a"));
}

#[test]
fn test_superseded_navigation() {
    for (policy, applied) in [(StaleResponses::Discard, false), (StaleResponses::Apply, true)] {
        let (mut session, _hub) = started(shape_annoset(), policy);
        let (first, _) = single(&mut session);
        session.get_new_item();
        let (second, _) = single(&mut session);

        session.complete(first, ok(json!({"Key": "old"})));
        assert_eq!(!session.take_requests().is_empty(), applied, "{:?}", policy);

        session.complete(second, ok(json!({"Key": "new"})));
        let (_, request) = single(&mut session);
        assert!(matches!(request, Request::GetItem { ref key, .. } if key == "new"));
    }
}

#[test]
fn test_existing_data_from_previous_item() {
    let stored = json!([[{"Type": "point", "Points": [[3, 4]]}]]);
    for (policy, applied) in [(StaleResponses::Discard, false), (StaleResponses::Apply, true)] {
        let (mut session, _hub) = started(shape_annoset(), policy);
        let requests = open_item(&mut session, json!({"Key": "a", "IsExisting": true}), Value::Null);
        let existing = ticket_for(&requests, |p| *p == Purpose::ExistingData);

        session.get_new_item();
        open_item(&mut session, json!({"Key": "b"}), Value::Null);
        session.complete(existing, ok(stored.clone()));

        let shapes = session
            .adapter()
            .and_then(|a| a.as_shape())
            .map(|t| t.shapes()[0].len())
            .expect("shape tool");
        assert_eq!(shapes == 1, applied, "{:?}", policy);
    }
}

#[test]
fn test_frame_image_of_left_frame_dropped() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Apply);
    let requests = open_item(&mut session, json!({"Key": "a"}), Value::Null);
    let old = ticket_for(&requests, is_frame_image);

    session.get_frame(0);
    session.complete(old, Ok(Payload::Image(Dims::new(10, 10))));
    assert_eq!(session.image_dims(), None);

    session.tick();
    let (current, _) = single(&mut session);
    session.complete(current, Ok(Payload::Image(Dims::new(20, 20))));
    assert_eq!(session.image_dims(), Some(Dims::new(20, 20)));
}

#[test]
fn test_jump_to_relative() {
    let (mut session, _hub) = started(
        annoset(Tool::Shape, DataType::Shape, DataType::Video, None),
        StaleResponses::Discard,
    );
    open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [10, 1], "Duration": 1.0}),
    );
    session.jump_to_relative(0.55);
    session.tick();
    assert_eq!(session.frame_idx(), Some(5));

    session.jump_to_relative(1.0);
    session.tick();
    assert_eq!(session.frame_idx(), Some(0));

    session.jump_to_relative(-3.0);
    session.tick();
    assert_eq!(session.frame_idx(), Some(0));
}

#[test]
fn test_get_frame_wraps_in_both_directions() {
    let (mut session, _hub) = started(
        annoset(Tool::Shape, DataType::Shape, DataType::Video, None),
        StaleResponses::Discard,
    );
    open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [1, 1], "Duration": 3.0}),
    );
    session.get_frame(-1);
    session.tick();
    assert_eq!(session.frame_idx(), Some(2));

    session.get_frame(-4);
    session.tick();
    assert_eq!(session.frame_idx(), Some(2));

    session.get_frame(7);
    session.tick();
    assert_eq!(session.frame_idx(), Some(1));
}

#[test]
fn test_get_frame_without_item_ignored() {
    let (mut session, _hub) = started(shape_annoset(), StaleResponses::Discard);
    session.get_frame(3);
    assert!(!session.has_deferred());
    session.finish_frame();
    assert_eq!(session.take_requests().len(), 1);
}

#[test]
fn test_save_params_posts_tool_params() {
    let (mut session, _hub) = started(
        annoset(
            Tool::Shape,
            DataType::Shape,
            DataType::Image,
            Some(r#"{"Mode": "point", "Categories": ["car"]}"#),
        ),
        StaleResponses::Discard,
    );
    session.take_requests();
    session.save_params();
    let (ticket, request) = single(&mut session);
    let Request::SaveParams { annoset, params } = request else {
        panic!("expected save params");
    };
    assert_eq!(annoset, 7);
    let params: Value = serde_json::from_str(&params).expect("params json");
    assert_eq!(params, json!({"Mode": "point", "Categories": ["car"]}));

    session.complete(ticket, ok(Value::Null));
    assert!(session.errors().is_empty());
}

#[test]
fn test_geojson_start_ignores_missing_item() {
    let (mut session, _hub) = started(
        annoset(Tool::GeoJson, DataType::GeoJson, DataType::Image, None),
        StaleResponses::Discard,
    );
    let (ticket, request) = single(&mut session);
    assert!(matches!(
        request,
        Request::GetItem { dataset: 20, ref key, format: ItemFormat::Json, .. } if key == "geojson"
    ));
    session.complete(ticket, Err(Error::transport(404, "no such item")));
    assert!(session.errors().is_empty());
    assert!(session.take_requests().is_empty());
    let loaded = session.adapter().and_then(|a| a.as_geojson()).map(|t| t.is_loaded());
    assert_eq!(loaded, Some(true));
}

#[test]
fn test_end_track_returns_to_first_unlabeled_frame() {
    let (mut session, _hub) = started(
        annoset(Tool::DetectionToTrack, DataType::Detection, DataType::Video, None),
        StaleResponses::Discard,
    );
    let requests = open_item(
        &mut session,
        json!({"Key": "clip"}),
        json!({"Framerate": [1, 1], "Duration": 2.0}),
    );
    let detections = ticket_for(&requests, |p| *p == Purpose::Tool(ToolPurpose::FreshDetections));
    session.complete(
        detections,
        ok(json!([[{"Left": 0, "Top": 0, "Right": 9, "Bottom": 9}], []])),
    );
    session.get_frame(1);
    session.tick();
    assert_eq!(session.frame_idx(), Some(1));

    session.end_track();
    session.tick();
    assert_eq!(session.frame_idx(), Some(0));
    let next = session
        .adapter()
        .and_then(|a| a.as_track())
        .map(|t| t.engine().next_track_id());
    assert_eq!(next, Some(2));
}
