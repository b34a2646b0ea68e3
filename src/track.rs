//! Greedy track assignment over per-frame detections.
//!
//! Each click assigns the active track ID to the unlabeled detection nearest
//! to the pointer, then jumps to the next frame that still has unlabeled
//! detections. When the rest of the sequence is fully labeled the track ends
//! and labeling resumes from the first incomplete frame.

use serde_json::Value;

use crate::canvas::{Geometry, Scene, Stage, Visual};
use crate::constants::{LABELED_DETECTION_COLOR, STROKE_WIDTH, UNLABELED_DETECTION_COLOR};
use crate::geometry::Point;
use crate::model::Detection;

/// Result of a click in the track engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackClick {
    /// A labeled detection was hit directly and lost its track ID
    Unlabeled { detection: usize },
    /// The nearest unlabeled detection (if any) got the active track ID;
    /// labeling continues on `next_frame`
    Assigned {
        detection: Option<usize>,
        next_frame: usize,
        track_ended: bool,
    },
}

/// Detection arrays and track-ID state for one item.
#[derive(Debug, Clone)]
pub struct TrackEngine {
    detections: Vec<Vec<Detection>>,
    metadata: Option<Value>,
    next_track_id: i64,
    /// Stored annotations were loaded; fresh detections must not replace them
    has_existing: bool,
}

impl Default for TrackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackEngine {
    pub fn new() -> Self {
        Self {
            detections: Vec::new(),
            metadata: None,
            next_track_id: 1,
            has_existing: false,
        }
    }

    /// Start a new item with `num_frames` empty frames.
    pub fn reset(&mut self, num_frames: usize) {
        self.detections = vec![Vec::new(); num_frames];
        self.metadata = None;
        self.next_track_id = 1;
        self.has_existing = false;
    }

    pub fn num_frames(&self) -> usize {
        self.detections.len()
    }

    pub fn detections(&self) -> &[Vec<Detection>] {
        &self.detections
    }

    pub fn frame(&self, frame: usize) -> &[Detection] {
        self.detections.get(frame).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn next_track_id(&self) -> i64 {
        self.next_track_id
    }

    pub fn has_existing(&self) -> bool {
        self.has_existing
    }

    /// Install detections computed upstream, unless stored annotations already won.
    pub fn apply_fresh_detections(&mut self, mut frames: Vec<Vec<Detection>>) -> bool {
        if self.has_existing {
            log::debug!("Ignoring fresh detections, item has stored tracks");
            return false;
        }
        let expected = self.detections.len();
        if frames.len() != expected {
            log::warn!(
                "Fresh detections cover {} frames, item has {}",
                frames.len(),
                expected
            );
            frames.resize_with(expected, Vec::new);
        }
        self.detections = frames;
        true
    }

    /// Install the source metadata, unless stored annotations already won.
    pub fn apply_fresh_metadata(&mut self, metadata: Value) -> bool {
        if self.has_existing {
            return false;
        }
        self.metadata = Some(metadata);
        true
    }

    /// Install stored track annotations. Empty payloads are ignored.
    ///
    /// The next track ID continues after the highest stored one.
    pub fn apply_existing(&mut self, frames: Vec<Vec<Detection>>, metadata: Option<Value>) -> bool {
        if frames.is_empty() {
            return false;
        }
        let max_id = frames
            .iter()
            .flatten()
            .filter_map(|d| d.track_id)
            .max();
        self.next_track_id = max_id.map_or(1, |id| id + 1).max(1);
        self.detections = frames;
        self.metadata = metadata;
        self.has_existing = true;
        log::info!(
            "Loaded stored tracks for {} frames, next track {}",
            self.detections.len(),
            self.next_track_id
        );
        true
    }

    /// Nearest unlabeled detection by squared distance to its top-left corner.
    ///
    /// The first detection at the minimum distance wins.
    pub fn nearest_unlabeled(&self, frame: usize, p: Point) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, detection) in self.frame(frame).iter().enumerate() {
            if detection.is_labeled() {
                continue;
            }
            let distance = detection.top_left().distance_sq(&p);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Give the nearest unlabeled detection the active track ID.
    pub fn assign_nearest(&mut self, frame: usize, p: Point) -> Option<usize> {
        let index = self.nearest_unlabeled(frame, p)?;
        let track_id = self.next_track_id;
        if let Some(detection) = self.detections.get_mut(frame).and_then(|f| f.get_mut(index)) {
            detection.track_id = Some(track_id);
            log::debug!("Frame {}: detection {} -> track {}", frame, index, track_id);
        }
        Some(index)
    }

    /// Topmost detection whose drawn rectangle contains the point.
    fn hit(&self, frame: usize, p: Point) -> Option<usize> {
        self.frame(frame).iter().rposition(|d| {
            let rect = d.rect();
            rect.contains(&p) || rect.border_distance(&p) <= STROKE_WIDTH / 2.0
        })
    }

    /// Remove the track ID of a labeled detection hit directly.
    pub fn unlabel_at(&mut self, frame: usize, p: Point) -> Option<usize> {
        let index = self.hit(frame, p)?;
        let detection = self.detections.get_mut(frame)?.get_mut(index)?;
        let track_id = detection.track_id.take()?;
        log::debug!("Frame {}: detection {} left track {}", frame, index, track_id);
        Some(index)
    }

    /// Handle a click at a natural-coordinate point on `frame`.
    pub fn click(&mut self, frame: usize, p: Point) -> TrackClick {
        if let Some(detection) = self.unlabel_at(frame, p) {
            return TrackClick::Unlabeled { detection };
        }
        let detection = self.assign_nearest(frame, p);
        match self.unlabeled_frame_after(frame + 1) {
            Some(next_frame) => TrackClick::Assigned {
                detection,
                next_frame,
                track_ended: false,
            },
            None => TrackClick::Assigned {
                detection,
                next_frame: self.end_track().unwrap_or(frame),
                track_ended: true,
            },
        }
    }

    /// Smallest frame index `>= start` with an unlabeled detection.
    pub fn unlabeled_frame_after(&self, start: usize) -> Option<usize> {
        self.detections
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, frame)| frame.iter().any(|d| !d.is_labeled()))
            .map(|(index, _)| index)
    }

    /// Move on to a new track. Returns the first frame still needing labels.
    pub fn end_track(&mut self) -> Option<usize> {
        log::info!("Track {} ended", self.next_track_id);
        self.next_track_id += 1;
        self.unlabeled_frame_after(0)
    }

    /// Payload and metadata for submission.
    pub fn annotate_data(&self) -> (Value, Option<Value>) {
        let data = serde_json::to_value(&self.detections).unwrap_or(Value::Null);
        (data, self.metadata.clone())
    }

    /// Scene for one frame: labeled detections and unlabeled ones in distinct colors.
    pub fn render(&self, frame: usize, stage: &Stage) -> Scene {
        let Some(mut scene) = stage.blank_scene() else {
            return Scene::default();
        };
        scene.layer = self
            .frame(frame)
            .iter()
            .enumerate()
            .map(|(index, d)| {
                let color = if d.is_labeled() {
                    LABELED_DETECTION_COLOR
                } else {
                    UNLABELED_DETECTION_COLOR
                };
                Visual::new(Geometry::Rect(d.rect()), color, STROKE_WIDTH).with_index(index)
            })
            .collect();
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use crate::geometry::Dims;

    fn det(left: i64, top: i64) -> Detection {
        Detection::new(left, top, left + 10, top + 10)
    }

    fn engine(frames: Vec<Vec<Detection>>) -> TrackEngine {
        let mut engine = TrackEngine::new();
        engine.reset(frames.len());
        assert!(engine.apply_fresh_detections(frames));
        engine
    }

    #[test]
    fn test_same_track_until_end_track() {
        let mut e = engine(vec![vec![det(0, 0), det(100, 100)]]);
        assert_eq!(e.assign_nearest(0, Point::new(5.0, 5.0)), Some(0));
        assert_eq!(e.frame(0)[0].track_id, Some(1));
        assert_eq!(e.assign_nearest(0, Point::new(90.0, 90.0)), Some(1));
        assert_eq!(e.frame(0)[1].track_id, Some(1));

        let mut e = engine(vec![vec![det(0, 0), det(100, 100)]]);
        e.assign_nearest(0, Point::new(5.0, 5.0));
        e.end_track();
        e.assign_nearest(0, Point::new(90.0, 90.0));
        assert_eq!(e.frame(0)[1].track_id, Some(2));
    }

    #[test]
    fn test_click_advances_then_ends_track() {
        let mut e = engine(vec![vec![det(0, 0), det(100, 100)], vec![det(0, 0)]]);

        let step = e.click(0, Point::new(5.0, 5.0));
        assert_eq!(
            step,
            TrackClick::Assigned {
                detection: Some(0),
                next_frame: 1,
                track_ended: false
            }
        );

        // Last unlabeled detection after frame 1 is gone: track 1 ends, back to frame 0.
        let step = e.click(1, Point::new(3.0, 3.0));
        assert_eq!(
            step,
            TrackClick::Assigned {
                detection: Some(0),
                next_frame: 0,
                track_ended: true
            }
        );
        assert_eq!(e.frame(1)[0].track_id, Some(1));
        assert_eq!(e.next_track_id(), 2);

        e.click(0, Point::new(90.0, 90.0));
        assert_eq!(e.frame(0)[1].track_id, Some(2));
    }

    #[test]
    fn test_everything_labeled_stays_on_frame() {
        let mut e = engine(vec![vec![], vec![det(0, 0)], vec![]]);
        let step = e.click(1, Point::new(50.0, 50.0));
        assert_eq!(
            step,
            TrackClick::Assigned {
                detection: Some(0),
                next_frame: 1,
                track_ended: true
            }
        );
    }

    #[test]
    fn test_click_on_labeled_detection_unlabels() {
        let mut e = engine(vec![vec![det(0, 0).with_track_id(4), det(50, 50)]]);
        let step = e.click(0, Point::new(5.0, 5.0));
        assert_eq!(step, TrackClick::Unlabeled { detection: 0 });
        assert!(!e.frame(0)[0].is_labeled());
        assert!(!e.frame(0)[1].is_labeled());
    }

    #[test]
    fn test_click_with_no_unlabeled_in_frame() {
        let mut e = engine(vec![vec![det(0, 0).with_track_id(1)], vec![det(0, 0)]]);
        let step = e.click(0, Point::new(200.0, 200.0));
        assert_eq!(
            step,
            TrackClick::Assigned {
                detection: None,
                next_frame: 1,
                track_ended: false
            }
        );
    }

    #[test]
    fn test_tie_goes_to_first() {
        let e = engine(vec![vec![det(0, 0), det(10, 0)]]);
        assert_eq!(e.nearest_unlabeled(0, Point::new(5.0, 0.0)), Some(0));
    }

    #[test]
    fn test_unlabeled_frame_after() {
        let e = engine(vec![
            vec![det(0, 0)],
            vec![det(0, 0).with_track_id(1)],
            vec![],
            vec![det(0, 0)],
        ]);
        assert_eq!(e.unlabeled_frame_after(0), Some(0));
        assert_eq!(e.unlabeled_frame_after(1), Some(3));
        assert_eq!(e.unlabeled_frame_after(4), None);
        assert_eq!(e.unlabeled_frame_after(100), None);
    }

    #[test]
    fn test_existing_sets_next_track_id() {
        let mut e = TrackEngine::new();
        e.reset(2);
        let stored = vec![vec![det(0, 0).with_track_id(3)], vec![det(0, 0).with_track_id(7), det(5, 5)]];
        assert!(e.apply_existing(stored.clone(), Some(serde_json::json!({"Dims": [4, 4]}))));
        assert_eq!(e.next_track_id(), 8);
        assert!(e.has_existing());

        // Fresh detections arriving later do not replace stored ones.
        assert!(!e.apply_fresh_detections(vec![vec![det(1, 1)], vec![]]));
        assert!(!e.apply_fresh_metadata(serde_json::json!({})));
        assert_eq!(e.detections(), stored.as_slice());
    }

    #[test]
    fn test_empty_existing_ignored() {
        let mut e = engine(vec![vec![det(0, 0)]]);
        assert!(!e.apply_existing(vec![], None));
        assert!(!e.has_existing());
        assert_eq!(e.next_track_id(), 1);
    }

    #[test]
    fn test_fresh_detections_resized_to_frame_count() {
        let mut e = TrackEngine::new();
        e.reset(3);
        e.apply_fresh_detections(vec![vec![det(0, 0)]]);
        assert_eq!(e.num_frames(), 3);
    }

    #[test]
    fn test_render_colors() {
        let e = engine(vec![vec![det(0, 0).with_track_id(1), det(20, 20)]]);
        let mut stage = Stage::new();
        stage.attach_image(Dims::new(100, 100));
        let scene = e.render(0, &stage);
        assert_eq!(scene.stroke_of(0), Some(Color::Red));
        assert_eq!(scene.stroke_of(1), Some(Color::Yellow));
        assert_eq!(e.render(0, &stage), scene);
    }
}
