use super::mode::ToolMode;
use super::scene::{Geometry, Scene, Stage, Visual};
use crate::constants::{
    BOX_HIT_STROKE_WIDTH, DRAWING_COLOR, HANDLE_FILL, HANDLE_RADIUS, HANDLE_STROKE,
    HANDLE_STROKE_WIDTH, HOVER_COLOR, POINT_RADIUS, POINT_STROKE_WIDTH, PROVISIONAL_SIZE,
    SELECTED_COLOR, SHAPE_COLOR, STROKE_WIDTH,
};
use crate::geometry::{Dims, Point, Rect, segment_distance};
use crate::keybindings::KeyBindings;
use crate::keyboard::{KeyEvent, KeyKind};
use crate::model::{Shape, ShapeType};

/// Resize handle corners, in handle order.
const HANDLE_OFFSETS: [[u8; 2]; 4] = [[0, 0], [1, 0], [0, 1], [1, 1]];

/// A shape being drawn, between the first and second click.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Provisional {
    Box { anchor: Point, corner: Point },
    Line { start: Point, end: Point },
}

impl Provisional {
    fn follow(&mut self, p: Point) {
        match self {
            Provisional::Box { corner, .. } => *corner = p,
            Provisional::Line { end, .. } => *end = p,
        }
    }

    fn finish(&self, category: &str) -> Shape {
        let shape = match self {
            Provisional::Box { anchor, corner } => {
                Shape::new_box(anchor.truncated(), corner.truncated())
            }
            Provisional::Line { start, end } => Shape::new_line(start.truncated(), end.truncated()),
        };
        shape.with_category(category)
    }

    fn visual(&self) -> Visual {
        let geometry = match self {
            Provisional::Box { anchor, corner } => Geometry::Rect(Rect::from_corners(*anchor, *corner)),
            Provisional::Line { start, end } => Geometry::Line(*start, *end),
        };
        Visual::new(geometry, DRAWING_COLOR, STROKE_WIDTH)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Drag {
    /// Whole shape follows the pointer
    Move {
        index: usize,
        origin: Point,
        original: Vec<[i64; 2]>,
    },
    /// A box corner follows the pointer
    Handle {
        index: usize,
        offset: [u8; 2],
        rect: Rect,
    },
}

/// Interactive editor for the shapes of one frame.
///
/// Methods that take the frame's shape list apply the interaction to it and
/// rebuild the scene. State setters leave rendering to the caller.
#[derive(Debug)]
pub struct ShapeCanvas {
    mode: ToolMode,
    categories: Vec<String>,
    /// Category given to new shapes, empty for none
    category: String,
    bindings: KeyBindings,
    stage: Stage,
    selected: Option<usize>,
    hover: Option<usize>,
    drawing: Option<Provisional>,
    drag: Option<Drag>,
    scene: Scene,
}

impl ShapeCanvas {
    pub fn new(mode: ToolMode, categories: Vec<String>, bindings: KeyBindings) -> Self {
        Self {
            mode,
            categories,
            category: String::new(),
            bindings,
            stage: Stage::new(),
            selected: None,
            hover: None,
            drawing: None,
            drag: None,
            scene: Scene::default(),
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Switch the drawing mode and redraw from scratch.
    pub fn set_mode(&mut self, mode: ToolMode, shapes: &[Shape]) {
        log::debug!("Drawing mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.clear_interaction();
        self.render(shapes);
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Replace the category vocabulary. A current category no longer listed is cleared.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
        if !self.is_known_category(&self.category) {
            self.category.clear();
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Set the category for new shapes. Returns false for names outside the vocabulary.
    pub fn set_category(&mut self, category: &str) -> bool {
        if !self.is_known_category(category) {
            return false;
        }
        self.category = category.to_string();
        true
    }

    fn is_known_category(&self, category: &str) -> bool {
        category.is_empty() || self.categories.iter().any(|c| c == category)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn attach_image(&mut self, natural: Dims) {
        self.stage.attach_image(natural);
    }

    pub fn resize_display(&mut self, width: f64, height: f64) {
        self.stage.resize_display(width, height);
    }

    /// Drop everything tied to the displayed frame.
    pub fn reset_frame(&mut self) {
        self.stage.detach();
        self.clear_interaction();
        self.selected = None;
        self.scene = Scene::default();
    }

    fn clear_interaction(&mut self) {
        self.drawing = None;
        self.drag = None;
        self.hover = None;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hover
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Rebuild the scene from the shape list.
    pub fn render(&mut self, shapes: &[Shape]) -> &Scene {
        if self.selected.is_some_and(|i| i >= shapes.len()) {
            self.selected = None;
        }
        if self.hover.is_some_and(|i| i >= shapes.len()) {
            self.hover = None;
        }
        let Some(mut scene) = self.stage.blank_scene() else {
            self.scene = Scene::default();
            return &self.scene;
        };

        for (index, shape) in shapes.iter().enumerate() {
            let color = if self.selected == Some(index) {
                SELECTED_COLOR
            } else if self.hover == Some(index) && self.drawing.is_none() {
                HOVER_COLOR
            } else {
                SHAPE_COLOR
            };
            scene.layer.extend(
                shape_visuals(shape)
                    .into_iter()
                    .map(|v| Visual { stroke: color, ..v }.with_index(index)),
            );
        }
        if let Some(provisional) = &self.drawing {
            scene.layer.push(provisional.visual());
        }

        let moving = match &self.drag {
            Some(Drag::Move { index, .. }) => Some(*index),
            _ => None,
        };
        if let Some(index) = self.selected.filter(|i| Some(*i) != moving) {
            if let Some(rect) = shapes.get(index).and_then(box_rect) {
                scene.handles = HANDLE_OFFSETS
                    .iter()
                    .map(|offset| {
                        Visual::new(
                            Geometry::Circle {
                                center: rect.corner(*offset),
                                radius: HANDLE_RADIUS,
                            },
                            HANDLE_STROKE,
                            HANDLE_STROKE_WIDTH,
                        )
                        .with_fill(HANDLE_FILL)
                        .with_index(index)
                    })
                    .collect();
            }
        }

        self.scene = scene;
        &self.scene
    }

    /// Index of the topmost shape under a natural-coordinate point.
    fn hit_shape(&self, shapes: &[Shape], p: Point) -> Option<usize> {
        shapes.iter().rposition(|shape| shape_hit(shape, p))
    }

    /// Handle a click at a display-coordinate position.
    pub fn click(&mut self, shapes: &mut Vec<Shape>, display: Point) {
        if !self.stage.is_attached() {
            return;
        }
        let p = self.stage.to_natural(display);

        if let Some(mut provisional) = self.drawing.take() {
            provisional.follow(p);
            let shape = provisional.finish(&self.category);
            log::debug!("Committed {:?} at {:?}", shape.kind, shape.points);
            shapes.push(shape);
        } else if let Some(index) = self.hit_shape(shapes, p) {
            log::debug!("Selected shape {}", index);
            self.selected = Some(index);
        } else if self.selected.take().is_some() {
            log::debug!("Selection cleared");
        } else {
            let corner = Point::new(p.x + PROVISIONAL_SIZE, p.y + PROVISIONAL_SIZE);
            match self.mode {
                ToolMode::Box => {
                    self.drawing = Some(Provisional::Box { anchor: p, corner });
                }
                ToolMode::Line => {
                    self.drawing = Some(Provisional::Line { start: p, end: corner });
                }
                ToolMode::Point => {
                    shapes.push(Shape::new_point(p.truncated()).with_category(self.category.as_str()));
                }
                ToolMode::Polygon => {
                    log::debug!("Polygon mode does not create shapes");
                }
            }
        }
        self.render(shapes);
    }

    /// Track the pointer: resize the provisional shape, or update hover.
    pub fn pointer_move(&mut self, shapes: &[Shape], display: Point) {
        if !self.stage.is_attached() {
            return;
        }
        let p = self.stage.to_natural(display);
        match self.drawing.as_mut() {
            Some(provisional) => provisional.follow(p),
            None => self.hover = self.hit_shape(shapes, p),
        }
        self.render(shapes);
    }

    /// Start dragging a resize handle or a shape. Returns false if nothing was grabbed.
    pub fn drag_start(&mut self, shapes: &[Shape], display: Point) -> bool {
        if !self.stage.is_attached() || self.drawing.is_some() {
            return false;
        }
        let p = self.stage.to_natural(display);

        let handle = self.selected.and_then(|index| {
            let rect = shapes.get(index).and_then(box_rect)?;
            HANDLE_OFFSETS
                .iter()
                .find(|offset| {
                    p.distance_to(&rect.corner(**offset)) <= HANDLE_RADIUS + HANDLE_STROKE_WIDTH / 2.0
                })
                .map(|offset| Drag::Handle {
                    index,
                    offset: *offset,
                    rect,
                })
        });
        let drag = handle.or_else(|| {
            self.hit_shape(shapes, p).map(|index| Drag::Move {
                index,
                origin: p,
                original: shapes[index].points.clone(),
            })
        });
        if drag.is_none() {
            return false;
        }
        self.drag = drag;
        self.render(shapes);
        true
    }

    pub fn drag_move(&mut self, shapes: &mut [Shape], display: Point) {
        let p = self.stage.to_natural(display);
        match self.drag.as_mut() {
            Some(Drag::Move {
                index,
                origin,
                original,
            }) => {
                let (dx, dy) = (p.x - origin.x, p.y - origin.y);
                if let Some(shape) = shapes.get_mut(*index) {
                    shape.points = original
                        .iter()
                        .map(|q| Point::new(q[0] as f64 + dx, q[1] as f64 + dy).truncated())
                        .collect();
                }
            }
            Some(Drag::Handle {
                index,
                offset,
                rect,
            }) => {
                let mut r = *rect;
                if offset[0] == 0 {
                    r.width += r.x - p.x;
                    r.x = p.x;
                } else {
                    r.width = p.x - r.x;
                }
                if offset[1] == 0 {
                    r.height += r.y - p.y;
                    r.y = p.y;
                } else {
                    r.height = p.y - r.y;
                }
                // Crossing the opposite edge hands the drag to the mirrored corner.
                if r.width < 0.0 {
                    offset[0] ^= 1;
                }
                if r.height < 0.0 {
                    offset[1] ^= 1;
                }
                *rect = r.normalized();
                if let Some(shape) = shapes.get_mut(*index) {
                    shape.points = vec![rect.top_left().truncated(), rect.bottom_right().truncated()];
                    shape.normalize_box();
                }
            }
            None => return,
        }
        self.render(shapes);
    }

    pub fn drag_end(&mut self, shapes: &[Shape]) {
        if self.drag.take().is_some() {
            self.render(shapes);
        }
    }

    /// Discard the provisional shape. Returns false if nothing was being drawn.
    pub fn cancel_draw(&mut self, shapes: &[Shape]) -> bool {
        if self.drawing.take().is_none() {
            return false;
        }
        log::debug!("Drawing cancelled");
        self.render(shapes);
        true
    }

    /// Remove the selected shape from the list.
    pub fn delete_selection(&mut self, shapes: &mut Vec<Shape>) -> Option<Shape> {
        let index = self.selected.take().filter(|i| *i < shapes.len())?;
        let removed = shapes.remove(index);
        self.hover = None;
        self.drag = None;
        log::debug!("Deleted shape {}", index);
        self.render(shapes);
        Some(removed)
    }

    /// Apply the cancel and delete bindings. Keys typed into text inputs are ignored.
    pub fn handle_key(&mut self, shapes: &mut Vec<Shape>, event: &KeyEvent) -> bool {
        if event.kind != KeyKind::Release || event.input_focused {
            return false;
        }
        if event.key == self.bindings.cancel_draw {
            self.cancel_draw(shapes)
        } else if event.key == self.bindings.delete_selection {
            self.delete_selection(shapes).is_some()
        } else {
            false
        }
    }

    /// Set the category of the selected shape.
    pub fn set_selected_category(&mut self, shapes: &mut [Shape], category: &str) -> bool {
        if !self.is_known_category(category) {
            return false;
        }
        match self.selected.and_then(|i| shapes.get_mut(i)) {
            Some(shape) => {
                shape.category = category.to_string();
                true
            }
            None => false,
        }
    }

    /// Set the track ID of the selected shape from free text.
    pub fn set_selected_track_id(&mut self, shapes: &mut [Shape], text: &str) -> bool {
        match self.selected.and_then(|i| shapes.get_mut(i)) {
            Some(shape) => {
                shape.set_track_id_text(text);
                true
            }
            None => false,
        }
    }
}

/// Rectangle of a well-formed box shape.
fn box_rect(shape: &Shape) -> Option<Rect> {
    match (shape.kind, shape.points.as_slice()) {
        (ShapeType::Box, [a, b]) => Some(Rect::from_corners(Point::from(*a), Point::from(*b))),
        _ => None,
    }
}

fn shape_visuals(shape: &Shape) -> Vec<Visual> {
    let points: Vec<Point> = shape.points.iter().map(|p| Point::from(*p)).collect();
    match shape.kind {
        ShapeType::Box => box_rect(shape)
            .map(|rect| {
                vec![
                    Visual::new(Geometry::Rect(rect), SHAPE_COLOR, STROKE_WIDTH)
                        .with_hit_width(BOX_HIT_STROKE_WIDTH),
                ]
            })
            .unwrap_or_default(),
        ShapeType::Point => points
            .first()
            .map(|center| {
                vec![Visual::new(
                    Geometry::Circle {
                        center: *center,
                        radius: POINT_RADIUS,
                    },
                    SHAPE_COLOR,
                    POINT_STROKE_WIDTH,
                )]
            })
            .unwrap_or_default(),
        ShapeType::Line | ShapeType::Polyline | ShapeType::Polygon => {
            let mut segments: Vec<(Point, Point)> =
                points.windows(2).map(|w| (w[0], w[1])).collect();
            if shape.kind == ShapeType::Polygon && points.len() > 2 {
                segments.push((points[points.len() - 1], points[0]));
            }
            segments
                .into_iter()
                .map(|(a, b)| Visual::new(Geometry::Line(a, b), SHAPE_COLOR, STROKE_WIDTH))
                .collect()
        }
    }
}

/// Hit test in natural coordinates. Boxes only react near their outline.
fn shape_hit(shape: &Shape, p: Point) -> bool {
    let points: Vec<Point> = shape.points.iter().map(|q| Point::from(*q)).collect();
    match shape.kind {
        ShapeType::Box => {
            box_rect(shape).is_some_and(|r| r.border_distance(&p) <= BOX_HIT_STROKE_WIDTH / 2.0)
        }
        ShapeType::Point => points
            .first()
            .is_some_and(|c| p.distance_to(c) <= POINT_RADIUS + POINT_STROKE_WIDTH / 2.0),
        ShapeType::Line | ShapeType::Polyline | ShapeType::Polygon => {
            let closing = (shape.kind == ShapeType::Polygon && points.len() > 2)
                .then(|| (points[points.len() - 1], points[0]));
            points
                .windows(2)
                .map(|w| (w[0], w[1]))
                .chain(closing)
                .any(|(a, b)| segment_distance(&p, &a, &b) <= STROKE_WIDTH / 2.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use crate::keyboard::Key;

    fn canvas(mode: ToolMode) -> ShapeCanvas {
        let mut canvas = ShapeCanvas::new(mode, vec!["car".into(), "person".into()], KeyBindings::default());
        canvas.attach_image(Dims::new(800, 600));
        canvas
    }

    fn at(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_box_two_click_protocol() {
        let mut c = canvas(ToolMode::Box);
        c.set_category("car");
        let mut shapes = Vec::new();

        c.click(&mut shapes, at(50.0, 60.0));
        assert!(c.is_drawing());
        assert!(shapes.is_empty());
        assert_eq!(c.scene().layer.last().map(|v| v.stroke), Some(Color::Yellow));

        c.pointer_move(&shapes, at(20.0, 30.0));
        c.click(&mut shapes, at(10.5, 20.9));
        assert!(!c.is_drawing());
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].points, vec![[10, 20], [50, 60]]);
        assert_eq!(shapes[0].category, "car");
        assert_eq!(shapes[0].track_id, None);
        assert_eq!(c.scene().layer.len(), 1);
    }

    #[test]
    fn test_escape_cancels_drawing() {
        let mut c = canvas(ToolMode::Line);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(5.0, 5.0));
        assert!(c.handle_key(&mut shapes, &KeyEvent::release(Key::Escape)));
        assert!(!c.is_drawing());
        assert!(shapes.is_empty());
        assert!(c.scene().layer.is_empty());
    }

    #[test]
    fn test_keys_in_text_input_ignored() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(5.0, 5.0));
        assert!(!c.handle_key(&mut shapes, &KeyEvent::release(Key::Escape).in_input()));
        assert!(!c.handle_key(&mut shapes, &KeyEvent::press(Key::Escape)));
        assert!(c.is_drawing());
    }

    #[test]
    fn test_point_mode_single_click() {
        let mut c = canvas(ToolMode::Point);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(7.9, 8.2));
        assert_eq!(shapes, vec![Shape::new_point([7, 8])]);
        assert!(!c.is_drawing());
    }

    #[test]
    fn test_polygon_mode_creates_nothing() {
        let mut c = canvas(ToolMode::Polygon);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(7.0, 8.0));
        c.click(&mut shapes, at(70.0, 80.0));
        assert!(shapes.is_empty());
        assert!(!c.is_drawing());
    }

    #[test]
    fn test_select_then_empty_click_clears() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(10.0, 30.0));
        assert_eq!(c.selected(), Some(0));
        assert_eq!(c.scene().stroke_of(0), Some(Color::Orange));
        assert_eq!(c.scene().handles.len(), 4);

        c.click(&mut shapes, at(300.0, 300.0));
        assert_eq!(c.selected(), None);
        assert!(!c.is_drawing());
        assert!(c.scene().handles.is_empty());
    }

    #[test]
    fn test_box_interior_is_not_clickable() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([0, 0], [200, 200])];
        c.click(&mut shapes, at(100.0, 100.0));
        assert_eq!(c.selected(), None);
        assert!(c.is_drawing());
    }

    #[test]
    fn test_click_on_shape_while_drawing_commits() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(100.0, 100.0));
        c.click(&mut shapes, at(50.0, 50.0));
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1].points, vec![[50, 50], [100, 100]]);
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn test_delete_reindexes() {
        let mut c = canvas(ToolMode::Point);
        let mut shapes = vec![
            Shape::new_point([10, 10]),
            Shape::new_point([100, 100]),
            Shape::new_point([200, 200]),
        ];
        c.click(&mut shapes, at(100.0, 100.0));
        assert_eq!(c.selected(), Some(1));
        assert!(c.handle_key(&mut shapes, &KeyEvent::release(Key::Delete)));
        assert_eq!(shapes.len(), 2);
        assert_eq!(c.selected(), None);

        // The former third shape now answers to index 1.
        c.click(&mut shapes, at(200.0, 200.0));
        assert_eq!(c.selected(), Some(1));
        let indices: Vec<_> = c.scene().layer.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_delete_without_selection() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        assert!(c.delete_selection(&mut shapes).is_none());
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut c = canvas(ToolMode::Box);
        let shapes = vec![Shape::new_box([10, 10], [50, 50]), Shape::new_line([0, 0], [5, 5])];
        let once = c.render(&shapes).clone();
        let twice = c.render(&shapes).clone();
        assert_eq!(once, twice);
        assert_eq!(twice.layer.len(), 2);
    }

    #[test]
    fn test_pointer_scaled_to_natural_before_hit_test() {
        let mut c = canvas(ToolMode::Box);
        c.resize_display(400.0, 300.0);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        // Display (25, 25) is natural (50, 50), the bottom-right corner.
        c.click(&mut shapes, at(25.0, 25.0));
        assert_eq!(c.selected(), Some(0));
        let scene = c.render(&shapes);
        assert_eq!(scene.size, Dims::new(400, 300));
        assert_eq!(scene.scale, 0.5);
    }

    #[test]
    fn test_drawn_box_stored_in_natural_pixels() {
        let mut c = canvas(ToolMode::Box);
        c.resize_display(400.0, 300.0);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(5.0, 5.0));
        c.click(&mut shapes, at(25.0, 25.0));
        assert_eq!(shapes[0].points, vec![[10, 10], [50, 50]]);
    }

    #[test]
    fn test_hover_color() {
        let mut c = canvas(ToolMode::Box);
        let shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.pointer_move(&shapes, at(10.0, 30.0));
        assert_eq!(c.hovered(), Some(0));
        assert_eq!(c.scene().stroke_of(0), Some(Color::Yellow));
        c.pointer_move(&shapes, at(300.0, 300.0));
        assert_eq!(c.scene().stroke_of(0), Some(Color::Red));
    }

    #[test]
    fn test_top_left_handle_drag() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(10.0, 30.0));
        assert!(c.drag_start(&shapes, at(11.0, 11.0)));
        c.drag_move(&mut shapes, at(5.0, 0.0));
        c.drag_end(&shapes);
        assert_eq!(shapes[0].points, vec![[5, 0], [50, 50]]);
        assert_eq!(c.selected(), Some(0));
        assert_eq!(c.scene().handles.len(), 4);
    }

    #[test]
    fn test_bottom_right_handle_drag() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(10.0, 30.0));
        assert!(c.drag_start(&shapes, at(50.0, 50.0)));
        c.drag_move(&mut shapes, at(80.0, 70.0));
        assert_eq!(shapes[0].points, vec![[10, 10], [80, 70]]);
    }

    #[test]
    fn test_handle_drag_past_opposite_edge_flips() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(10.0, 30.0));
        assert!(c.drag_start(&shapes, at(50.0, 50.0)));
        c.drag_move(&mut shapes, at(0.0, 30.0));
        assert_eq!(shapes[0].points, vec![[0, 10], [10, 30]]);
        // The handle is now the left one; moving further left widens the box.
        c.drag_move(&mut shapes, at(-5.0, 30.0));
        assert_eq!(shapes[0].points, vec![[-5, 10], [10, 30]]);
    }

    #[test]
    fn test_move_drag_hides_handles() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = vec![Shape::new_box([10, 10], [50, 50])];
        c.click(&mut shapes, at(10.0, 30.0));
        assert!(c.drag_start(&shapes, at(30.0, 10.0)));
        assert!(c.scene().handles.is_empty());
        c.drag_move(&mut shapes, at(40.0, 15.0));
        c.drag_end(&shapes);
        assert_eq!(shapes[0].points, vec![[20, 15], [60, 55]]);
        assert_eq!(c.scene().handles.len(), 4);
    }

    #[test]
    fn test_drag_on_empty_canvas() {
        let mut c = canvas(ToolMode::Box);
        let shapes = vec![Shape::new_box([10, 10], [50, 50])];
        assert!(!c.drag_start(&shapes, at(300.0, 300.0)));
    }

    #[test]
    fn test_selected_fields_edit() {
        let mut c = canvas(ToolMode::Point);
        let mut shapes = vec![Shape::new_point([10, 10])];
        assert!(!c.set_selected_track_id(&mut shapes, "3"));
        c.click(&mut shapes, at(10.0, 10.0));
        assert!(c.set_selected_track_id(&mut shapes, "3"));
        assert!(c.set_selected_category(&mut shapes, "person"));
        assert!(!c.set_selected_category(&mut shapes, "tree"));
        assert_eq!(shapes[0].track_id, Some(3));
        assert_eq!(shapes[0].category, "person");
    }

    #[test]
    fn test_mode_switch_discards_provisional() {
        let mut c = canvas(ToolMode::Box);
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(5.0, 5.0));
        c.set_mode(ToolMode::Point, &shapes);
        assert!(!c.is_drawing());
        assert!(c.scene().layer.is_empty());
    }

    #[test]
    fn test_no_image_no_interaction() {
        let mut c = ShapeCanvas::new(ToolMode::Point, vec![], KeyBindings::default());
        let mut shapes = Vec::new();
        c.click(&mut shapes, at(5.0, 5.0));
        assert!(shapes.is_empty());
        assert!(c.render(&shapes).is_empty());
    }

    #[test]
    fn test_category_vocabulary_change_clears_current() {
        let mut c = canvas(ToolMode::Box);
        assert!(c.set_category("person"));
        c.set_categories(vec!["car".into()]);
        assert_eq!(c.category(), "");
        assert!(!c.set_category("person"));
    }
}
