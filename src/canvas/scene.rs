use crate::geometry::{Dims, DisplayTransform, Point, Rect};

/// Stroke and fill colors used by the annotation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Blue,
    Black,
}

impl Color {
    /// CSS color name.
    pub fn css(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Black => "black",
        }
    }
}

/// Geometry of a visual, in natural image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect(Rect),
    Line(Point, Point),
    Circle { center: Point, radius: f64 },
}

/// One element of the display list.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub geometry: Geometry,
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Option<Color>,
    /// Width of the clickable band around the outline
    pub hit_width: f64,
    /// Index of the shape or detection this visual belongs to
    pub index: Option<usize>,
}

impl Visual {
    pub fn new(geometry: Geometry, stroke: Color, stroke_width: f64) -> Self {
        Self {
            geometry,
            stroke,
            stroke_width,
            fill: None,
            hit_width: stroke_width,
            index: None,
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_hit_width(mut self, hit_width: f64) -> Self {
        self.hit_width = hit_width;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// The drawing stage: annotation layer plus the resize-handle layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Stage size on screen, in display pixels
    pub size: Dims,
    /// Natural-to-display scale applied to both layers
    pub scale: f64,
    pub layer: Vec<Visual>,
    pub handles: Vec<Visual>,
}

impl Scene {
    pub fn new(size: Dims, scale: f64) -> Self {
        Self {
            size,
            scale,
            layer: Vec::new(),
            handles: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_empty() && self.handles.is_empty()
    }

    /// Stroke color of the visual for a shape index.
    pub fn stroke_of(&self, index: usize) -> Option<Color> {
        self.layer
            .iter()
            .find(|v| v.index == Some(index))
            .map(|v| v.stroke)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Dims::new(0, 0), 1.0)
    }
}

/// The image the canvas is laid over, and how it is displayed.
///
/// Pointer positions arrive in display coordinates and are converted back
/// to natural image coordinates before any hit test.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    natural: Option<Dims>,
    displayed: Option<(f64, f64)>,
    transform: DisplayTransform,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the loaded frame image.
    pub fn attach_image(&mut self, natural: Dims) {
        self.natural = Some(natural);
        self.refit();
    }

    /// Forget the image; the stage shows nothing until the next image loads.
    pub fn detach(&mut self) {
        self.natural = None;
    }

    /// Record the on-screen size of the image element.
    pub fn resize_display(&mut self, width: f64, height: f64) {
        self.displayed = Some((width, height));
        self.refit();
    }

    fn refit(&mut self) {
        self.transform = match (self.natural, self.displayed) {
            (Some(natural), Some((w, h))) => DisplayTransform::fit(natural, w, h),
            _ => DisplayTransform::identity(),
        };
    }

    pub fn natural(&self) -> Option<Dims> {
        self.natural
    }

    pub fn is_attached(&self) -> bool {
        self.natural.is_some()
    }

    pub fn transform(&self) -> DisplayTransform {
        self.transform
    }

    pub fn to_natural(&self, display: Point) -> Point {
        self.transform.to_natural(display)
    }

    /// Empty scene sized for the current image, if one is attached.
    pub fn blank_scene(&self) -> Option<Scene> {
        let natural = self.natural?;
        Some(Scene::new(
            self.transform.stage_size(natural),
            self.transform.scale(),
        ))
    }
}
