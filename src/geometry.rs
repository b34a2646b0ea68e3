//! Geometry and coordinate transforms.
//!
//! Annotations are stored in the natural pixel space of the source image,
//! while pointer events arrive in the space of the displayed (possibly
//! stretched) image element. [`DisplayTransform`] converts between the two.

use serde::{Deserialize, Serialize};

/// A 2D point. Depending on context it is in natural or display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Truncate both components toward zero, the way stored points are produced.
    pub fn truncated(&self) -> [i64; 2] {
        [self.x as i64, self.y as i64]
    }
}

impl From<[i64; 2]> for Point {
    fn from(p: [i64; 2]) -> Self {
        Point::new(p[0] as f64, p[1] as f64)
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
///
/// Width and height may be negative while a handle is being dragged;
/// [`Rect::normalized`] restores the positive form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle spanning two corner points, in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self {
            x: p1.x.min(p2.x),
            y: p1.y.min(p2.y),
            width: (p1.x - p2.x).abs(),
            height: (p1.y - p2.y).abs(),
        }
    }

    /// Same rectangle with non-negative width and height.
    pub fn normalized(&self) -> Self {
        Self::from_corners(self.top_left(), self.bottom_right())
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Corner selected by a unit offset: (0,0) top-left, (1,1) bottom-right.
    pub fn corner(&self, offset: [u8; 2]) -> Point {
        Point::new(
            self.x + f64::from(offset[0]) * self.width,
            self.y + f64::from(offset[1]) * self.height,
        )
    }

    /// Check if a point is inside the rectangle, edges included.
    pub fn contains(&self, p: &Point) -> bool {
        let r = self.normalized();
        p.x >= r.x && p.x <= r.x + r.width && p.y >= r.y && p.y <= r.y + r.height
    }

    /// Distance from a point to the nearest edge of the rectangle outline.
    pub fn border_distance(&self, p: &Point) -> f64 {
        let r = self.normalized();
        let tl = r.top_left();
        let tr = Point::new(r.x + r.width, r.y);
        let br = r.bottom_right();
        let bl = Point::new(r.x, r.y + r.height);
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
            .iter()
            .map(|(a, b)| segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Move the rectangle by a delta.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Width/height pair of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Uniform scale between natural image pixels and the displayed image element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    scale: f64,
}

impl DisplayTransform {
    /// Identity transform (display size equals natural size).
    pub fn identity() -> Self {
        Self { scale: 1.0 }
    }

    /// Fit the natural image into the displayed element:
    /// `min(displayed_w / natural_w, displayed_h / natural_h)`.
    ///
    /// Degenerate sizes fall back to the identity transform.
    pub fn fit(natural: Dims, displayed_width: f64, displayed_height: f64) -> Self {
        if natural.width == 0 || natural.height == 0 {
            return Self::identity();
        }
        let scale = (displayed_width / f64::from(natural.width))
            .min(displayed_height / f64::from(natural.height));
        if scale.is_finite() && scale > 0.0 {
            Self { scale }
        } else {
            Self::identity()
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Convert a pointer position on the displayed element to natural coordinates.
    pub fn to_natural(&self, display: Point) -> Point {
        Point::new(display.x / self.scale, display.y / self.scale)
    }

    /// Convert natural coordinates to the displayed element.
    pub fn to_display(&self, natural: Point) -> Point {
        Point::new(natural.x * self.scale, natural.y * self.scale)
    }

    /// Size of the drawing stage for an image, truncated to whole pixels.
    pub fn stage_size(&self, natural: Dims) -> Dims {
        Dims::new(
            (self.scale * f64::from(natural.width)) as u32,
            (self.scale * f64::from(natural.height)) as u32,
        )
    }
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::identity()
    }
}
