//! Screen geometry primitives
//!
//! Integer screen points and rectangles for everything that touches the
//! input backend, plus an `f64` vector type for curve math.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A pixel position in absolute screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: ScreenPoint) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        dx.hypot(dy)
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(f64::from(self.x), f64::from(self.y))
    }
}

impl From<(i32, i32)> for ScreenPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Continuous 2D vector used for curve evaluation and sub-pixel accumulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        (other - *self).length()
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Unit normal rotated +90° in screen space (+Y down), so a positive
    /// offset along it bends a left-to-right path clockwise.
    pub fn unit_normal(&self) -> Vec2 {
        let len = self.length();
        if len <= f64::EPSILON {
            return Vec2::ZERO;
        }
        Vec2::new(-self.y / len, self.x / len)
    }

    /// Round to the nearest pixel
    pub fn round(self) -> ScreenPoint {
        ScreenPoint::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle; covers `x..x+width` and `y..y+height` (exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero or negative area
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        !self.is_degenerate()
            && point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Exact geometric center (may fall between pixels)
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Integer midpoint
    pub fn midpoint(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn min_dimension(&self) -> i32 {
        self.width.min(self.height)
    }

    /// Clamp a point onto the last addressable pixel of the rectangle
    pub fn clamp(&self, point: ScreenPoint) -> ScreenPoint {
        let max_x = self.x + (self.width - 1).max(0);
        let max_y = self.y + (self.height - 1).max(0);
        ScreenPoint::new(point.x.clamp(self.x, max_x), point.y.clamp(self.y, max_y))
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0, 0, 1920, 1080)
    }
}

/// Clickable region that may be narrower than its bounding box
pub trait Shape {
    /// Axis-aligned bounding box
    fn bounds(&self) -> Rect;

    /// Whether the pixel lies inside the shape
    fn contains(&self, point: ScreenPoint) -> bool;
}

impl Shape for Rect {
    fn bounds(&self) -> Rect {
        *self
    }

    fn contains(&self, point: ScreenPoint) -> bool {
        Rect::contains(self, point)
    }
}

/// Simple polygon, e.g. a convex hull reported by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<ScreenPoint>,
}

impl Polygon {
    pub fn new(vertices: Vec<ScreenPoint>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[ScreenPoint] {
        &self.vertices
    }
}

impl Shape for Polygon {
    fn bounds(&self) -> Rect {
        let Some(first) = self.vertices.first() else {
            return Rect::new(0, 0, 0, 0);
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for v in &self.vertices[1..] {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    fn contains(&self, point: ScreenPoint) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }

        // Even-odd rule, sampling the pixel center
        let px = f64::from(point.x) + 0.5;
        let py = f64::from(point.y) + 0.5;
        let mut inside = false;
        let mut j = self.vertices.len() - 1;

        for i in 0..self.vertices.len() {
            let (xi, yi) = (f64::from(self.vertices[i].x), f64::from(self.vertices[i].y));
            let (xj, yj) = (f64::from(self.vertices[j].x), f64::from(self.vertices[j].y));

            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(10, 10, 5, 5);
        assert!(rect.contains(ScreenPoint::new(10, 10)));
        assert!(rect.contains(ScreenPoint::new(14, 14)));
        assert!(!rect.contains(ScreenPoint::new(15, 14)));
        assert!(!Rect::new(0, 0, 0, 10).contains(ScreenPoint::new(0, 0)));
    }

    #[test]
    fn test_clamp_stays_on_last_pixel() {
        let rect = Rect::new(0, 0, 100, 50);
        assert_eq!(rect.clamp(ScreenPoint::new(-5, 80)), ScreenPoint::new(0, 49));
        assert_eq!(rect.clamp(ScreenPoint::new(120, 10)), ScreenPoint::new(99, 10));
    }

    #[test]
    fn test_unit_normal_points_clockwise() {
        // Left-to-right on screen: clockwise bulge is downward (+Y)
        let n = Vec2::new(400.0, 0.0).unit_normal();
        assert!((n.x - 0.0).abs() < 1e-12);
        assert!((n.y - 1.0).abs() < 1e-12);
        assert_eq!(Vec2::ZERO.unit_normal(), Vec2::ZERO);
    }

    #[test]
    fn test_polygon_contains() {
        let triangle = Polygon::new(vec![
            ScreenPoint::new(0, 0),
            ScreenPoint::new(20, 0),
            ScreenPoint::new(0, 20),
        ]);

        assert_eq!(triangle.bounds(), Rect::new(0, 0, 20, 20));
        assert!(triangle.contains(ScreenPoint::new(2, 2)));
        assert!(!triangle.contains(ScreenPoint::new(18, 18)));
    }
}
