//! Bezier curves with up to five control points

use crate::geometry::Vec2;

/// Most control points a path can carry (start, three interior, end)
pub const MAX_CONTROL_POINTS: usize = 5;

/// Parametric curve; the first point is the start, the last the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierPath {
    points: [Vec2; MAX_CONTROL_POINTS],
    len: usize,
}

impl BezierPath {
    /// Straight path between two points
    pub fn line(start: Vec2, end: Vec2) -> Self {
        let mut points = [Vec2::ZERO; MAX_CONTROL_POINTS];
        points[0] = start;
        points[1] = end;
        Self { points, len: 2 }
    }

    /// Build from 2..=5 control points; returns `None` outside that range
    pub fn from_points(control: &[Vec2]) -> Option<Self> {
        if !(2..=MAX_CONTROL_POINTS).contains(&control.len()) {
            return None;
        }
        let mut points = [Vec2::ZERO; MAX_CONTROL_POINTS];
        points[..control.len()].copy_from_slice(control);
        Some(Self {
            points,
            len: control.len(),
        })
    }

    pub fn control_points(&self) -> &[Vec2] {
        &self.points[..self.len]
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn end(&self) -> Vec2 {
        self.points[self.len - 1]
    }

    /// Point at parameter `t` (clamped to `[0, 1]`), by de Casteljau
    pub fn point_at(&self, t: f64) -> Vec2 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mut work = self.points;
        for level in (1..self.len).rev() {
            for i in 0..level {
                work[i] = work[i].lerp(work[i + 1], t);
            }
        }
        work[0]
    }
}
