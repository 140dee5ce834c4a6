//! Graph layout for the spider view
//!
//! - [`spider`]: radial arrangement of mentors and their mentees
//! - [`viewport`]: pan/zoom transform and the graph command surface
//! - [`engine`]: value-memoized re-layout driven by the filtered dataset

pub mod engine;
pub mod spider;
pub mod viewport;

use serde::{Deserialize, Serialize};

pub use engine::LayoutEngine;
pub use spider::{spider_layout, GraphLayout, LayoutConfig, LayoutInput, PlacedNode};
pub use viewport::{GraphCommand, Viewport, ViewportConfig};

/// A point in world (layout) or screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// An empty box that any `include` call replaces
    pub fn empty() -> Self {
        Bounds {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow to contain a circle of `radius` around `pos`
    pub fn include(&mut self, pos: Position, radius: f32) {
        self.min_x = self.min_x.min(pos.x - radius);
        self.min_y = self.min_y.min(pos.y - radius);
        self.max_x = self.max_x.max(pos.x + radius);
        self.max_y = self.max_y.max(pos.y + radius);
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    pub fn center(&self) -> Position {
        if self.is_empty() {
            return Position::default();
        }
        Position::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let mut bounds = Bounds::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.width(), 0.0);
        assert_eq!(bounds.center(), Position::default());

        bounds.include(Position::new(0.0, 0.0), 10.0);
        bounds.include(Position::new(100.0, 50.0), 10.0);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.width(), 120.0);
        assert_eq!(bounds.height(), 70.0);
        assert_eq!(bounds.center(), Position::new(50.0, 25.0));
    }
}
