//! Math utilities and types
//!
//! Positions, sizes and colours used by layout and rendering.

pub use nalgebra::{Vector2, Vector4};

/// 2D vector type (positions and sizes in pixels)
pub type Vec2 = Vector2<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// RGBA colour, each channel in `0.0..=1.0`
pub type Color = Vec4;

/// Build a colour from a `[r, g, b, a]` array (the form used in config files)
pub fn color_from_array(rgba: [f32; 4]) -> Color {
    Color::new(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Axis-aligned rectangle in window pixels (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    /// Create a rectangle from its corner and extent
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Rectangle at the origin covering `width` x `height`
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Left edge
    pub fn x(&self) -> f32 {
        self.position.x
    }

    /// Top edge
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Width in pixels
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Height in pixels
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Shrink the rectangle by `amount` on every side, never below zero size
    pub fn inset(&self, amount: f32) -> Self {
        let width = (self.size.x - amount * 2.0).max(0.0);
        let height = (self.size.y - amount * 2.0).max(0.0);
        Self::new(self.position.x + amount, self.position.y + amount, width, height)
    }

    /// Check if a point lies inside the rectangle (edges inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x <= self.position.x + self.size.x
            && point.y <= self.position.y + self.size.y
    }
}
