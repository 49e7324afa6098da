//! Geometry primitives for signature field placement.

/// An axis-aligned rectangle in PDF user-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the lower-left corner
    pub x: f32,
    /// Y coordinate of the lower-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points `(x1, y1)`-`(x2, y2)`.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Corner coordinates `[llx, lly, urx, ury]` as written in a `/Rect` entry.
    pub fn corners(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rect::from_corners(550.0, 80.0, 325.0, 25.0);
        assert_eq!(rect.x, 325.0);
        assert_eq!(rect.y, 25.0);
        assert_eq!(rect.width, 225.0);
        assert_eq!(rect.height, 55.0);
    }

    #[test]
    fn test_corners_round_trip() {
        let rect = Rect::new(325.0, 25.0, 225.0, 55.0);
        assert_eq!(rect.corners(), [325.0, 25.0, 550.0, 80.0]);
    }
}
