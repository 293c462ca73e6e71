//! Axis-aligned integer rectangle

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle defined by the corners `(x0, y0)` and `(x1, y1)`.
///
/// Measurements use wrapping `i32` arithmetic, so every operation is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Rectangle {
    /// Create a rectangle holding exactly the given corners
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Horizontal extent, `x1 - x0`. Negative when the corners are inverted.
    pub fn length(&self) -> i32 {
        self.x1.wrapping_sub(self.x0)
    }

    /// Vertical extent, `y1 - y0`. Negative when the corners are inverted.
    pub fn height(&self) -> i32 {
        self.y1.wrapping_sub(self.y0)
    }

    /// Signed area, `length * height`
    pub fn area(&self) -> i32 {
        self.length().wrapping_mul(self.height())
    }

    /// Shift both corners by `(dx, dy)` in place
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x0 = self.x0.wrapping_add(dx);
        self.y0 = self.y0.wrapping_add(dy);
        self.x1 = self.x1.wrapping_add(dx);
        self.y1 = self.y1.wrapping_add(dy);
    }

    pub fn x0(&self) -> i32 {
        self.x0
    }

    pub fn y0(&self) -> i32 {
        self.y0
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    /// All four coordinates as `(x0, y0, x1, y1)`
    pub fn corners(&self) -> (i32, i32, i32, i32) {
        (self.x0, self.y0, self.x1, self.y1)
    }
}

impl From<(i32, i32, i32, i32)> for Rectangle {
    fn from((x0, y0, x1, y1): (i32, i32, i32, i32)) -> Self {
        Self::new(x0, y0, x1, y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_worked_example() {
        let r = Rectangle::new(2, 4, 6, 8);
        assert_eq!(r.length(), 4);
        assert_eq!(r.height(), 4);
        assert_eq!(r.area(), 16);
    }

    #[test]
    fn test_translate_keeps_dimensions() {
        let mut r = Rectangle::new(0, 0, 3, 5);
        r.translate(2, -2);
        assert_eq!(r.corners(), (2, -2, 5, 3));
        assert_eq!(r.length(), 3);
        assert_eq!(r.height(), 5);
        assert_eq!(r.area(), 15);
    }

    #[test]
    fn test_inverted_corners_are_accepted() {
        let r = Rectangle::new(5, 0, 2, 0);
        assert_eq!(r.length(), -3);
        assert_eq!(r.height(), 0);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_negative_area() {
        let r = Rectangle::new(0, 0, -2, 3);
        assert_eq!(r.area(), -6);
    }

    #[test]
    fn test_extreme_coordinates_wrap() {
        let r = Rectangle::new(i32::MIN, 0, i32::MAX, 1);
        assert_eq!(r.length(), -1);

        let mut r = Rectangle::new(i32::MAX, 0, i32::MAX, 0);
        r.translate(1, 0);
        assert_eq!(r.x0(), i32::MIN);
        assert_eq!(r.length(), 0);
    }

    #[test]
    fn test_default_is_degenerate() {
        let r = Rectangle::default();
        assert_eq!(r.corners(), (0, 0, 0, 0));
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_serde_field_names() {
        let r = Rectangle::new(1, 2, 3, 4);
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json, serde_json::json!({"x0": 1, "y0": 2, "x1": 3, "y1": 4}));

        let back: Rectangle = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    fn any_rect() -> impl Strategy<Value = Rectangle> {
        (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>()).prop_map(Rectangle::from)
    }

    proptest! {
        #[test]
        fn measurements_follow_corners(x0 in any::<i32>(), y0 in any::<i32>(), x1 in any::<i32>(), y1 in any::<i32>()) {
            let r = Rectangle::new(x0, y0, x1, y1);
            prop_assert_eq!(r.length(), x1.wrapping_sub(x0));
            prop_assert_eq!(r.height(), y1.wrapping_sub(y0));
            prop_assert_eq!(r.area(), r.length().wrapping_mul(r.height()));
        }

        #[test]
        fn translate_preserves_dimensions(r in any_rect(), dx in any::<i32>(), dy in any::<i32>()) {
            let mut moved = r;
            moved.translate(dx, dy);
            prop_assert_eq!(moved.length(), r.length());
            prop_assert_eq!(moved.height(), r.height());
            prop_assert_eq!(moved.area(), r.area());
        }

        #[test]
        fn translate_by_zero_is_identity(r in any_rect()) {
            let mut moved = r;
            moved.translate(0, 0);
            prop_assert_eq!(moved, r);
        }

        #[test]
        fn translations_compose(
            r in any_rect(),
            dx1 in any::<i32>(), dy1 in any::<i32>(),
            dx2 in any::<i32>(), dy2 in any::<i32>()
        ) {
            let mut stepwise = r;
            stepwise.translate(dx1, dy1);
            stepwise.translate(dx2, dy2);

            let mut once = r;
            once.translate(dx1.wrapping_add(dx2), dy1.wrapping_add(dy2));

            prop_assert_eq!(stepwise.corners(), once.corners());
        }
    }
}
