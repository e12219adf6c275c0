/// A point in the plane.
pub struct Point {
    /// Horizontal offset.
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Distance from the origin.
    pub fn norm(&self) -> f64 {
        ((self.x * self.x + self.y * self.y) as f64).sqrt()
    }
}
