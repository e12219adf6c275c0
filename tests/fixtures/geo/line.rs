use super::point::Point;

/// A segment between two points.
pub struct Line {
    pub start: Point,
    pub end: Point,
    label: String,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Line {
            start,
            end,
            label: String::new(),
        }
    }

    // Midpoint and whether it falls on the grid.
    pub fn midpoint(&self) -> (Point, bool) {
        let x = self.start.x + self.end.x;
        let y = self.start.y + self.end.y;
        (Point { x: x / 2, y: y / 2 }, x % 2 == 0 && y % 2 == 0)
    }

    fn label(&self) -> &str {
        &self.label
    }
}
