pub trait Shape {
    fn area(&self) -> f64;
}

pub type Visitor = fn(&dyn Shape) -> bool;
