use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    /// Whether `x` falls inside the half-open horizontal extent `[x, x + w)`.
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x && x < self.right()
    }
}

/// The drawable region a view renders into, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Device pixel ratio.
    pub dpr: f64,
}

impl Viewport {
    /// A viewport anchored at the origin with a device pixel ratio of 1.
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            dpr: 1.0,
        }
    }
}
