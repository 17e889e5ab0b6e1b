use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::event::Direction;
use crate::geometry;

/// How a crossing direction is decided.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Moving down the image (increasing y) is forward. Only meaningful for
    /// a roughly horizontal line.
    #[default]
    Vertical,

    /// Motion is projected onto the line normal `(-dy, dx)`; a positive
    /// projection is forward. Works for any line orientation.
    Normal,
}

/// The fixed reference segment objects have to cross.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct Tripwire {
    start: na::Point2<f32>,
    end: na::Point2<f32>,
}

impl Tripwire {
    pub fn new(start: na::Point2<f32>, end: na::Point2<f32>) -> Result<Self, Error> {
        if !geometry::is_finite(&start) || !geometry::is_finite(&end) || start == end {
            return Err(Error::DegenerateLine);
        }

        Ok(Self { start, end })
    }

    /// Horizontal line at `y` from `x0` to `x1`.
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Result<Self, Error> {
        Self::new(na::Point2::new(x0, y), na::Point2::new(x1, y))
    }

    /// Full-width horizontal line placed at `ratio` of the frame height,
    /// snapped to a whole pixel row.
    pub fn from_ratio(dims: (u32, u32), ratio: f32) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::InvalidRatio(ratio));
        }

        let (width, height) = dims;
        let y = (height as f32 * ratio).trunc();

        Self::horizontal(y, 0.0, width as f32)
    }

    #[inline(always)]
    pub fn start(&self) -> na::Point2<f32> {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> na::Point2<f32> {
        self.end
    }

    /// Normal of the line, `(-dy, dx)`. Points toward +y for a
    /// left-to-right horizontal line.
    #[inline]
    pub fn normal(&self) -> na::Vector2<f32> {
        let d = self.end - self.start;

        na::Vector2::new(-d.y, d.x)
    }

    #[inline]
    pub fn crossed_by(&self, from: na::Point2<f32>, to: na::Point2<f32>) -> bool {
        geometry::segments_intersect(self.start, self.end, from, to)
    }

    pub fn direction(
        &self,
        from: na::Point2<f32>,
        to: na::Point2<f32>,
        mode: DirectionMode,
    ) -> Direction {
        let forward = match mode {
            DirectionMode::Vertical => to.y > from.y,
            DirectionMode::Normal => (to - from).dot(&self.normal()) > 0.0,
        };

        if forward {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}
