use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Increasing y, or along the line normal. Shown as `IN`.
    Forward,
    /// Shown as `OUT`.
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "IN",
            Self::Backward => "OUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted once per identity, on the observation whose path crossed the line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CrossingEvent<Id> {
    pub track_id: Id,
    pub direction: Direction,

    // path segment that crossed: previous -> current centroid
    pub from: na::Point2<f32>,
    pub to: na::Point2<f32>,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    pub forward: u64,
    pub backward: u64,
}

impl Counts {
    #[inline]
    pub fn total(&self) -> u64 {
        self.forward + self.backward
    }

    #[inline]
    pub fn get(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
        }
    }

    #[inline]
    pub(crate) fn increment(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.forward += 1,
            Direction::Backward => self.backward += 1,
        }
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IN: {} OUT: {}", self.forward, self.backward)
    }
}
