use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::line::{DirectionMode, Tripwire};
use crate::observation::Observation;

pub const DEFAULT_LINE_RATIO: f32 = 0.6;
pub const DEFAULT_IDLE_FRAMES: u64 = 60;

/// Where the tripwire sits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineConfig {
    /// Full-width horizontal line at `ratio` of the frame height.
    Ratio { ratio: f32 },

    /// Absolute segment in pixel coordinates.
    Segment { start: [f32; 2], end: [f32; 2] },
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig::Ratio {
            ratio: DEFAULT_LINE_RATIO,
        }
    }
}

impl LineConfig {
    pub fn build(&self, dims: (u32, u32)) -> Result<Tripwire, Error> {
        match self {
            LineConfig::Ratio { ratio } => Tripwire::from_ratio(dims, *ratio),
            LineConfig::Segment { start, end } => Tripwire::new(
                na::Point2::new(start[0], start[1]),
                na::Point2::new(end[0], end[1]),
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CounterConfig {
    pub line: LineConfig,
    pub direction: DirectionMode,

    /// Frames a track may go unseen before its history entry is dropped.
    /// `None` keeps every entry for the whole session.
    pub idle_frames: Option<u64>,

    /// Truncate centroids to whole pixels.
    pub snap_centroids: bool,

    /// Only count these classes. Observations without a class are skipped
    /// when set.
    pub classes: Option<Vec<i32>>,

    /// Skip observations whose confidence is below this value.
    pub min_confidence: Option<f32>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            direction: DirectionMode::default(),
            idle_frames: Some(DEFAULT_IDLE_FRAMES),
            snap_centroids: true,
            classes: None,
            min_confidence: None,
        }
    }
}

impl CounterConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;

        Self::from_json_str(&contents)
    }

    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let config: CounterConfig = serde_json::from_str(s)?;

        if let LineConfig::Ratio { ratio } = config.line {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::InvalidRatio(ratio));
            }
        }

        Ok(config)
    }

    pub fn accepts<Id>(&self, obs: &Observation<Id>) -> bool {
        if let Some(classes) = &self.classes {
            match obs.class {
                Some(c) if classes.contains(&c) => (),
                _ => return false,
            }
        }

        match (self.min_confidence, obs.confidence) {
            (Some(min), Some(p)) => p >= min,
            _ => true,
        }
    }
}
