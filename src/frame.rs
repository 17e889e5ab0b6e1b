use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::observation::Observation;

pub struct Frame<Id> {
    pub dims: (u32, u32),
    pub observations: Vec<Observation<Id>>,
    pub timestamp: f32, // in seconds
}

impl<Id> Frame<Id> {
    pub fn new(dims: (u32, u32), timestamp: f32, observations: Vec<Observation<Id>>) -> Self {
        Self {
            dims,
            observations,
            timestamp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Observation<Id>> {
        self.observations.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl<Id: DeserializeOwned> Frame<Id> {
    /// Parses one line of a track dump: `<timestamp>: <json array of observations>`.
    pub fn parse_dump_line(line: &str, dims: (u32, u32)) -> Result<Self, Error> {
        let idx = line
            .find(':')
            .ok_or_else(|| Error::Parse("expected `:`".into()))?;

        let (ts, vector) = line.split_at(idx);
        let timestamp = ts
            .trim()
            .parse::<f32>()
            .map_err(|e| Error::Parse(format!("timestamp `{}`: {}", ts.trim(), e)))?;

        let observations = serde_json::from_str(&vector[1..])?;

        Ok(Self::new(dims, timestamp, observations))
    }
}
