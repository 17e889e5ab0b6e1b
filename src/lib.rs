pub mod bbox;
pub mod config;
pub mod counter;
pub mod error;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod line;
pub mod observation;
pub mod replay;
pub mod report;

pub use config::CounterConfig;
pub use counter::{CrossingCounter, TrackState};
pub use event::{Counts, CrossingEvent, Direction};
pub use frame::Frame;
pub use line::{DirectionMode, Tripwire};
pub use observation::Observation;
pub use replay::{replay, ReplaySummary};

use error::Error;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::info;

/// Anything the upstream tracker uses to tell objects apart.
pub trait TrackId: Eq + Hash + Clone + fmt::Debug + 'static {}

impl<T> TrackId for T where T: Eq + Hash + Clone + fmt::Debug + 'static {}

pub trait Counting<Id: TrackId> {
    fn update(&mut self, frames: &[Frame<Id>], src: &str)
        -> Result<Vec<CrossingEvent<Id>>, Error>;
    fn counts(&self, src: &str) -> Counts;
    fn reset(&mut self, src: &str);
}

/// One independent [`CrossingCounter`] per video source.
///
/// A source's session is created from the dims of the first frame it
/// delivers, so ratio-based lines land on the right pixel row.
pub struct MultiCounter<Id: TrackId> {
    config: CounterConfig,
    sessions: HashMap<String, CrossingCounter<Id>>,
}

impl<Id: TrackId> MultiCounter<Id> {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    #[inline]
    pub fn session(&self, src: &str) -> Option<&CrossingCounter<Id>> {
        self.sessions.get(src)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

impl<Id: TrackId> Default for MultiCounter<Id> {
    fn default() -> Self {
        Self::new(CounterConfig::default())
    }
}

impl<Id: TrackId> Counting<Id> for MultiCounter<Id> {
    fn update(
        &mut self,
        frames: &[Frame<Id>],
        src: &str,
    ) -> Result<Vec<CrossingEvent<Id>>, Error> {
        let mut events = Vec::new();

        for frame in frames {
            let session = match self.sessions.get_mut(src) {
                Some(session) => session,
                None => {
                    let session = CrossingCounter::from_config(&self.config, frame.dims)?;
                    let line = session.line();
                    info!(
                        "{}: tripwire ({}, {}) -> ({}, {}) for {}x{}",
                        src,
                        line.start().x,
                        line.start().y,
                        line.end().x,
                        line.end().y,
                        frame.dims.0,
                        frame.dims.1
                    );

                    self.sessions.entry(src.to_string()).or_insert(session)
                }
            };

            events.extend(session.observe_frame(frame, &self.config)?);
        }

        Ok(events)
    }

    #[inline]
    fn counts(&self, src: &str) -> Counts {
        self.sessions
            .get(src)
            .map(CrossingCounter::counts)
            .unwrap_or_default()
    }

    fn reset(&mut self, src: &str) {
        if let Some(session) = self.sessions.remove(src) {
            info!("{}: session closed, {}", src, session.counts());
        }
    }
}
