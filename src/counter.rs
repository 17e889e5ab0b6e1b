use std::collections::{HashMap, HashSet};

use nalgebra as na;
use tracing::{debug, trace};

use crate::config::CounterConfig;
use crate::error::Error;
use crate::event::{Counts, CrossingEvent};
use crate::frame::Frame;
use crate::geometry;
use crate::line::{DirectionMode, Tripwire};
use crate::TrackId;

/// Where a single identity stands from the counter's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackState {
    /// No history entry and never counted.
    Unseen,
    /// Has a baseline position but has not crossed yet.
    Tracked,
    /// Already produced its crossing. Final for counting, even after the
    /// history entry is evicted.
    Counted,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    pos: na::Point2<f32>,
    last_seen: u64,
}

/// Counting session for one tripwire.
///
/// Holds the last centroid per identity and the set of identities that were
/// already counted. Every identity contributes to exactly one of the two
/// directional counters at most once.
#[derive(Debug)]
pub struct CrossingCounter<Id: TrackId> {
    line: Tripwire,
    mode: DirectionMode,
    idle_frames: Option<u64>,
    history: HashMap<Id, Entry>,
    counted: HashSet<Id>,
    counts: Counts,
    clock: u64,
}

impl<Id: TrackId> CrossingCounter<Id> {
    /// Plain counter: y-delta direction, no eviction.
    pub fn new(line: Tripwire) -> Self {
        Self::with_options(line, DirectionMode::Vertical, None)
    }

    pub fn with_options(line: Tripwire, mode: DirectionMode, idle_frames: Option<u64>) -> Self {
        Self {
            line,
            mode,
            idle_frames,
            history: HashMap::with_capacity(64),
            counted: HashSet::new(),
            counts: Counts::default(),
            clock: 0,
        }
    }

    pub fn from_config(config: &CounterConfig, dims: (u32, u32)) -> Result<Self, Error> {
        let line = config.line.build(dims)?;

        Ok(Self::with_options(line, config.direction, config.idle_frames))
    }

    /// Feeds one centroid for `track_id`.
    ///
    /// The first sighting only records a baseline. Later sightings test the
    /// path from the previous centroid against the line; the first path that
    /// crosses it counts the identity and produces an event. The stored
    /// position is updated in every case.
    pub fn observe(
        &mut self,
        track_id: Id,
        pos: na::Point2<f32>,
    ) -> Result<Option<CrossingEvent<Id>>, Error> {
        if !geometry::is_finite(&pos) {
            return Err(Error::NonFinitePosition { x: pos.x, y: pos.y });
        }

        let entry = Entry {
            pos,
            last_seen: self.clock,
        };

        let prev = match self.history.insert(track_id.clone(), entry) {
            Some(prev) => prev.pos,
            None => {
                trace!("track {:?}: baseline at ({}, {})", track_id, pos.x, pos.y);
                return Ok(None);
            }
        };

        if !self.line.crossed_by(prev, pos) || self.counted.contains(&track_id) {
            return Ok(None);
        }

        let direction = self.line.direction(prev, pos, self.mode);
        self.counts.increment(direction);
        self.counted.insert(track_id.clone());

        debug!(
            "track {:?} crossed {} ({}, {}) -> ({}, {}); {}",
            track_id, direction, prev.x, prev.y, pos.x, pos.y, self.counts
        );

        Ok(Some(CrossingEvent {
            track_id,
            direction,
            from: prev,
            to: pos,
        }))
    }

    /// Closes the current frame: drops history entries that have missed
    /// more than `idle_frames` frames in a row, then moves the clock
    /// forward. Returns how many entries were dropped.
    pub fn advance(&mut self) -> usize {
        let clock = self.clock;
        self.clock += 1;

        let idle_frames = match self.idle_frames {
            Some(n) => n,
            None => return 0,
        };

        // frames missed since last sighting: last_seen + 1 ..= clock
        let before = self.history.len();
        self.history
            .retain(|_, e| clock.saturating_sub(e.last_seen) <= idle_frames);

        let evicted = before - self.history.len();
        if evicted > 0 {
            debug!("evicted {} idle tracks at frame {}", evicted, clock);
        }

        evicted
    }

    /// Observes the accepted observations of `frame` in order, then
    /// advances the clock.
    ///
    /// The frame is applied as a whole or not at all: a non-finite centroid
    /// rejects it before any observation reaches the counter, and the clock
    /// stays where it was.
    pub fn observe_frame(
        &mut self,
        frame: &Frame<Id>,
        config: &CounterConfig,
    ) -> Result<Vec<CrossingEvent<Id>>, Error> {
        let accepted = frame
            .iter()
            .filter(|o| config.accepts(o))
            .map(|o| (o, o.centroid(config.snap_centroids)))
            .collect::<Vec<_>>();

        if let Some((_, pos)) = accepted.iter().find(|(_, p)| !geometry::is_finite(p)) {
            return Err(Error::NonFinitePosition { x: pos.x, y: pos.y });
        }

        let mut events = Vec::new();

        for (obs, pos) in accepted {
            if let Some(event) = self.observe(obs.track_id.clone(), pos)? {
                events.push(event);
            }
        }

        self.advance();

        Ok(events)
    }

    #[inline]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    #[inline]
    pub fn line(&self) -> &Tripwire {
        &self.line
    }

    #[inline]
    pub fn mode(&self) -> DirectionMode {
        self.mode
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.clock
    }

    #[inline]
    pub fn is_counted(&self, track_id: &Id) -> bool {
        self.counted.contains(track_id)
    }

    #[inline]
    pub fn position(&self, track_id: &Id) -> Option<na::Point2<f32>> {
        self.history.get(track_id).map(|e| e.pos)
    }

    pub fn state(&self, track_id: &Id) -> TrackState {
        if self.counted.contains(track_id) {
            TrackState::Counted
        } else if self.history.contains_key(track_id) {
            TrackState::Tracked
        } else {
            TrackState::Unseen
        }
    }

    /// Number of identities with a live history entry.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.history.len()
    }

    /// Number of identities that were counted so far.
    #[inline]
    pub fn counted(&self) -> usize {
        self.counted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::event::Direction;
    use crate::observation::Observation;

    fn pt(x: f32, y: f32) -> na::Point2<f32> {
        na::Point2::new(x, y)
    }

    fn counter() -> CrossingCounter<u32> {
        CrossingCounter::new(Tripwire::horizontal(20.0, 0.0, 100.0).unwrap())
    }

    #[test]
    fn test_forward_crossing_counted_once() {
        let mut c = counter();

        assert_eq!(c.observe(1, pt(50.0, 10.0)).unwrap(), None);

        let event = c.observe(1, pt(50.0, 30.0)).unwrap().unwrap();
        assert_eq!(event.track_id, 1);
        assert_eq!(event.direction, Direction::Forward);
        assert_eq!(event.from, pt(50.0, 10.0));
        assert_eq!(event.to, pt(50.0, 30.0));

        // same position again, then back and forth over the line
        assert_eq!(c.observe(1, pt(50.0, 30.0)).unwrap(), None);
        assert_eq!(c.observe(1, pt(50.0, 10.0)).unwrap(), None);
        assert_eq!(c.observe(1, pt(50.0, 30.0)).unwrap(), None);

        assert_eq!(c.counts(), Counts { forward: 1, backward: 0 });
        assert_eq!(c.state(&1), TrackState::Counted);
    }

    #[test]
    fn test_first_sighting_is_baseline_only() {
        let mut c = counter();

        // even exactly on or far past the line
        assert_eq!(c.observe(1, pt(50.0, 20.0)).unwrap(), None);
        assert_eq!(c.observe(2, pt(50.0, 1000.0)).unwrap(), None);

        assert_eq!(c.counts().total(), 0);
        assert_eq!(c.state(&1), TrackState::Tracked);
        assert_eq!(c.state(&3), TrackState::Unseen);
    }

    #[test]
    fn test_no_crossing_updates_history() {
        let mut c = counter();

        c.observe(1, pt(40.0, 10.0)).unwrap();
        assert_eq!(c.observe(1, pt(40.0, 15.0)).unwrap(), None);
        assert_eq!(c.position(&1), Some(pt(40.0, 15.0)));

        // the next path starts from the updated position
        let event = c.observe(1, pt(40.0, 25.0)).unwrap().unwrap();
        assert_eq!(event.from, pt(40.0, 15.0));
    }

    #[test]
    fn test_backward_crossing() {
        let mut c = counter();

        c.observe(9, pt(10.0, 80.0)).unwrap();
        let event = c.observe(9, pt(12.0, 5.0)).unwrap().unwrap();

        assert_eq!(event.direction, Direction::Backward);
        assert_eq!(c.counts(), Counts { forward: 0, backward: 1 });
    }

    #[test]
    fn test_opposite_directions_do_not_interfere() {
        let mut c = counter();

        c.observe(1, pt(20.0, 10.0)).unwrap();
        c.observe(2, pt(80.0, 30.0)).unwrap();

        let a = c.observe(1, pt(20.0, 30.0)).unwrap().unwrap();
        let b = c.observe(2, pt(80.0, 10.0)).unwrap().unwrap();

        assert_eq!(a.direction, Direction::Forward);
        assert_eq!(b.direction, Direction::Backward);
        assert_eq!(c.counts(), Counts { forward: 1, backward: 1 });
        assert_eq!(c.counted(), 2);
    }

    #[test]
    fn test_path_missing_segment_is_not_counted() {
        let mut c = counter();

        c.observe(1, pt(150.0, 10.0)).unwrap();
        assert_eq!(c.observe(1, pt(150.0, 30.0)).unwrap(), None);
        assert_eq!(c.state(&1), TrackState::Tracked);
    }

    #[test]
    fn test_landing_on_line_counts_once_moving_on() {
        let mut c = counter();

        c.observe(1, pt(50.0, 10.0)).unwrap();
        assert_eq!(c.observe(1, pt(50.0, 20.0)).unwrap(), None);
        let event = c.observe(1, pt(50.0, 28.0)).unwrap().unwrap();

        assert_eq!(event.direction, Direction::Forward);
        assert_eq!(c.counts().total(), 1);
    }

    #[test]
    fn test_rejects_non_finite_without_side_effects() {
        let mut c = counter();

        c.observe(1, pt(50.0, 10.0)).unwrap();

        assert!(matches!(
            c.observe(1, pt(f32::NAN, 30.0)),
            Err(Error::NonFinitePosition { .. })
        ));
        assert!(matches!(
            c.observe(2, pt(1.0, f32::INFINITY)),
            Err(Error::NonFinitePosition { .. })
        ));

        assert_eq!(c.position(&1), Some(pt(50.0, 10.0)));
        assert_eq!(c.state(&2), TrackState::Unseen);
        assert_eq!(c.counts().total(), 0);
    }

    #[test]
    fn test_eviction_drops_idle_history() {
        let line = Tripwire::horizontal(20.0, 0.0, 100.0).unwrap();
        let mut c: CrossingCounter<u32> =
            CrossingCounter::with_options(line, DirectionMode::Vertical, Some(2));

        c.observe(1, pt(50.0, 10.0)).unwrap();
        c.observe(2, pt(60.0, 10.0)).unwrap();

        assert_eq!(c.advance(), 0);
        c.observe(2, pt(60.0, 12.0)).unwrap();
        assert_eq!(c.advance(), 0);
        // track 1 has missed frames 1 and 2, still within the limit
        assert_eq!(c.advance(), 0);
        assert_eq!(c.state(&1), TrackState::Tracked);
        // third missed frame
        assert_eq!(c.advance(), 1);

        assert_eq!(c.tick(), 4);
        assert_eq!(c.state(&1), TrackState::Unseen);
        assert_eq!(c.state(&2), TrackState::Tracked);

        // a reappearing identity starts again from a fresh baseline
        assert_eq!(c.observe(1, pt(50.0, 30.0)).unwrap(), None);
    }

    #[test]
    fn test_eviction_never_uncounts() {
        let line = Tripwire::horizontal(20.0, 0.0, 100.0).unwrap();
        let mut c: CrossingCounter<u32> =
            CrossingCounter::with_options(line, DirectionMode::Vertical, Some(0));

        c.observe(1, pt(50.0, 10.0)).unwrap();
        c.observe(1, pt(50.0, 30.0)).unwrap().unwrap();
        c.advance();
        c.advance();

        assert_eq!(c.tracked(), 0);
        assert_eq!(c.state(&1), TrackState::Counted);

        // crosses again within one frame, still not recounted
        assert_eq!(c.observe(1, pt(50.0, 10.0)).unwrap(), None);
        assert_eq!(c.observe(1, pt(50.0, 30.0)).unwrap(), None);

        assert_eq!(c.counts().total(), 1);
    }

    #[test]
    fn test_no_eviction_by_default() {
        let mut c = counter();

        c.observe(1, pt(50.0, 10.0)).unwrap();
        for _ in 0..1000 {
            assert_eq!(c.advance(), 0);
        }

        assert_eq!(c.position(&1), Some(pt(50.0, 10.0)));
    }

    #[test]
    fn test_observe_frame() {
        let config = CounterConfig {
            classes: Some(vec![2]),
            idle_frames: Some(1),
            ..Default::default()
        };
        // 100 * 0.6 = line at y = 60
        let mut c = CrossingCounter::from_config(&config, (200, 100)).unwrap();
        let car = |id: u32, y: f32| {
            Observation::new(id, BBox::ltrb(10.0, y - 5.0, 20.0, y + 5.0)).with_class(2)
        };
        let person = Observation::new(3, BBox::ltrb(10.0, 0.0, 20.0, 10.0)).with_class(0);

        let first = Frame::new((200, 100), 0.0, vec![car(1, 50.0), car(2, 70.0), person]);
        assert!(c.observe_frame(&first, &config).unwrap().is_empty());
        assert_eq!(c.state(&3), TrackState::Unseen);

        let second = Frame::new((200, 100), 0.04, vec![car(1, 70.5), car(2, 50.0)]);
        let events = c.observe_frame(&second, &config).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].track_id, 1);
        assert_eq!(events[0].direction, Direction::Forward);
        // snapped centroid
        assert_eq!(events[0].to, pt(15.0, 70.0));
        assert_eq!(events[1].direction, Direction::Backward);
        assert_eq!(c.tick(), 2);
    }
    fn frame_at(id: u32, y: f32) -> Frame<u32> {
        Frame::new(
            (200, 100),
            0.0,
            vec![Observation::new(id, BBox::xywh(15.0, y, 10.0, 10.0).as_ltrb())],
        )
    }

    #[test]
    fn test_zero_idle_frames_keeps_tracks_seen_every_frame() {
        let config = CounterConfig {
            idle_frames: Some(0),
            ..Default::default()
        };
        // line at y = 60
        let mut c = CrossingCounter::from_config(&config, (200, 100)).unwrap();

        let mut events = Vec::new();
        for y in [50.0, 55.0, 65.0, 70.0] {
            events.extend(c.observe_frame(&frame_at(1, y), &config).unwrap());
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Forward);
        assert_eq!(c.tracked(), 1);

        // one empty frame is already too many
        c.observe_frame(&Frame::new((200, 100), 0.0, vec![]), &config).unwrap();
        assert_eq!(c.tracked(), 0);
    }

    #[test]
    fn test_single_missed_frame_within_idle_limit() {
        let config = CounterConfig {
            idle_frames: Some(1),
            ..Default::default()
        };
        let mut c = CrossingCounter::from_config(&config, (200, 100)).unwrap();

        c.observe_frame(&frame_at(1, 50.0), &config).unwrap();
        c.observe_frame(&Frame::new((200, 100), 0.0, vec![]), &config).unwrap();
        assert_eq!(c.state(&1), TrackState::Tracked);

        let events = c.observe_frame(&frame_at(1, 70.0), &config).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(c.state(&1), TrackState::Counted);
    }

    #[test]
    fn test_frame_with_non_finite_centroid_is_rejected_whole() {
        let config = CounterConfig::default();
        let mut c = CrossingCounter::from_config(&config, (200, 100)).unwrap();

        c.observe_frame(&frame_at(1, 50.0), &config).unwrap();

        let bad = Frame::new(
            (200, 100),
            0.04,
            vec![
                Observation::new(1, BBox::xywh(15.0, 70.0, 10.0, 10.0).as_ltrb()),
                Observation::new(2, BBox::ltrb(f32::NAN, 0.0, 10.0, 10.0)),
            ],
        );

        assert!(matches!(
            c.observe_frame(&bad, &config),
            Err(Error::NonFinitePosition { .. })
        ));
        assert_eq!(c.counts().total(), 0);
        assert_eq!(c.state(&1), TrackState::Tracked);
        assert_eq!(c.position(&1), Some(pt(15.0, 50.0)));
        assert_eq!(c.state(&2), TrackState::Unseen);
        assert_eq!(c.tick(), 1);

        // the same crossing is still counted once the frame comes in clean
        let events = c.observe_frame(&frame_at(1, 70.0), &config).unwrap();
        assert_eq!(events.len(), 1);
    }
}
