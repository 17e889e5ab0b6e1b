use serde::de::DeserializeOwned;
use std::io::BufRead;
use tracing::{info, warn};

use crate::error::Error;
use crate::frame::Frame;
use crate::report::{EventReport, EventSink};
use crate::{Counting, MultiCounter, TrackId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub skipped: usize,
    pub events: usize,
}

/// Feeds a track dump through `counter` as source `src`.
///
/// Blank lines are ignored and malformed lines are logged and skipped. Each
/// crossing is reported to `sink` with the running total at that crossing.
pub fn replay<Id, R>(
    reader: R,
    dims: (u32, u32),
    src: &str,
    counter: &mut MultiCounter<Id>,
    sink: &mut dyn EventSink,
) -> Result<ReplaySummary, Error>
where
    Id: TrackId + DeserializeOwned,
    R: BufRead,
{
    let mut summary = ReplaySummary::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame<Id> = match Frame::parse_dump_line(&line, dims) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("line {}: skipping frame: {}", lineno + 1, err);
                summary.skipped += 1;
                continue;
            }
        };

        summary.frames += 1;

        let mut running = counter.counts(src);
        let events = counter.update(std::slice::from_ref(&frame), src)?;

        for event in events {
            running.increment(event.direction);
            info!(
                "[{:.2}s] track {:?} {}; {}",
                frame.timestamp, event.track_id, event.direction, running
            );

            let ack = sink.report(&EventReport::new(src, running))?;
            if !ack.is_success() {
                warn!("report not acknowledged: {}", ack.message);
            }

            summary.events += 1;
        }
    }

    Ok(summary)
}
