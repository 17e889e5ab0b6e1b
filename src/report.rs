use serde_derive::{Deserialize, Serialize};
use std::io::Write;
use tracing::info;

use crate::error::Error;
use crate::event::Counts;

/// Payload of the event-logging endpoint: which camera saw how many objects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    pub camera_id: String,
    pub detection_count: u64,
}

impl EventReport {
    pub fn new(camera_id: impl Into<String>, counts: Counts) -> Self {
        Self {
            camera_id: camera_id.into(),
            detection_count: counts.total(),
        }
    }
}

/// Acknowledgement returned by the logging endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
    pub status: String,
}

impl Ack {
    pub fn logged() -> Self {
        Self {
            message: "Event Logged".into(),
            status: "success".into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub trait EventSink {
    fn report(&mut self, report: &EventReport) -> Result<Ack, Error>;
}

/// Writes reports to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn report(&mut self, report: &EventReport) -> Result<Ack, Error> {
        info!(
            "ALERT: Camera {} detected {} vehicles.",
            report.camera_id, report.detection_count
        );

        Ok(Ack::logged())
    }
}

/// Appends one JSON object per report to `W`.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn report(&mut self, report: &EventReport) -> Result<Ack, Error> {
        serde_json::to_writer(&mut self.out, report)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;

        Ok(Ack::logged())
    }
}
