use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// One tracked box as reported by the upstream tracker for a single frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Observation<Id> {
    #[serde(rename = "id")]
    pub track_id: Id,
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<i32>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl<Id> Observation<Id> {
    pub fn new(track_id: Id, bbox: BBox<Ltrb>) -> Self {
        Self {
            track_id,
            bbox,
            class: None,
            confidence: None,
        }
    }

    pub fn with_class(mut self, class: i32) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Box center; truncated toward zero when `snap` is set, the way pixel
    /// centroids are drawn.
    #[inline]
    pub fn centroid(&self, snap: bool) -> na::Point2<f32> {
        let c = self.bbox.center();

        if snap {
            na::Point2::new(c.x.trunc(), c.y.trunc())
        } else {
            c
        }
    }
}
