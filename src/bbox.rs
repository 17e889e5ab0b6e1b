use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug + Copy {}

/// Left-top-right-bottom format, contains left top and right bottom corners.
/// This is what most trackers hand out (`xyxy`).
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Left-top-width-height format
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

/// Four raw coordinates tagged with their layout. Serialized as a plain
/// `[f32; 4]` array.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]", bound = "")]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<[f32; 4]> for BBox<F> {
    #[inline]
    fn from(raw: [f32; 4]) -> Self {
        BBox(raw, PhantomData)
    }
}

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    #[inline]
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        BBox([left, top, right, bottom], PhantomData)
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(
            (self.left() + self.right()) / 2.0,
            (self.top() + self.bottom()) / 2.0,
        )
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        BBox([left, top, width, height], PhantomData)
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.0[0] + self.0[2] / 2.0, self.0[1] + self.0[3] / 2.0)
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        BBox([cx, cy, width, height], PhantomData)
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.0[0], self.0[1])
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        BBox::ltrb(v.0[0], v.0[1], v.0[0] + v.0[2], v.0[1] + v.0[3])
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        let w2 = v.0[2] / 2.0;
        let h2 = v.0[3] / 2.0;

        BBox::ltrb(v.0[0] - w2, v.0[1] - h2, v.0[0] + w2, v.0[1] + h2)
    }
}
