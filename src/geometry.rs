use nalgebra as na;

/// Z-component of `(b - a) x (c - a)`.
///
/// Positive when `a -> b -> c` turns counter-clockwise (in a y-up frame;
/// image space flips the visual sense but not the sign convention).
#[inline]
pub fn orientation(a: na::Point2<f32>, b: na::Point2<f32>, c: na::Point2<f32>) -> f32 {
    let ab = b - a;
    let ac = c - a;

    ab.x * ac.y - ab.y * ac.x
}

/// Strict counter-clockwise test. Collinear points are reported as `false`,
/// so every point belongs to exactly one side of a directed segment.
#[inline(always)]
pub fn ccw(a: na::Point2<f32>, b: na::Point2<f32>, c: na::Point2<f32>) -> bool {
    orientation(a, b, c) > 0.0
}

/// Returns `true` if segment `p1-p2` and segment `p3-p4` properly intersect.
///
/// Each segment's endpoints must fall on different sides of the other one.
/// Because sides are half-open, a zero-length segment or two collinear
/// segments never intersect.
///
/// The half-open split is asymmetric: a point exactly on `p1-p2` sits on
/// the non-ccw side. A path that ends on the line coming from the ccw side
/// therefore already intersects, while one arriving from the other side
/// only does once it leaves toward the ccw side.
pub fn segments_intersect(
    p1: na::Point2<f32>,
    p2: na::Point2<f32>,
    p3: na::Point2<f32>,
    p4: na::Point2<f32>,
) -> bool {
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

#[inline]
pub fn is_finite(p: &na::Point2<f32>) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
