//! Segment and shape primitives for collision geometry.

use cgmath::prelude::*;
use cgmath::{BaseFloat, BaseNum, Point2, Vector2};
use collision::{Aabb, Aabb2, Union};

use util::{epsilon, float_equal};

/// Rotate a vector a quarter turn counter-clockwise: `(x, y) → (-y, x)`.
pub fn perp<S>(v: Vector2<S>) -> Vector2<S>
where
    S: BaseFloat,
{
    Vector2::new(-v.y, v.x)
}

/// The scalar 2D cross product `x₁·y₂ - y₁·x₂`.
///
/// Its sign tells which side of `a` the vector `b` falls on; it vanishes
/// when the two are parallel.
pub fn cross<S>(a: Vector2<S>, b: Vector2<S>) -> S
where
    S: BaseFloat,
{
    a.x * b.y - a.y * b.x
}

/// Reflect `v` about the unit normal `n`: `v - 2(n·v)n`.
///
/// Preserves magnitude and negates the normal component.
pub fn reflect<S>(v: Vector2<S>, n: Vector2<S>) -> Vector2<S>
where
    S: BaseFloat,
{
    v - n * (S::from(2).unwrap() * n.dot(v))
}

/// Whether `c` lies on the segment from `p` to `q`.
///
/// True iff `c` is colinear with the endpoints (cross product within ε of
/// zero) and lies between them along the axis of greatest extent, with ε
/// slack at the endpoints.
pub fn segment_contains_point<S>(p: Point2<S>, q: Point2<S>, c: Point2<S>) -> bool
where
    S: BaseFloat,
{
    if !float_equal(cross(q - p, c - p), S::zero()) {
        return false;
    }
    if (q.x - p.x).abs() > epsilon() {
        within(p.x, c.x, q.x)
    } else {
        within(p.y, c.y, q.y)
    }
}

fn within<S>(a: S, b: S, c: S) -> bool
where
    S: BaseFloat,
{
    let eps = epsilon::<S>();
    (a - eps <= b && b <= c + eps) || (c - eps <= b && b <= a + eps)
}

/// Line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Segment<S> {
    /// First endpoint.
    pub p: Point2<S>,
    /// Second endpoint.
    pub q: Point2<S>,
}

impl<S> Segment<S>
where
    S: BaseFloat,
{
    /// Create a segment. Endpoints must be distinct.
    pub fn new(p: Point2<S>, q: Point2<S>) -> Self {
        debug_assert!(p != q, "degenerate segment");
        Segment { p, q }
    }

    /// Direction from `p` to `q`, not normalized.
    pub fn direction(&self) -> Vector2<S> {
        self.q - self.p
    }

    /// Unit normal of the segment, the normalized perp of the direction.
    pub fn normal(&self) -> Vector2<S> {
        perp(self.direction()).normalize()
    }

    /// Length of the segment.
    pub fn length(&self) -> S {
        self.direction().magnitude()
    }

    /// Whether the given point lies on the segment.
    pub fn contains(&self, c: Point2<S>) -> bool {
        segment_contains_point(self.p, self.q, c)
    }
}

/// A sequence of points outlining a body, in model or world coordinates.
///
/// When `enclosed`, the outline wraps around from the last point back to the
/// first; open shapes (terrain strips) omit the wrap-around segment. A shape
/// with a single point has no segments at all and collides only through that
/// point.
///
/// The axis-aligned bound over all points is computed once and cached.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Shape<S> {
    points: Vec<Point2<S>>,
    enclosed: bool,
    bound: Aabb2<S>,
}

impl<S: BaseNum> std::fmt::Debug for Shape<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("points", &self.points)
            .field("enclosed", &self.enclosed)
            .field("bound", &self.bound)
            .finish()
    }
}

impl<S> Shape<S>
where
    S: BaseFloat,
{
    /// Create a shape from its outline points.
    pub fn new(points: Vec<Point2<S>>, enclosed: bool) -> Self {
        assert!(!points.is_empty(), "a shape needs at least one point");
        let bound = points
            .iter()
            .skip(1)
            .fold(Aabb2::new(points[0], points[0]), |b, p| {
                b.union(&Aabb2::new(*p, *p))
            });
        Shape {
            points,
            enclosed,
            bound,
        }
    }

    /// Convenience constructor for a closed outline.
    pub fn polygon(points: Vec<Point2<S>>) -> Self {
        Shape::new(points, true)
    }

    /// Convenience constructor for an open outline.
    pub fn polyline(points: Vec<Point2<S>>) -> Self {
        Shape::new(points, false)
    }

    /// The outline points.
    pub fn points(&self) -> &[Point2<S>] {
        &self.points
    }

    /// The point at the given index.
    pub fn point(&self, index: usize) -> Point2<S> {
        self.points[index]
    }

    /// Whether the outline wraps around.
    pub fn is_enclosed(&self) -> bool {
        self.enclosed
    }

    /// Number of segments in the outline.
    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.enclosed => n,
            n => n - 1,
        }
    }

    /// The segment at the given index.
    pub fn segment(&self, index: usize) -> Segment<S> {
        debug_assert!(index < self.segment_count());
        let n = self.points.len();
        Segment::new(self.points[index], self.points[(index + 1) % n])
    }

    /// Iterator over the outline segments.
    pub fn segments<'a>(&'a self) -> impl Iterator<Item = Segment<S>> + 'a {
        (0..self.segment_count()).map(move |i| self.segment(i))
    }

    /// Cached axis-aligned bound over all points.
    pub fn bound(&self) -> &Aabb2<S> {
        &self.bound
    }

    /// Copy of the shape translated by `offset`, bound included.
    pub fn translated(&self, offset: Vector2<S>) -> Shape<S> {
        Shape {
            points: self.points.iter().map(|p| p + offset).collect(),
            enclosed: self.enclosed,
            bound: self.bound.add_v(offset),
        }
    }
}
