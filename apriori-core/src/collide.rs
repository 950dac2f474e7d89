//! Analytic collision prediction between moving shapes.
//!
//! The predictor works a priori: instead of stepping time and testing for
//! overlap, it solves for the exact future instant a point of one body
//! crosses a segment of the other. With both bodies on parabolic
//! trajectories the relative motion is itself a parabola, and crossing the
//! infinite line through a segment reduces to a quadratic in time.

use cgmath::prelude::*;
use cgmath::{BaseFloat, BaseNum, Point2, Vector2};

use geometry::{cross, segment_contains_point, Segment, Shape};
use trajectory::Parabola;
use util::{epsilon, find_roots};

/// A predicted impact between a point of one body and a segment of another,
/// scheduled for a known game time.
///
/// ### Type parameters:
///
/// - `ID`: The ID type of the body. This is supplied by the user of the
///         library; in the ECS case this will be `Entity`.
/// - `S`: Scalar type.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ImpactEvent<ID, S> {
    /// The two bodies: the owner of the striking point, then the owner of
    /// the struck segment.
    pub bodies: (ID, ID),
    /// Index of the striking point in the first body's shape.
    pub point: usize,
    /// Index of the struck segment in the second body's shape.
    pub segment: usize,
    /// Absolute game time of the impact.
    pub time: S,
    /// Time from prediction to impact, kept for duplicate filtering.
    pub del_time: S,
}

impl<ID, S> ImpactEvent<ID, S> {
    /// Create a new impact event
    pub fn new(bodies: (ID, ID), point: usize, segment: usize, time: S, del_time: S) -> Self {
        ImpactEvent {
            bodies,
            point,
            segment,
            time,
            del_time,
        }
    }
}

/// Snapshot of one body handed to the predictor: its shape positioned at the
/// prediction time, and its effective motion at that time.
pub struct BodyMotion<'a, S: 'a> {
    /// Positioned shape.
    pub shape: &'a Shape<S>,
    /// Effective velocity.
    pub velocity: Vector2<S>,
    /// Acceleration.
    pub acceleration: Vector2<S>,
}

impl<'a, S> BodyMotion<'a, S>
where
    S: BaseFloat,
{
    /// Bundle a shape with its motion.
    pub fn new(shape: &'a Shape<S>, velocity: Vector2<S>, acceleration: Vector2<S>) -> Self {
        BodyMotion {
            shape,
            velocity,
            acceleration,
        }
    }
}

/// A candidate crossing found by [`shape_collisions`](fn.shape_collisions.html),
/// relative to the ordered pair it was asked about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossing<S> {
    /// Time from now until the point meets the segment.
    pub time: S,
    /// Index of the striking point.
    pub point: usize,
    /// Index of the struck segment.
    pub segment: usize,
    /// When set, the striking point belongs to the *second* shape of the
    /// queried pair and the segment to the first.
    pub swapped: bool,
}

/// Times at which a point moving along `parabola` crosses `segment`.
///
/// The crossing condition `(r(t) - p) × (q - p) = 0` expands to the
/// quadratic
///
/// ```text
/// ½·(a×q - a×p)·t² + (v×q - v×p)·t + (p₀×q - p₀×p - p×q) = 0
/// ```
///
/// whose real roots are filtered to `t ≥ -ε` and to crossings that actually
/// land within the segment. A degenerate equation (motion parallel to or
/// entirely within the line) yields no crossings.
pub fn parabola_segment<S>(parabola: &Parabola<S>, segment: &Segment<S>) -> Vec<S>
where
    S: BaseFloat,
{
    let p = segment.p.to_vec();
    let q = segment.q.to_vec();
    let half = S::from(0.5).unwrap();

    let a = half * (cross(parabola.acc, q) - cross(parabola.acc, p));
    let b = cross(parabola.vel, q) - cross(parabola.vel, p);
    let c = cross(parabola.pos, q) - cross(parabola.pos, p) - cross(p, q);

    let roots = match find_roots(a, b, c) {
        Ok(roots) => roots,
        Err(_) => return Vec::new(),
    };
    let eps = epsilon::<S>();
    roots
        .into_iter()
        .filter(|&t| t >= -eps)
        .filter(|&t| {
            segment_contains_point(segment.p, segment.q, Point2::from_vec(parabola.position_at(t)))
        })
        .collect()
}

/// All crossings between two moving shapes.
///
/// Runs the point-versus-segment predictor for every point of `a` against
/// every segment of `b` under their relative motion, then again with the
/// roles swapped and the relative motion negated. Results carry the indices
/// of the participating point and segment; `swapped` records the direction.
pub fn shape_collisions<'a, S>(a: &BodyMotion<'a, S>, b: &BodyMotion<'a, S>) -> Vec<Crossing<S>>
where
    S: BaseFloat,
{
    let mut crossings = Vec::new();
    collect(a, b, false, &mut crossings);
    collect(b, a, true, &mut crossings);
    crossings
}

fn collect<'a, S>(
    striker: &BodyMotion<'a, S>,
    support: &BodyMotion<'a, S>,
    swapped: bool,
    out: &mut Vec<Crossing<S>>,
) where
    S: BaseFloat,
{
    let vel = striker.velocity - support.velocity;
    let acc = striker.acceleration - support.acceleration;
    for (point, p) in striker.shape.points().iter().enumerate() {
        let parabola = Parabola::new(p.to_vec(), vel, acc);
        for segment in 0..support.shape.segment_count() {
            for time in parabola_segment(&parabola, &support.shape.segment(segment)) {
                out.push(Crossing {
                    time,
                    point,
                    segment,
                    swapped,
                });
            }
        }
    }
}

/// Geometry of an impact, derived on demand when the event fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactGeometry<S> {
    /// Unit impact normal, oriented against the striker's relative velocity.
    pub normal: Vector2<S>,
    /// World position of the impact.
    pub position: Point2<S>,
    /// The struck segment in world coordinates at the impact time.
    pub line: Segment<S>,
}

/// Compute the impact normal, position and world segment for a point
/// striking a segment with the given relative velocity.
pub fn impact_geometry<S>(
    point: Point2<S>,
    segment: &Segment<S>,
    rel_velocity: Vector2<S>,
) -> ImpactGeometry<S>
where
    S: BaseFloat,
{
    let mut normal = segment.normal();
    if normal.dot(rel_velocity) > S::zero() {
        normal = -normal;
    }
    ImpactGeometry {
        normal,
        position: point,
        line: *segment,
    }
}

/// The shaped capability: a local shape plus a cached positioned copy.
///
/// The positioned copy is the local shape translated by the body's effective
/// position, memoized on the (time, position) it was computed for so repeat
/// queries within one simulation instant are free.
#[derive(Clone)]
pub struct CollisionShape<S> {
    local: Shape<S>,
    positioned: Shape<S>,
    positioned_at: Option<(S, Point2<S>)>,
}

impl<S: BaseNum> std::fmt::Debug for CollisionShape<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionShape")
            .field("local", &self.local)
            .field("positioned", &self.positioned)
            .field("positioned_at", &self.positioned_at)
            .finish()
    }
}

impl<S> CollisionShape<S>
where
    S: BaseFloat,
{
    /// Create a collision shape from a local-space outline.
    pub fn new(local: Shape<S>) -> Self {
        let positioned = local.clone();
        CollisionShape {
            local,
            positioned,
            positioned_at: None,
        }
    }

    /// The local-space shape.
    pub fn local(&self) -> &Shape<S> {
        &self.local
    }

    /// Replace the local-space shape, dropping the cache. Pending
    /// predictions against this body must be invalidated by the caller.
    pub fn set_local(&mut self, local: Shape<S>) {
        self.local = local;
        self.positioned_at = None;
    }

    /// The shape positioned at the given location and game time.
    pub fn positioned(&mut self, position: Point2<S>, time: S) -> &Shape<S> {
        let key = (time, position);
        if self.positioned_at != Some(key) {
            self.positioned = self.local.translated(position.to_vec());
            self.positioned_at = Some(key);
        }
        &self.positioned
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point2, Vector2};

    use super::*;
    use geometry::reflect;

    fn floor() -> Segment<f64> {
        Segment::new(Point2::new(-10., 0.), Point2::new(10., 0.))
    }

    #[test]
    fn test_free_fall_onto_floor() {
        // drop from (0, 5) under -10: impact after exactly 1 s
        let parabola = Parabola::new(
            Vector2::new(0., 5.),
            Vector2::new(0., 0.),
            Vector2::new(0., -10.),
        );
        let times = parabola_segment(&parabola, &floor());
        assert_eq!(times.len(), 1);
        assert_ulps_eq!(times[0], 1.);
        assert_ulps_eq!(parabola.position_at(times[0]), Vector2::new(0., 0.));
    }

    #[test]
    fn test_level_flight_into_wall() {
        let wall = Segment::new(Point2::new(0., 0.), Point2::new(0., 10.));
        let parabola = Parabola::new(
            Vector2::new(-5., 5.),
            Vector2::new(2., 0.),
            Vector2::new(0., 0.),
        );
        let times = parabola_segment(&parabola, &wall);
        assert_eq!(times.len(), 1);
        assert_ulps_eq!(times[0], 2.5);
        assert_ulps_eq!(parabola.position_at(times[0]), Vector2::new(0., 5.));
    }

    #[test]
    fn test_parallel_motion_misses() {
        // flying parallel above the floor, accelerating along it
        let parabola = Parabola::new(
            Vector2::new(0., 1.),
            Vector2::new(1., 0.),
            Vector2::new(2., 0.),
        );
        assert!(parabola_segment(&parabola, &floor()).is_empty());
    }

    #[test]
    fn test_peak_short_of_line() {
        // rises to y = 0.45 and falls back, never reaching y = 1
        let line = Segment::new(Point2::new(-10., 1.), Point2::new(10., 1.));
        let parabola = Parabola::new(
            Vector2::new(0., 0.),
            Vector2::new(0., 3.),
            Vector2::new(0., -10.),
        );
        assert!(parabola_segment(&parabola, &line).is_empty());
    }

    #[test]
    fn test_crossing_outside_segment_dropped() {
        // crosses the line's extension at x = 20, outside the segment
        let parabola = Parabola::new(
            Vector2::new(20., 5.),
            Vector2::new(0., 0.),
            Vector2::new(0., -10.),
        );
        assert!(parabola_segment(&parabola, &floor()).is_empty());
    }

    #[test]
    fn test_past_crossings_dropped() {
        // moving up away from the floor with no acceleration: only the past
        // crossing at t = -1 exists
        let parabola = Parabola::new(
            Vector2::new(0., 1.),
            Vector2::new(0., 1.),
            Vector2::new(0., 0.),
        );
        assert!(parabola_segment(&parabola, &floor()).is_empty());
    }

    #[test]
    fn test_shape_collisions_both_directions() {
        let ball = Shape::polyline(vec![Point2::new(0., 5.)]);
        let ground = Shape::polyline(vec![Point2::new(-10., 0.), Point2::new(10., 0.)]);
        let falling = BodyMotion::new(&ball, Vector2::new(0., 0.), Vector2::new(0., -10.));
        let still = BodyMotion::new(&ground, Vector2::new(0., 0.), Vector2::new(0., 0.));

        let crossings = shape_collisions(&falling, &still);
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].point, 0);
        assert_eq!(crossings[0].segment, 0);
        assert!(!crossings[0].swapped);
        assert_ulps_eq!(crossings[0].time, 1.);

        // swap the query order: same crossing, opposite orientation
        let crossings = shape_collisions(&still, &falling);
        assert_eq!(crossings.len(), 1);
        assert!(crossings[0].swapped);
    }

    #[test]
    fn test_wedge_corner_against_moving_box() {
        // a falling square lands its bottom edge on a static spike's tip;
        // the spike owns the point, the square owns the segment
        let spike = Shape::polyline(vec![Point2::new(0., 1.), Point2::new(1., 0.)]);
        let square = Shape::polygon(vec![
            Point2::new(-1., 2.),
            Point2::new(1., 2.),
            Point2::new(1., 4.),
            Point2::new(-1., 4.),
        ]);
        let falling = BodyMotion::new(&square, Vector2::new(0., -1.), Vector2::new(0., 0.));
        let still = BodyMotion::new(&spike, Vector2::new(0., 0.), Vector2::new(0., 0.));

        let crossings = shape_collisions(&still, &falling);
        let hit = crossings
            .iter()
            .find(|c| !c.swapped && c.point == 0)
            .expect("spike tip should meet the square's bottom edge");
        // square's bottom edge starts at y = 2, tip at y = 1, closing at 1/s
        assert_ulps_eq!(hit.time, 1.);
        assert_eq!(hit.segment, 0);
    }

    #[test]
    fn test_impact_geometry_flips_normal() {
        let geometry = impact_geometry(Point2::new(0., 0.), &floor(), Vector2::new(0., -10.));
        assert_ulps_eq!(geometry.normal, Vector2::new(0., 1.));
        // striking from below flips it
        let geometry = impact_geometry(Point2::new(0., 0.), &floor(), Vector2::new(0., 10.));
        assert_ulps_eq!(geometry.normal, Vector2::new(0., -1.));
    }

    #[test]
    fn test_reflection_after_impact() {
        let geometry = impact_geometry(Point2::new(0., 0.), &floor(), Vector2::new(0., -10.));
        let bounced = reflect(Vector2::new(0., -10.), geometry.normal) * 0.5;
        assert_ulps_eq!(bounced, Vector2::new(0., 5.));
    }

    #[test]
    fn test_collision_shape_cache() {
        let mut shape = CollisionShape::new(Shape::polyline(vec![
            Point2::new(0., 0.),
            Point2::new(1., 0.),
        ]));
        let at = shape.positioned(Point2::new(10., 0.), 1.).point(0);
        assert_eq!(at, Point2::new(10., 0.));
        // new position at the same time recomputes
        let at = shape.positioned(Point2::new(20., 0.), 1.).point(0);
        assert_eq!(at, Point2::new(20., 0.));
    }
}
