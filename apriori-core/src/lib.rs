//! # Apriori physics core
//!
//! A priori (predictive) 2D collision physics.
//! Uses [`cgmath`](https://github.com/brendanzab/cgmath/) for all computation.
//!
//! Instead of integrating positions step by step and checking for overlap
//! after the fact, bodies follow closed-form parabolic trajectories
//! (`r(t) = p₀ + v·t + ½·a·t²`) and the exact future time of every
//! point-versus-segment impact is solved for analytically. A scheduler (see
//! the `apriori-ecs` crate) then advances straight to the next impact.
//!
//! Features:
//!
//! * Immutable segment/shape primitives with cached `Aabb2` bounds.
//! * A numerically stable quadratic root finder and the epsilon predicates
//!   the solver is built on.
//! * Lazy, time-indexed trajectories: positions and velocities are evaluated
//!   on demand from a base value stamped with its validity time.
//! * The parabola-versus-segment collision predictor, enumerating all
//!   point/segment pairings of two moving shapes.
//! * Impact resolution by reflection with restitution, and resting-contact
//!   detection to cut off bounce chatter.
//! * Uses single or double precision, chosen through the scalar type
//!   parameter.

#![deny(
    missing_docs, trivial_casts, unsafe_code, unstable_features, unused_import_braces,
    unused_qualifications
)]

extern crate cgmath;
extern crate collision;

#[cfg(feature = "specs")]
extern crate specs;

#[cfg(test)]
#[macro_use]
extern crate approx;

#[cfg(feature = "serializable")]
#[macro_use]
extern crate serde;

pub use collide::{
    impact_geometry, parabola_segment, shape_collisions, BodyMotion, CollisionShape, Crossing,
    ImpactEvent, ImpactGeometry,
};
pub use geometry::{cross, perp, reflect, segment_contains_point, Segment, Shape};
pub use physics::{
    chatter_imminent, release_time, resolve_impact, ImpactBody, Mass, Material, RestingContact,
    WorldParameters,
};
pub use trajectory::{Parabola, Trajectory};
pub use util::{epsilon, find_roots, float_equal, sign_of, zero_divide, Roots, RootsError,
               RootsIter};

mod collide;
#[cfg(feature = "specs")]
mod ecs;
mod geometry;
mod physics;
mod trajectory;
mod util;

use cgmath::Point2;

/// World-space reference point of an entity.
///
/// For a body that also carries a [`Trajectory`](struct.Trajectory.html) this
/// is the base value at the trajectory's validity time, not the current
/// position; evaluate `Trajectory::position_at` to get the effective
/// position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Position<S>(pub Point2<S>);
