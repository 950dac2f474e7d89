//! Physics related functionality
//!

pub use self::mass::Mass;
pub use self::resolution::{resolve_impact, ImpactBody};
pub use self::resting::{chatter_imminent, release_time, RestingContact};

mod mass;
mod resolution;
mod resting;

use cgmath::prelude::*;
use cgmath::{BaseFloat, Vector2};

/// Global parameters for the physics world
#[derive(Clone, Debug)]
pub struct WorldParameters<S> {
    gravity: Vector2<S>,
    rest_threshold: S,
    thrust_up: Vector2<S>,
    thrust_side: S,
}

impl<S> Default for WorldParameters<S>
where
    S: BaseFloat,
{
    fn default() -> Self {
        WorldParameters::new(Vector2::zero())
    }
}

impl<S> WorldParameters<S>
where
    S: BaseFloat,
{
    /// Setup global parameters for the physics world
    pub fn new(gravity: Vector2<S>) -> Self {
        WorldParameters {
            gravity,
            rest_threshold: S::from(0.2).unwrap(),
            thrust_up: Vector2::new(S::zero(), S::from(400).unwrap()),
            thrust_side: S::from(200).unwrap(),
        }
    }

    /// Set the shortest bounce interval tolerated before a contact is put to
    /// rest, in seconds of game time.
    pub fn with_rest_threshold(mut self, rest_threshold: S) -> Self {
        self.rest_threshold = rest_threshold;
        self
    }

    /// Set the jetpack thrust: the acceleration added while the upward
    /// binding is held, and the magnitude added sideways.
    pub fn with_thrust(mut self, up: Vector2<S>, side: S) -> Self {
        self.thrust_up = up;
        self.thrust_side = side;
        self
    }

    /// Get gravity
    pub fn gravity(&self) -> Vector2<S> {
        self.gravity
    }

    /// Get the resting threshold
    pub fn rest_threshold(&self) -> S {
        self.rest_threshold
    }

    /// Acceleration added while the upward jetpack binding is held.
    pub fn thrust_up(&self) -> Vector2<S> {
        self.thrust_up
    }

    /// Acceleration added while the leftward jetpack binding is held.
    pub fn thrust_left(&self) -> Vector2<S> {
        Vector2::new(-self.thrust_side, S::zero())
    }

    /// Acceleration added while the rightward jetpack binding is held.
    pub fn thrust_right(&self) -> Vector2<S> {
        Vector2::new(self.thrust_side, S::zero())
    }
}

/// Physics material
///
/// Describes how bouncy a body is: the fraction of velocity kept across an
/// impact. The effective coefficient of an impact is the product of both
/// participants' restitutions.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Material {
    restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material::new(1.)
    }
}

impl Material {
    /// Rock
    pub const ROCK: Material = Material { restitution: 0.1 };
    /// Wood
    pub const WOOD: Material = Material { restitution: 0.2 };
    /// Bouncy Ball
    pub const BOUNCY_BALL: Material = Material { restitution: 0.8 };
    /// Super Ball
    pub const SUPER_BALL: Material = Material { restitution: 0.95 };

    /// Create new material
    pub fn new(restitution: f32) -> Self {
        Self { restitution }
    }

    /// Get restitution
    pub fn restitution<S>(&self) -> S
    where
        S: BaseFloat,
    {
        S::from(self.restitution).unwrap()
    }
}
