//! Lazy, time-indexed ballistic trajectories.

use cgmath::{BaseFloat, Point2, Vector2};

/// A ballistic path in relative coordinates under constant acceleration:
/// `r(t) = pos + vel·t + ½·acc·t²`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Parabola<S> {
    /// Position at `t = 0`.
    pub pos: Vector2<S>,
    /// Velocity at `t = 0`.
    pub vel: Vector2<S>,
    /// Constant acceleration.
    pub acc: Vector2<S>,
}

impl<S> Parabola<S>
where
    S: BaseFloat,
{
    /// Create a parabola from its initial state.
    pub fn new(pos: Vector2<S>, vel: Vector2<S>, acc: Vector2<S>) -> Self {
        Parabola { pos, vel, acc }
    }

    /// Position after `t`.
    pub fn position_at(&self, t: S) -> Vector2<S> {
        self.pos + self.vel * t + self.acc * (t * t * S::from(0.5).unwrap())
    }

    /// Velocity after `t`.
    pub fn velocity_at(&self, t: S) -> Vector2<S> {
        self.vel + self.acc * t
    }
}

/// The mobile capability: velocity and acceleration, valid at a stamp.
///
/// The stored velocity is the value *at* `valid_time`; positions and
/// velocities at any later game time are evaluated on demand from the closed
/// form. Overwriting velocity or acceleration goes through
/// [`rebase`](struct.Trajectory.html#method.rebase) first so the base values
/// are never left at a stale time — this is the only mechanism for
/// non-ballistic trajectory change.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Trajectory<S> {
    velocity: Vector2<S>,
    acceleration: Vector2<S>,
    valid_time: S,
}

impl<S> Trajectory<S>
where
    S: BaseFloat,
{
    /// Create a trajectory valid at the given game time.
    pub fn new(velocity: Vector2<S>, acceleration: Vector2<S>, valid_time: S) -> Self {
        Trajectory {
            velocity,
            acceleration,
            valid_time,
        }
    }

    /// The game time the base values are valid at.
    pub fn valid_time(&self) -> S {
        self.valid_time
    }

    /// Velocity at `valid_time`.
    pub fn base_velocity(&self) -> Vector2<S> {
        self.velocity
    }

    /// Constant acceleration.
    pub fn acceleration(&self) -> Vector2<S> {
        self.acceleration
    }

    /// Effective position at game time `t`, given the base position stored
    /// alongside this trajectory.
    pub fn position_at(&self, base: Point2<S>, t: S) -> Point2<S> {
        let dt = t - self.valid_time;
        base + self.velocity * dt + self.acceleration * (dt * dt * S::from(0.5).unwrap())
    }

    /// Effective velocity at game time `t`.
    pub fn velocity_at(&self, t: S) -> Vector2<S> {
        self.velocity + self.acceleration * (t - self.valid_time)
    }

    /// Re-stamp the trajectory at game time `t`, folding the elapsed motion
    /// into `base` and the stored velocity. Effective position and velocity
    /// are unchanged; only the representation moves.
    pub fn rebase(&mut self, base: &mut Point2<S>, t: S) {
        *base = self.position_at(*base, t);
        self.velocity = self.velocity_at(t);
        self.valid_time = t;
    }

    /// Overwrite the velocity. Call [`rebase`](#method.rebase) first so the
    /// stamp is current.
    pub fn set_velocity(&mut self, velocity: Vector2<S>) {
        self.velocity = velocity;
    }

    /// Overwrite the acceleration. Call [`rebase`](#method.rebase) first so
    /// the stamp is current.
    pub fn set_acceleration(&mut self, acceleration: Vector2<S>) {
        self.acceleration = acceleration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parabola_closed_form() {
        let p = Parabola::new(
            Vector2::new(0., 5.),
            Vector2::new(1., 0.),
            Vector2::new(0., -10.),
        );
        assert_ulps_eq!(p.position_at(1.), Vector2::new(1., 0.));
        assert_ulps_eq!(p.velocity_at(1.), Vector2::new(1., -10.));
        assert_ulps_eq!(p.position_at(0.), p.pos);
    }

    #[test]
    fn test_trajectory_lazy_evaluation() {
        let base = Point2::new(0., 5.);
        let t = Trajectory::new(Vector2::new(0., 0.), Vector2::new(0., -10.), 2.);
        // one second after the stamp
        assert_ulps_eq!(t.position_at(base, 3.), Point2::new(0., 0.));
        assert_ulps_eq!(t.velocity_at(3.), Vector2::new(0., -10.));
    }

    #[test]
    fn test_rebase_preserves_state() {
        let mut base = Point2::new(0., 5.);
        let mut t = Trajectory::new(Vector2::new(2., 0.), Vector2::new(0., -10.), 0.);
        let position_before = t.position_at(base, 0.75);
        let velocity_before = t.velocity_at(0.75);
        t.rebase(&mut base, 0.5);
        assert_eq!(t.valid_time(), 0.5);
        assert_ulps_eq!(t.position_at(base, 0.75), position_before);
        assert_ulps_eq!(t.velocity_at(0.75), velocity_before);
    }

    #[test]
    fn test_set_velocity_continuity() {
        let mut base = Point2::new(0., 5.);
        let mut t = Trajectory::new(Vector2::new(0., 0.), Vector2::new(0., -10.), 0.);
        let at = t.position_at(base, 0.5);
        t.rebase(&mut base, 0.5);
        t.set_velocity(Vector2::new(3., 3.));
        assert_ulps_eq!(t.position_at(base, 0.5), at);
        assert_ulps_eq!(t.velocity_at(0.5), Vector2::new(3., 3.));
    }
}
