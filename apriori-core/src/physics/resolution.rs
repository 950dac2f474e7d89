use cgmath::{BaseFloat, Vector2};

use super::{Mass, Material};
use geometry::reflect;

/// Data used for impact resolution, one side of the impact.
pub struct ImpactBody<'a, S: 'a> {
    /// Effective velocity at the impact time.
    pub velocity: Vector2<S>,
    /// Mass
    pub mass: &'a Mass<S>,
    /// Material
    pub material: &'a Material,
    /// Whether the body has the mobile capability at all. Bodies without it
    /// (terrain) never move, whatever their mass.
    pub mobile: bool,
}

impl<'a, S> ImpactBody<'a, S>
where
    S: BaseFloat,
{
    /// Create resolve data
    pub fn new(
        velocity: Vector2<S>,
        mass: &'a Mass<S>,
        material: &'a Material,
        mobile: bool,
    ) -> Self {
        ImpactBody {
            velocity,
            mass,
            material,
            mobile,
        }
    }

    fn reflects(&self) -> bool {
        self.mobile && !self.mass.is_infinite()
    }
}

/// Perform impact resolution.
///
/// Each mobile, finite-mass participant has its velocity reflected about the
/// impact normal and scaled by the product of both restitution coefficients.
/// Immovable participants come back as `None` and are left untouched.
///
/// ### Parameters:
///
/// - `normal`: Unit impact normal, oriented against the relative velocity of
///   the striking point.
/// - `a`: Resolution data for the point side of the impact
/// - `b`: Resolution data for the segment side of the impact
///
/// ### Returns
///
/// Tuple of new velocities, first for `a`, second for `b`.
pub fn resolve_impact<'a, S>(
    normal: Vector2<S>,
    a: &ImpactBody<'a, S>,
    b: &ImpactBody<'a, S>,
) -> (Option<Vector2<S>>, Option<Vector2<S>>)
where
    S: BaseFloat,
{
    let e = a.material.restitution::<S>() * b.material.restitution::<S>();
    let bounce = |body: &ImpactBody<'a, S>| {
        if body.reflects() {
            Some(reflect(body.velocity, normal) * e)
        } else {
            None
        }
    };
    (bounce(a), bounce(b))
}
