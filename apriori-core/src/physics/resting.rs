use cgmath::BaseFloat;

use util::{epsilon, find_roots, zero_divide};

/// A persistent contact holding a body at rest against a supporting segment.
///
/// Recorded in both participants' contact sets from the resting transition
/// until the release event for the contact. `point` and `segment` keep the
/// indices of the impact that created the contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RestingContact<ID> {
    /// The body whose trajectory was flattened onto the support.
    pub mover: ID,
    /// The body it rests against.
    pub supporter: ID,
    /// Index of the contact point.
    pub point: usize,
    /// Index of the supporting segment.
    pub segment: usize,
}

impl<ID> RestingContact<ID> {
    /// Create a new resting contact record.
    pub fn new(mover: ID, supporter: ID, point: usize, segment: usize) -> Self {
        RestingContact {
            mover,
            supporter,
            point,
            segment,
        }
    }
}

/// Decide whether an impact should put the bodies to rest instead of
/// reflecting.
///
/// Rest begins when the acceleration presses into the support and the
/// post-bounce flight time `2·|v_n|·e / |a_n|` would drop below `threshold`,
/// or when the contact is already stationary along the normal.
///
/// ### Parameters:
///
/// - `v_n`: Normal component of the relative velocity, `≤ 0` at impact.
/// - `a_n`: Normal component of the relative acceleration.
/// - `e`: Combined restitution of the impact.
/// - `threshold`: Shortest tolerated bounce interval, seconds of game time.
pub fn chatter_imminent<S>(v_n: S, a_n: S, e: S, threshold: S) -> bool
where
    S: BaseFloat,
{
    let eps = epsilon::<S>();
    let two = S::from(2).unwrap();
    let pressed = a_n < S::zero() && zero_divide(two * v_n.abs() * e, a_n.abs()) < threshold;
    let stationary = v_n.abs() < eps && a_n.abs() < eps;
    pressed || stationary
}

/// Time until tangential motion carries a resting contact point past either
/// end of its supporting segment, or `None` when it never does.
///
/// The sliding offset follows `s(t) = v_t·t + ½·a_t·t²` along the segment
/// direction; the contact breaks at the smallest non-negative `t` where
/// `s(t)` reaches `to_forward` (distance to the endpoint ahead) or
/// `-to_backward` (distance to the endpoint behind).
pub fn release_time<S>(to_forward: S, to_backward: S, v_t: S, a_t: S) -> Option<S>
where
    S: BaseFloat,
{
    debug_assert!(to_forward >= S::zero() && to_backward >= S::zero());
    let eps = epsilon::<S>();
    let half = S::from(0.5).unwrap();
    let mut soonest: Option<S> = None;
    for &target in &[to_forward, -to_backward] {
        let roots = match find_roots(half * a_t, v_t, -target) {
            Ok(roots) => roots,
            Err(_) => continue,
        };
        for root in roots {
            if root < -eps {
                continue;
            }
            let root = root.max(S::zero());
            soonest = Some(match soonest {
                Some(best) => best.min(root),
                None => root,
            });
        }
    }
    soonest
}
