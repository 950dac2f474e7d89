use cgmath::BaseFloat;

/// Mass
///
/// Mass for a body, with the inverse cached. An infinite mass marks the body
/// as immovable: impacts never change its velocity.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Mass<S> {
    mass: S,
    inverse_mass: S,
}

impl<S> Mass<S>
where
    S: BaseFloat,
{
    /// Create new mass object
    pub fn new(mass: S) -> Self {
        let inverse_mass = if mass.is_infinite() {
            S::zero()
        } else {
            S::one() / mass
        };
        Mass { mass, inverse_mass }
    }

    /// Create new infinite mass object
    pub fn infinite() -> Self {
        Mass::new(S::infinity())
    }

    /// Get mass
    pub fn mass(&self) -> S {
        self.mass
    }

    /// Get inverse mass
    pub fn inverse_mass(&self) -> S {
        self.inverse_mass
    }

    /// Is the body immovable ?
    pub fn is_infinite(&self) -> bool {
        self.mass.is_infinite()
    }
}
