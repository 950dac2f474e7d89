//! Level definitions: the bodies a world starts out with.
//!
//! Parsing level files is the embedding's business; this module only defines
//! the data handed to [`Simulation::load_level`](struct.Simulation.html#method.load_level)
//! and the random terrain generator.

use cgmath::{BaseFloat, BaseNum, Point2, Vector2};
use collision::Aabb2;
use rand::Rng;

use core::{Mass, Material, Shape};

/// Raised when a level references an unknown body kind.
#[derive(Debug, Fail)]
#[fail(display = "unknown body kind: {}", _0)]
pub struct LevelError(pub String);

/// Role of a body in a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum BodyKind {
    /// The controllable body: mobile, collidable, drawn as a sprite.
    Player,
    /// Immovable terrain, drawn as its line segments.
    Ground,
    /// A free-moving collidable body.
    Projectile,
}

impl BodyKind {
    /// Parse a body kind name, as found in level files.
    pub fn from_name(name: &str) -> Result<BodyKind, LevelError> {
        match name {
            "player" => Ok(BodyKind::Player),
            "ground" => Ok(BodyKind::Ground),
            "projectile" => Ok(BodyKind::Projectile),
            _ => Err(LevelError(name.to_string())),
        }
    }

    /// Whether bodies of this kind move.
    pub fn is_mobile(self) -> bool {
        match self {
            BodyKind::Ground => false,
            _ => true,
        }
    }
}

/// One body to spawn into the world.
#[derive(Clone)]
pub struct BodyDef<S> {
    /// Role of the body.
    pub kind: BodyKind,
    /// Starting position.
    pub position: Point2<S>,
    /// Local-space outline.
    pub shape: Shape<S>,
    /// Starting velocity; zero when absent. Ignored for immovable kinds.
    pub velocity: Option<Vector2<S>>,
    /// Bounciness.
    pub material: Material,
    /// Mass; infinite for immovable kinds.
    pub mass: Mass<S>,
}

impl<S: BaseNum> std::fmt::Debug for BodyDef<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyDef")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("shape", &self.shape)
            .field("velocity", &self.velocity)
            .field("material", &self.material)
            .field("mass", &self.mass)
            .finish()
    }
}

impl<S> BodyDef<S>
where
    S: BaseFloat,
{
    /// Create a body definition with the defaults for its kind: no starting
    /// velocity, a perfectly elastic material, and unit mass (infinite for
    /// ground).
    pub fn new(kind: BodyKind, position: Point2<S>, shape: Shape<S>) -> Self {
        let mass = if kind.is_mobile() {
            Mass::new(S::one())
        } else {
            Mass::infinite()
        };
        BodyDef {
            kind,
            position,
            shape,
            velocity: None,
            material: Material::default(),
            mass,
        }
    }

    /// Set the starting velocity.
    pub fn with_velocity(mut self, velocity: Vector2<S>) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Set the material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Set the mass.
    pub fn with_mass(mut self, mass: Mass<S>) -> Self {
        self.mass = mass;
        self
    }
}

/// Parameters for randomly generated ground terrain.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSpec<S> {
    /// Horizontal distance between terrain vertices.
    pub interval: S,
    /// Lowest vertex height above the level floor.
    pub min_height: S,
    /// Highest vertex height above the level floor.
    pub max_height: S,
}

/// A complete level: its boundary, the player, fixed bodies, and optionally
/// a spec for generated terrain.
#[derive(Clone, Debug)]
pub struct Level<S> {
    /// World-space extent of the level.
    pub boundary: Aabb2<S>,
    /// The player body, when the level has one.
    pub player: Option<BodyDef<S>>,
    /// The remaining bodies.
    pub fixtures: Vec<BodyDef<S>>,
    /// When present, ground terrain is generated from this spec at load and
    /// on the regenerate action.
    pub terrain: Option<TerrainSpec<S>>,
}

impl<S> Level<S>
where
    S: BaseFloat,
{
    /// Create an empty level with the given boundary.
    pub fn new(boundary: Aabb2<S>) -> Self {
        Level {
            boundary,
            player: None,
            fixtures: Vec::new(),
            terrain: None,
        }
    }

    /// Add the player body.
    pub fn with_player(mut self, player: BodyDef<S>) -> Self {
        self.player = Some(player);
        self
    }

    /// Add a fixed body.
    pub fn with_fixture(mut self, fixture: BodyDef<S>) -> Self {
        self.fixtures.push(fixture);
        self
    }

    /// Enable generated terrain.
    pub fn with_terrain(mut self, terrain: TerrainSpec<S>) -> Self {
        self.terrain = Some(terrain);
        self
    }
}

/// Randomly generate a rough ground terrain across the boundary: one vertex
/// every `interval`, at a height drawn uniformly from
/// `min_height..max_height`, joined into an open polyline.
pub fn generate_terrain<S, R>(rng: &mut R, boundary: &Aabb2<S>, spec: &TerrainSpec<S>) -> Shape<S>
where
    S: BaseFloat,
    R: Rng,
{
    let min = spec.min_height.to_f64().unwrap();
    let max = spec.max_height.to_f64().unwrap();
    let width = boundary.max.x - boundary.min.x;
    let steps = (width / spec.interval).to_usize().unwrap().max(1);
    let mut points = Vec::with_capacity(steps + 1);
    for i in 0..steps + 1 {
        let x = boundary.min.x + spec.interval * S::from(i).unwrap();
        let y = boundary.min.y + S::from(rng.gen_range(min..max)).unwrap();
        points.push(Point2::new(x.min(boundary.max.x), y));
    }
    Shape::polyline(points)
}
