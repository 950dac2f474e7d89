//! The simulation world: bodies, queues, and the operations that keep the
//! two consistent.

use std::collections::HashMap;

use cgmath::prelude::*;
use cgmath::{BaseFloat, Point2, Vector2};
use collision::Aabb2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shrev::{EventChannel, ReaderId};
use specs::prelude::{Builder, Component, DenseVecStorage, Entity, Join, World, WorldExt};

use core::{
    epsilon, release_time, shape_collisions, BodyMotion, CollisionShape, ImpactEvent, Mass,
    Material, Position, RestingContact, Shape, Trajectory, WorldParameters,
};
use controls::Bindings;
use events::{Event, EventHandle, EventQueue};
use input::InputAdapter;
use level::{generate_terrain, BodyDef, BodyKind, Level, TerrainSpec};
use resources::{GameClock, SpeedError};

/// Handles of the pending predicted events that reference this entity.
///
/// A back-reference used only to flip invalidity flags when the entity's
/// trajectory changes; the queue owns the events themselves.
#[derive(Debug, Default)]
pub struct PendingEvents(pub Vec<EventHandle>);

impl Component for PendingEvents {
    type Storage = DenseVecStorage<Self>;
}

/// The resting contacts this entity currently participates in.
#[derive(Debug, Default)]
pub struct RestingSet(pub Vec<RestingContact<Entity>>);

impl Component for RestingSet {
    type Storage = DenseVecStorage<Self>;
}

/// Sprite state exposed to the window layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sprite {
    /// Whether the sprite faces left.
    pub flip: bool,
}

impl Component for Sprite {
    type Storage = DenseVecStorage<Self>;
}

/// Snapshot of one entity for the renderer.
#[derive(Clone, Copy, Debug)]
pub struct RenderState<S> {
    /// The entity.
    pub entity: Entity,
    /// Effective world position at the current game time.
    pub position: Point2<S>,
    /// Sprite flip state, for entities drawn as sprites.
    pub flip: Option<bool>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayerState<S> {
    pub entity: Entity,
    pub position: Point2<S>,
    pub velocity: Vector2<S>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RestInfo<S> {
    /// The normal acceleration delta applied at the resting transition,
    /// re-applied negated when the contact releases.
    pub restore: Vector2<S>,
    pub release: Option<EventHandle>,
    /// Whether the mover owns the striking point of the originating impact
    /// (as opposed to the struck segment).
    pub mover_strikes: bool,
}

/// The a priori physics world.
///
/// Owns the `specs` world holding all bodies, the dual event queues, the
/// clock, and the resting-contact table. All mutation goes through methods
/// here so that every trajectory change invalidates the predictions it
/// staled and schedules fresh ones.
pub struct Simulation<S>
where
    S: BaseFloat + Send + Sync + 'static,
{
    pub(crate) world: World,
    pub(crate) queue: EventQueue<S>,
    pub(crate) clock: GameClock<S>,
    pub(crate) params: WorldParameters<S>,
    pub(crate) input: InputAdapter,
    pub(crate) bindings: Bindings,
    pub(crate) rests: HashMap<RestingContact<Entity>, RestInfo<S>>,
    pub(crate) player: Option<PlayerState<S>>,
    pub(crate) terrain: Option<(Entity, TerrainSpec<S>)>,
    pub(crate) boundary: Aabb2<S>,
    pub(crate) rng: StdRng,
}

impl<S> Simulation<S>
where
    S: BaseFloat + Send + Sync + 'static,
{
    /// Create an empty world with the given physics parameters and key
    /// bindings.
    pub fn new(params: WorldParameters<S>, bindings: Bindings) -> Self {
        let mut world = World::new();
        world.register::<Position<S>>();
        world.register::<Trajectory<S>>();
        world.register::<CollisionShape<S>>();
        world.register::<Mass<S>>();
        world.register::<Material>();
        world.register::<PendingEvents>();
        world.register::<RestingSet>();
        world.register::<Sprite>();
        world.insert(EventChannel::<ImpactEvent<Entity, S>>::new());
        Simulation {
            world,
            queue: EventQueue::new(),
            clock: GameClock::new(),
            params,
            input: InputAdapter::new(),
            bindings,
            rests: HashMap::new(),
            player: None,
            terrain: None,
            boundary: Aabb2::new(Point2::origin(), Point2::origin()),
            rng: StdRng::from_entropy(),
        }
    }

    /// Spawn everything a level defines and predict the initial impacts.
    /// The player's starting state is remembered for the reset action.
    pub fn load_level(&mut self, level: &Level<S>) {
        self.boundary = level.boundary;
        if let Some(def) = level.player.as_ref() {
            let entity = self.spawn(def);
            self.player = Some(PlayerState {
                entity,
                position: def.position,
                velocity: def.velocity.unwrap_or_else(Vector2::zero),
            });
        }
        for def in &level.fixtures {
            self.spawn(def);
        }
        if let Some(spec) = level.terrain {
            let boundary = self.boundary;
            let shape = generate_terrain(&mut self.rng, &boundary, &spec);
            let entity = self.spawn(&BodyDef::new(BodyKind::Ground, Point2::origin(), shape));
            self.terrain = Some((entity, spec));
        }
        info!(
            "level loaded: {} bodies, boundary {:?}",
            self.collidables().len(),
            self.boundary
        );
        self.predict_all();
    }

    fn spawn(&mut self, def: &BodyDef<S>) -> Entity {
        let now = self.clock.game_time();
        let gravity = self.params.gravity();
        let mut builder = self
            .world
            .create_entity()
            .with(Position(def.position))
            .with(CollisionShape::new(def.shape.clone()))
            .with(def.mass)
            .with(def.material.clone())
            .with(PendingEvents::default())
            .with(RestingSet::default());
        if def.kind.is_mobile() {
            builder = builder
                .with(Trajectory::new(
                    def.velocity.unwrap_or_else(Vector2::zero),
                    gravity,
                    now,
                ))
                .with(Sprite::default());
        }
        builder.build()
    }

    /// All entities that take part in collision.
    pub fn collidables(&self) -> Vec<Entity> {
        let entities = self.world.entities();
        let shapes = self.world.read_storage::<CollisionShape<S>>();
        let masses = self.world.read_storage::<Mass<S>>();
        (&*entities, &shapes, &masses)
            .join()
            .map(|(entity, _, _)| entity)
            .collect()
    }

    /// Positioned shape and effective motion of a body at game time `now`.
    fn motion(&mut self, entity: Entity, now: S) -> Option<(Shape<S>, Vector2<S>, Vector2<S>)> {
        let positions = self.world.read_storage::<Position<S>>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        let mut shapes = self.world.write_storage::<CollisionShape<S>>();
        let base = positions.get(entity)?.0;
        let shape = shapes.get_mut(entity)?;
        Some(match trajectories.get(entity) {
            Some(trajectory) => (
                shape.positioned(trajectory.position_at(base, now), now).clone(),
                trajectory.velocity_at(now),
                trajectory.acceleration(),
            ),
            None => (
                shape.positioned(base, now).clone(),
                Vector2::zero(),
                Vector2::zero(),
            ),
        })
    }

    /// Predict and schedule all impacts between a pair of bodies.
    pub(crate) fn predict_pair(&mut self, a: Entity, b: Entity) {
        let now = self.clock.game_time();
        let (shape_a, vel_a, acc_a) = match self.motion(a, now) {
            Some(motion) => motion,
            None => return,
        };
        let (shape_b, vel_b, acc_b) = match self.motion(b, now) {
            Some(motion) => motion,
            None => return,
        };
        let crossings = shape_collisions(
            &BodyMotion::new(&shape_a, vel_a, acc_a),
            &BodyMotion::new(&shape_b, vel_b, acc_b),
        );
        for crossing in crossings {
            let bodies = if crossing.swapped { (b, a) } else { (a, b) };
            self.schedule_impact(ImpactEvent::new(
                bodies,
                crossing.point,
                crossing.segment,
                now + crossing.time,
                crossing.time,
            ));
        }
    }

    /// Predict `entity` against every other collidable except `exclude`.
    pub(crate) fn repredict(&mut self, entity: Entity, exclude: Option<Entity>) {
        for other in self.collidables() {
            if other == entity || Some(other) == exclude {
                continue;
            }
            self.predict_pair(entity, other);
        }
    }

    fn predict_all(&mut self) {
        let bodies = self.collidables();
        for (i, &a) in bodies.iter().enumerate() {
            for &b in &bodies[i + 1..] {
                self.predict_pair(a, b);
            }
        }
    }

    fn schedule_impact(&mut self, event: ImpactEvent<Entity, S>) {
        let eps = epsilon::<S>();
        assert!(event.del_time >= -eps, "predicted an impact in the past");
        // a crossing at the current instant may only fire from the next tick
        let earliest = if event.del_time <= eps {
            self.clock.ticks() + 1
        } else {
            0
        };
        let bodies = event.bodies;
        let time = event.time;
        trace!(
            "impact of {:?} point {} on {:?} segment {} at {:?}",
            bodies.0,
            event.point,
            bodies.1,
            event.segment,
            time
        );
        let handle = self.queue.schedule_game(time, Event::Impact(event), earliest);
        let mut pending = self.world.write_storage::<PendingEvents>();
        for &entity in &[bodies.0, bodies.1] {
            if let Some(p) = pending.get_mut(entity) {
                p.0.push(handle);
            }
        }
    }

    /// Tombstone every pending prediction that references the entity.
    pub(crate) fn invalidate_events(&mut self, entity: Entity) {
        let handles = {
            let mut pending = self.world.write_storage::<PendingEvents>();
            match pending.get_mut(entity) {
                Some(p) => ::std::mem::replace(&mut p.0, Vec::new()),
                None => Vec::new(),
            }
        };
        trace!("invalidating {} events of {:?}", handles.len(), entity);
        for handle in handles {
            self.queue.invalidate(handle);
        }
    }

    pub(crate) fn write_position(&mut self, entity: Entity, position: Point2<S>) {
        let now = self.clock.game_time();
        let mut positions = self.world.write_storage::<Position<S>>();
        let mut trajectories = self.world.write_storage::<Trajectory<S>>();
        if let Some(p) = positions.get_mut(entity) {
            if let Some(trajectory) = trajectories.get_mut(entity) {
                trajectory.rebase(&mut p.0, now);
            }
            p.0 = position;
        }
    }

    pub(crate) fn write_velocity(&mut self, entity: Entity, velocity: Vector2<S>) {
        let now = self.clock.game_time();
        let mut positions = self.world.write_storage::<Position<S>>();
        let mut trajectories = self.world.write_storage::<Trajectory<S>>();
        if let (Some(p), Some(trajectory)) =
            (positions.get_mut(entity), trajectories.get_mut(entity))
        {
            trajectory.rebase(&mut p.0, now);
            trajectory.set_velocity(velocity);
        }
    }

    pub(crate) fn write_acceleration(&mut self, entity: Entity, acceleration: Vector2<S>) {
        let now = self.clock.game_time();
        let mut positions = self.world.write_storage::<Position<S>>();
        let mut trajectories = self.world.write_storage::<Trajectory<S>>();
        if let (Some(p), Some(trajectory)) =
            (positions.get_mut(entity), trajectories.get_mut(entity))
        {
            trajectory.rebase(&mut p.0, now);
            trajectory.set_acceleration(acceleration);
        }
    }

    pub(crate) fn write_acceleration_delta(&mut self, entity: Entity, delta: Vector2<S>) {
        let current = match self.acceleration_of(entity) {
            Some(acceleration) => acceleration,
            None => return,
        };
        self.write_acceleration(entity, current + delta);
    }

    /// Invalidation cascade after a direct trajectory change: stale
    /// predictions are tombstoned, fresh ones scheduled, and resting
    /// releases involving the entity recomputed.
    pub(crate) fn trajectory_changed(&mut self, entity: Entity) {
        self.invalidate_events(entity);
        self.repredict(entity, None);
        self.reschedule_releases(entity);
    }

    /// Teleport a body. Pending predictions are invalidated and redone.
    pub fn set_position(&mut self, entity: Entity, position: Point2<S>) {
        self.write_position(entity, position);
        self.trajectory_changed(entity);
    }

    /// Overwrite a body's velocity at the current game time.
    pub fn set_velocity(&mut self, entity: Entity, velocity: Vector2<S>) {
        self.write_velocity(entity, velocity);
        self.trajectory_changed(entity);
    }

    /// Overwrite a body's acceleration at the current game time.
    pub fn set_acceleration(&mut self, entity: Entity, acceleration: Vector2<S>) {
        self.write_acceleration(entity, acceleration);
        self.trajectory_changed(entity);
    }

    /// Add to a body's acceleration, as the jetpack bindings do.
    pub fn add_acceleration(&mut self, entity: Entity, delta: Vector2<S>) {
        self.write_acceleration_delta(entity, delta);
        self.trajectory_changed(entity);
    }

    /// Game time until the contact point slides past its supporting
    /// segment's end, as an absolute game time; `None` for contacts that
    /// never break.
    pub(crate) fn compute_release(
        &mut self,
        contact: &RestingContact<Entity>,
        mover_strikes: bool,
    ) -> Option<S> {
        let now = self.clock.game_time();
        let (point_owner, segment_owner) = if mover_strikes {
            (contact.mover, contact.supporter)
        } else {
            (contact.supporter, contact.mover)
        };
        let (point_shape, point_vel, point_acc) = self.motion(point_owner, now)?;
        let (seg_shape, seg_vel, seg_acc) = self.motion(segment_owner, now)?;
        if contact.point >= point_shape.points().len()
            || contact.segment >= seg_shape.segment_count()
        {
            return None;
        }
        let point = point_shape.point(contact.point);
        let segment = seg_shape.segment(contact.segment);
        let tangent = segment.direction().normalize();
        let v_t = (point_vel - seg_vel).dot(tangent);
        let a_t = (point_acc - seg_acc).dot(tangent);
        let to_forward = (segment.q - point).dot(tangent).max(S::zero());
        let to_backward = (point - segment.p).dot(tangent).max(S::zero());
        release_time(to_forward, to_backward, v_t, a_t).map(|dt| now + dt)
    }

    /// Recompute the release events of every resting contact the entity
    /// participates in.
    pub(crate) fn reschedule_releases(&mut self, entity: Entity) {
        let affected: Vec<RestingContact<Entity>> = self
            .rests
            .keys()
            .filter(|c| c.mover == entity || c.supporter == entity)
            .cloned()
            .collect();
        for contact in affected {
            let (old_release, mover_strikes) = match self.rests.get(&contact) {
                Some(info) => (info.release, info.mover_strikes),
                None => continue,
            };
            if let Some(handle) = old_release {
                self.queue.invalidate(handle);
            }
            let now = self.clock.game_time();
            let ticks = self.clock.ticks();
            let release = self.compute_release(&contact, mover_strikes).map(|time| {
                debug_assert!(time >= now - epsilon::<S>());
                let earliest = if time - now <= epsilon::<S>() {
                    ticks + 1
                } else {
                    0
                };
                self.queue
                    .schedule_game(time.max(now), Event::StopResting(contact), earliest)
            });
            if let Some(info) = self.rests.get_mut(&contact) {
                info.release = release;
            }
        }
    }

    /// Break a resting contact: restore the cancelled acceleration, drop the
    /// records, and redo the predictions of both participants.
    pub(crate) fn release_contact(&mut self, contact: &RestingContact<Entity>) {
        let info = match self.rests.remove(contact) {
            Some(info) => info,
            None => return,
        };
        debug!(
            "releasing {:?} from rest against {:?}",
            contact.mover, contact.supporter
        );
        if let Some(handle) = info.release {
            self.queue.invalidate(handle);
        }
        {
            let mut sets = self.world.write_storage::<RestingSet>();
            for &entity in &[contact.mover, contact.supporter] {
                if let Some(set) = sets.get_mut(entity) {
                    set.0.retain(|c| c != contact);
                }
            }
        }
        self.write_acceleration_delta(contact.mover, -info.restore);
        self.invalidate_events(contact.mover);
        self.invalidate_events(contact.supporter);
        self.repredict(contact.mover, Some(contact.supporter));
        self.repredict(contact.supporter, Some(contact.mover));
        self.predict_pair(contact.mover, contact.supporter);
        self.reschedule_releases(contact.mover);
    }

    /// Break every resting contact the entity participates in.
    pub(crate) fn release_contacts_of(&mut self, entity: Entity) {
        let affected: Vec<RestingContact<Entity>> = self
            .rests
            .keys()
            .filter(|c| c.mover == entity || c.supporter == entity)
            .cloned()
            .collect();
        for contact in affected {
            self.release_contact(&contact);
        }
    }

    /// Drop dead handles from every back-reference list.
    pub(crate) fn prune_backrefs(&mut self) {
        let mut pending = self.world.write_storage::<PendingEvents>();
        let queue = &self.queue;
        for p in (&mut pending).join() {
            p.0.retain(|&handle| queue.is_live(handle));
        }
    }

    /// Point sprites along their direction of travel.
    pub(crate) fn refresh_sprites(&mut self) {
        let now = self.clock.game_time();
        let eps = epsilon::<S>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        let mut sprites = self.world.write_storage::<Sprite>();
        for (trajectory, sprite) in (&trajectories, &mut sprites).join() {
            let vx = trajectory.velocity_at(now).x;
            if vx < -eps {
                sprite.flip = true;
            } else if vx > eps {
                sprite.flip = false;
            }
        }
    }

    /// Effective world position of a body at the current game time.
    pub fn effective_position(&self, entity: Entity) -> Option<Point2<S>> {
        let now = self.clock.game_time();
        let positions = self.world.read_storage::<Position<S>>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        let base = positions.get(entity)?.0;
        Some(match trajectories.get(entity) {
            Some(trajectory) => trajectory.position_at(base, now),
            None => base,
        })
    }

    /// Effective velocity of a body at the current game time; zero for
    /// immobile bodies.
    pub fn effective_velocity(&self, entity: Entity) -> Option<Vector2<S>> {
        let now = self.clock.game_time();
        let positions = self.world.read_storage::<Position<S>>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        positions.get(entity)?;
        Some(match trajectories.get(entity) {
            Some(trajectory) => trajectory.velocity_at(now),
            None => Vector2::zero(),
        })
    }

    /// Acceleration of a body; zero for immobile bodies.
    pub fn acceleration_of(&self, entity: Entity) -> Option<Vector2<S>> {
        let positions = self.world.read_storage::<Position<S>>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        positions.get(entity)?;
        Some(match trajectories.get(entity) {
            Some(trajectory) => trajectory.acceleration(),
            None => Vector2::zero(),
        })
    }

    /// Snapshot of every positioned entity for the renderer.
    pub fn render_states(&self) -> Vec<RenderState<S>> {
        let now = self.clock.game_time();
        let entities = self.world.entities();
        let positions = self.world.read_storage::<Position<S>>();
        let trajectories = self.world.read_storage::<Trajectory<S>>();
        let sprites = self.world.read_storage::<Sprite>();
        let mut states = Vec::new();
        for (entity, position) in (&*entities, &positions).join() {
            let position = match trajectories.get(entity) {
                Some(trajectory) => trajectory.position_at(position.0, now),
                None => position.0,
            };
            states.push(RenderState {
                entity,
                position,
                flip: sprites.get(entity).map(|sprite| sprite.flip),
            });
        }
        states
    }

    /// Set the game-time rate relative to real time.
    pub fn set_speed(&mut self, speed: S) -> Result<(), SpeedError> {
        self.clock.set_speed(speed)
    }

    /// Freeze or thaw game time.
    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused)
    }

    /// The simulation clock.
    pub fn clock(&self) -> &GameClock<S> {
        &self.clock
    }

    /// The event queues.
    pub fn queue(&self) -> &EventQueue<S> {
        &self.queue
    }

    /// The physics parameters.
    pub fn params(&self) -> &WorldParameters<S> {
        &self.params
    }

    /// The level boundary.
    pub fn boundary(&self) -> &Aabb2<S> {
        &self.boundary
    }

    /// The player entity, when a level with a player is loaded.
    pub fn player(&self) -> Option<Entity> {
        self.player.map(|state| state.entity)
    }

    /// The underlying entity world, for read access from the embedding.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Register a reader for the channel of resolved impacts.
    pub fn impact_reader(&mut self) -> ReaderId<ImpactEvent<Entity, S>> {
        self.world
            .fetch_mut::<EventChannel<ImpactEvent<Entity, S>>>()
            .register_reader()
    }

    /// Drain the impacts resolved since the reader last looked.
    pub fn read_impacts(
        &self,
        reader: &mut ReaderId<ImpactEvent<Entity, S>>,
    ) -> Vec<ImpactEvent<Entity, S>> {
        self.world
            .fetch::<EventChannel<ImpactEvent<Entity, S>>>()
            .read(reader)
            .cloned()
            .collect()
    }
}
