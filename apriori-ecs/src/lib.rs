//! # Apriori physics kernel
//!
//! The event-driven half of the a priori physics system, wired for
//! [`specs`](https://github.com/amethyst/specs).
//!
//! Where `apriori-core` predicts *when* things collide, this crate decides
//! *what happens then*. A [`Simulation`](struct.Simulation.html) owns a
//! `specs::World` of bodies and two priority queues of future events — one
//! keyed by game time (impacts, resting releases) and one by wall-clock time
//! (key presses and releases). Each tick advances straight from event to
//! event instead of stepping fixed frames:
//!
//! * Game time runs at a configurable multiple of real time and freezes
//!   while paused; game events are dispatched by their projected real time.
//! * Firing an impact reflects the participants' velocities (or puts the
//!   contact to rest when it is about to chatter), invalidates every stale
//!   prediction touching them, and predicts afresh.
//! * Trajectory changes from outside — jetpack thrust, resets — go through
//!   the same invalidation sweep, so the queues only ever hold predictions
//!   consistent with current motion.
//!
//! Resolved impacts are published through a
//! [`shrev`](https://github.com/amethyst/shrev-rs) `EventChannel` for
//! observers such as sound or scoring; the window layer consumes
//! [`render_states`](struct.Simulation.html#method.render_states) and draws.

#![deny(
    missing_docs, trivial_casts, unsafe_code, unstable_features, unused_import_braces,
    unused_qualifications
)]

extern crate apriori_core as core;
extern crate cgmath;
extern crate collision;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate rand;
extern crate shrev;
extern crate specs;

#[cfg(feature = "serializable")]
#[macro_use]
extern crate serde;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub use controls::{Action, BindingError, Bindings};
pub use events::{Event, EventHandle, EventQueue};
pub use input::{InputAdapter, KeyCode, Keyboard};
pub use level::{generate_terrain, BodyDef, BodyKind, Level, LevelError, TerrainSpec};
pub use resources::{GameClock, SpeedError};
pub use scheduler::Flow;
pub use world::{PendingEvents, RenderState, RestingSet, Simulation, Sprite};

mod controls;
mod events;
mod input;
mod level;
mod resources;
mod scheduler;
mod world;
