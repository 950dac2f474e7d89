//! The tick loop: advance to each due event in order and dispatch it.

use cgmath::prelude::*;
use cgmath::{BaseFloat, Vector2};
use shrev::EventChannel;
use specs::prelude::{Entity, WorldExt};

use core::{
    chatter_imminent, epsilon, impact_geometry, resolve_impact, CollisionShape, ImpactBody,
    ImpactEvent, Mass, Material, RestingContact, Trajectory,
};
use controls::Action;
use events::Event;
use input::{KeyCode, Keyboard};
use level::generate_terrain;
use world::{RestInfo, RestingSet, Simulation};

/// What the driver should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep ticking.
    Running,
    /// The quit binding fired; unwind the loop.
    Quit,
}

enum Stream {
    Real,
    Game,
}

impl<S> Simulation<S>
where
    S: BaseFloat + Send + Sync + 'static,
{
    /// Advance the world to the given wall-clock reading, in milliseconds.
    ///
    /// Input transitions become real-time events first. Then every event —
    /// game-time events by their projected real time, input events by their
    /// literal time — that falls within this frame is dispatched in order,
    /// the clock advancing to each event before its handler runs. Ties
    /// between the streams go to the real-time event, so input preempts
    /// simulation at coincident instants. Finally both queues are swept and
    /// the renderer-facing state refreshed.
    pub fn tick(&mut self, now_millis: u64, keyboard: &Keyboard) -> Flow {
        let now = S::from(now_millis).unwrap() / S::from(1000).unwrap();
        let frame = self.clock.begin_tick(now);
        for (time, event) in self.input.poll(keyboard, frame) {
            self.queue.schedule_real(time, event);
        }
        loop {
            let ticks = self.clock.ticks();
            let due_real = self
                .queue
                .peek_real()
                .map(|(time, _)| time)
                .filter(|&time| time <= frame);
            let due_game = {
                let clock = &self.clock;
                self.queue
                    .peek_game(ticks)
                    .map(|(time, _)| clock.project(time))
                    .filter(|&projected| projected <= frame)
            };
            let stream = match (due_real, due_game) {
                (Some(real), Some(game)) => {
                    if real <= game {
                        Stream::Real
                    } else {
                        Stream::Game
                    }
                }
                (Some(_), None) => Stream::Real,
                (None, Some(_)) => Stream::Game,
                (None, None) => break,
            };
            let (target, event) = match stream {
                Stream::Real => match self.queue.pop_real() {
                    Some((time, event)) => (time, event),
                    None => break,
                },
                Stream::Game => match self.queue.pop_game(ticks) {
                    Some((time, event)) => (self.clock.project(time), event),
                    None => break,
                },
            };
            let target = target.max(self.clock.real_time());
            self.clock.advance_to_real(target);
            if let Flow::Quit = self.dispatch(event) {
                return Flow::Quit;
            }
        }
        self.clock.advance_to_real(frame);
        self.queue.sweep();
        self.prune_backrefs();
        self.refresh_sprites();
        Flow::Running
    }

    fn dispatch(&mut self, event: Event<S>) -> Flow {
        match event {
            Event::Impact(impact) => {
                self.resolve_impact_event(impact);
                Flow::Running
            }
            Event::StopResting(contact) => {
                self.release_contact(&contact);
                Flow::Running
            }
            Event::KeyPress(key) => self.key_pressed(key),
            Event::KeyRelease(key) => {
                self.key_released(key);
                Flow::Running
            }
        }
    }

    /// Resolve a fired impact: skip duplicates and rested pairs, enter
    /// resting when the bounce is about to chatter, otherwise reflect both
    /// participants and redo their predictions.
    fn resolve_impact_event(&mut self, impact: ImpactEvent<Entity, S>) {
        let eps = epsilon::<S>();
        // a prediction made at the instant of contact duplicates the impact
        // that was just resolved
        if impact.del_time.abs() <= eps {
            return;
        }
        if self.in_resting_contact(&impact) {
            return;
        }
        let (striker, support) = impact.bodies;
        let now = self.clock.game_time();
        let (striker_shape, striker_vel, striker_acc) = match self.motion(striker, now) {
            Some(motion) => motion,
            None => return,
        };
        let (support_shape, support_vel, support_acc) = match self.motion(support, now) {
            Some(motion) => motion,
            None => return,
        };
        if impact.point >= striker_shape.points().len()
            || impact.segment >= support_shape.segment_count()
        {
            return;
        }
        let point = striker_shape.point(impact.point);
        let segment = support_shape.segment(impact.segment);
        let rel_velocity = striker_vel - support_vel;
        let geometry = impact_geometry(point, &segment, rel_velocity);
        let normal = geometry.normal;
        let v_n = rel_velocity.dot(normal);
        let a_n = (striker_acc - support_acc).dot(normal);

        let (striker_mobile, support_mobile) = {
            let trajectories = self.world.read_storage::<Trajectory<S>>();
            (
                trajectories.get(striker).is_some(),
                trajectories.get(support).is_some(),
            )
        };
        let (striker_material, support_material) = {
            let materials = self.world.read_storage::<Material>();
            (
                materials.get(striker).cloned().unwrap_or_default(),
                materials.get(support).cloned().unwrap_or_default(),
            )
        };
        let e = striker_material.restitution::<S>() * support_material.restitution::<S>();

        if (striker_mobile || support_mobile)
            && chatter_imminent(v_n, a_n, e, self.params.rest_threshold())
        {
            debug!(
                "impact of {:?} on {:?} at {:?} comes to rest",
                striker, support, now
            );
            self.enter_resting(
                &impact,
                normal,
                (striker_vel, striker_acc),
                (support_vel, support_acc),
                striker_mobile,
            );
            self.publish(impact);
            return;
        }

        let (new_striker, new_support) = {
            let masses = self.world.read_storage::<Mass<S>>();
            let striker_mass = match masses.get(striker) {
                Some(mass) => *mass,
                None => return,
            };
            let support_mass = match masses.get(support) {
                Some(mass) => *mass,
                None => return,
            };
            resolve_impact(
                normal,
                &ImpactBody::new(striker_vel, &striker_mass, &striker_material, striker_mobile),
                &ImpactBody::new(support_vel, &support_mass, &support_material, support_mobile),
            )
        };
        debug!(
            "impact of {:?} on {:?} at {:?}: normal {:?}, e {:?}",
            striker, support, now, normal, e
        );
        if let Some(velocity) = new_striker {
            self.write_velocity(striker, velocity);
        }
        if let Some(velocity) = new_support {
            self.write_velocity(support, velocity);
        }
        self.invalidate_events(striker);
        self.invalidate_events(support);
        self.repredict(striker, Some(support));
        self.repredict(support, Some(striker));
        self.predict_pair(striker, support);
        self.reschedule_releases(striker);
        self.reschedule_releases(support);
        self.publish(impact);
    }

    /// Whether a resting contact between the impact's bodies already covers
    /// the same point/segment pair.
    fn in_resting_contact(&self, impact: &ImpactEvent<Entity, S>) -> bool {
        let (striker, support) = impact.bodies;
        let sets = self.world.read_storage::<RestingSet>();
        match sets.get(striker) {
            Some(set) => set.0.iter().any(|contact| {
                if contact.point != impact.point || contact.segment != impact.segment {
                    return false;
                }
                match self.rests.get(contact) {
                    Some(info) => {
                        let (s, p) = if info.mover_strikes {
                            (contact.mover, contact.supporter)
                        } else {
                            (contact.supporter, contact.mover)
                        };
                        s == striker && p == support
                    }
                    None => false,
                }
            }),
            None => false,
        }
    }

    /// Flatten the mover's trajectory onto the support: cancel the relative
    /// normal velocity and acceleration, record the contact on both sides,
    /// and schedule its release.
    fn enter_resting(
        &mut self,
        impact: &ImpactEvent<Entity, S>,
        normal: Vector2<S>,
        striker_motion: (Vector2<S>, Vector2<S>),
        support_motion: (Vector2<S>, Vector2<S>),
        striker_mobile: bool,
    ) {
        let (striker, support) = impact.bodies;
        let (mover, supporter, mover_strikes) = if striker_mobile {
            (striker, support, true)
        } else {
            (support, striker, false)
        };
        let ((v_m, a_m), (v_o, a_o)) = if mover_strikes {
            (striker_motion, support_motion)
        } else {
            (support_motion, striker_motion)
        };
        let dv = normal * (v_o - v_m).dot(normal);
        let da = normal * (a_o - a_m).dot(normal);
        self.write_velocity(mover, v_m + dv);
        self.write_acceleration(mover, a_m + da);

        let contact = RestingContact::new(mover, supporter, impact.point, impact.segment);
        {
            let mut sets = self.world.write_storage::<RestingSet>();
            for &entity in &[mover, supporter] {
                if let Some(set) = sets.get_mut(entity) {
                    set.0.push(contact);
                }
            }
        }
        self.rests.insert(
            contact,
            RestInfo {
                restore: da,
                release: None,
                mover_strikes,
            },
        );
        self.invalidate_events(mover);
        self.repredict(mover, None);
        self.reschedule_releases(mover);
    }

    fn publish(&mut self, impact: ImpactEvent<Entity, S>) {
        self.world
            .fetch_mut::<EventChannel<ImpactEvent<Entity, S>>>()
            .single_write(impact);
    }

    fn key_pressed(&mut self, key: KeyCode) -> Flow {
        let actions: Vec<Action> = self.bindings.actions(key).to_vec();
        for action in actions {
            debug!("{:?} pressed: {:?}", key, action);
            match action {
                Action::Quit => return Flow::Quit,
                Action::Pause => self.clock.toggle_pause(),
                Action::Reset => self.reset_player(),
                Action::Regenerate => self.regenerate_terrain(),
                Action::JetpackUp => {
                    let thrust = self.params.thrust_up();
                    self.nudge_player(thrust);
                }
                Action::JetpackLeft => {
                    let thrust = self.params.thrust_left();
                    self.nudge_player(thrust);
                }
                Action::JetpackRight => {
                    let thrust = self.params.thrust_right();
                    self.nudge_player(thrust);
                }
            }
        }
        Flow::Running
    }

    fn key_released(&mut self, key: KeyCode) {
        let actions: Vec<Action> = self.bindings.actions(key).to_vec();
        for action in actions {
            match action {
                Action::JetpackUp => {
                    let thrust = self.params.thrust_up();
                    self.nudge_player(-thrust);
                }
                Action::JetpackLeft => {
                    let thrust = self.params.thrust_left();
                    self.nudge_player(-thrust);
                }
                Action::JetpackRight => {
                    let thrust = self.params.thrust_right();
                    self.nudge_player(-thrust);
                }
                _ => {}
            }
        }
    }

    fn nudge_player(&mut self, delta: Vector2<S>) {
        let player = match self.player {
            Some(state) => state.entity,
            None => return,
        };
        self.add_acceleration(player, delta);
    }

    /// Put the player back at the level's starting state and unpause.
    fn reset_player(&mut self) {
        let state = match self.player {
            Some(state) => state,
            None => return,
        };
        self.release_contacts_of(state.entity);
        self.write_position(state.entity, state.position);
        self.write_velocity(state.entity, state.velocity);
        self.trajectory_changed(state.entity);
        self.clock.set_paused(false);
    }

    /// Re-roll the generated terrain and redo every prediction against it.
    fn regenerate_terrain(&mut self) {
        let (entity, spec) = match self.terrain {
            Some(terrain) => terrain,
            None => return,
        };
        let boundary = self.boundary;
        let shape = generate_terrain(&mut self.rng, &boundary, &spec);
        self.release_contacts_of(entity);
        {
            let mut shapes = self.world.write_storage::<CollisionShape<S>>();
            if let Some(collision_shape) = shapes.get_mut(entity) {
                collision_shape.set_local(shape);
            }
        }
        self.invalidate_events(entity);
        self.repredict(entity, None);
        self.clock.set_paused(false);
    }
}
