extern crate apriori_core;
extern crate apriori_ecs;
extern crate cgmath;
extern crate collision;
extern crate specs;
#[macro_use]
extern crate approx;

use apriori_core::{Material, Shape, WorldParameters};
use apriori_ecs::{
    Bindings, BodyDef, BodyKind, Flow, KeyCode, Keyboard, Level, RestingSet, Simulation,
};
use cgmath::{Point2, Vector2};
use collision::Aabb2;
use specs::prelude::WorldExt;

fn boundary() -> Aabb2<f64> {
    Aabb2::new(Point2::new(-20., -20.), Point2::new(20., 20.))
}

fn floor() -> BodyDef<f64> {
    BodyDef::new(
        BodyKind::Ground,
        Point2::new(0., 0.),
        Shape::polyline(vec![Point2::new(-10., 0.), Point2::new(10., 0.)]),
    )
}

fn particle(position: Point2<f64>) -> BodyDef<f64> {
    BodyDef::new(
        BodyKind::Player,
        position,
        Shape::polyline(vec![Point2::new(0., 0.)]),
    )
}

fn simulation(gravity: Vector2<f64>, level: &Level<f64>) -> Simulation<f64> {
    let mut sim = Simulation::new(WorldParameters::new(gravity), Bindings::default());
    sim.load_level(level);
    sim
}

#[test]
fn ballistic_impact_on_floor() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)).with_material(Material::new(0.5)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    let mut reader = sim.impact_reader();
    let keys = Keyboard::new();

    assert_eq!(sim.tick(0, &keys), Flow::Running);
    assert_eq!(sim.queue().live_game(), 1);

    sim.tick(500, &keys);
    assert_ulps_eq!(sim.effective_position(ball).unwrap(), Point2::new(0., 3.75));
    assert!(sim.read_impacts(&mut reader).is_empty());

    sim.tick(1000, &keys);
    assert_ulps_eq!(sim.clock().game_time(), 1.0);
    assert_ulps_eq!(sim.effective_position(ball).unwrap(), Point2::new(0., 0.));
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 5.));

    let impacts = sim.read_impacts(&mut reader);
    assert_eq!(impacts.len(), 1);
    assert_ulps_eq!(impacts[0].time, 1.0);
    assert!(impacts[0].bodies.0 == ball || impacts[0].bodies.1 == ball);
}

#[test]
fn level_flight_into_wall() {
    let wall = BodyDef::new(
        BodyKind::Ground,
        Point2::new(0., 0.),
        Shape::polyline(vec![Point2::new(0., 0.), Point2::new(0., 10.)]),
    );
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(-5., 5.)).with_velocity(Vector2::new(2., 0.)))
        .with_fixture(wall);
    let mut sim = simulation(Vector2::new(0., 0.), &level);
    let ball = sim.player().unwrap();
    let keys = Keyboard::new();

    sim.tick(2500, &keys);
    assert_ulps_eq!(sim.clock().game_time(), 2.5);
    assert_ulps_eq!(sim.effective_position(ball).unwrap(), Point2::new(0., 5.));
    // reflected off the wall, full restitution
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(-2., 0.));
}

#[test]
fn near_floor_contact_comes_to_rest() {
    let level = Level::new(boundary())
        .with_player(
            particle(Point2::new(0., 0.001))
                .with_velocity(Vector2::new(0., -0.0001))
                .with_material(Material::new(0.5)),
        )
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    let keys = Keyboard::new();

    sim.tick(100, &keys);
    // the bounce interval falls far below the threshold: no reflection,
    // normal velocity and acceleration cancelled instead
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 0.));
    assert_ulps_eq!(sim.acceleration_of(ball).unwrap(), Vector2::new(0., 0.));
    assert_relative_eq!(
        sim.effective_position(ball).unwrap().y,
        0.,
        epsilon = 1e-6
    );
    {
        let rests = sim.world().read_storage::<RestingSet>();
        assert_eq!(rests.get(ball).unwrap().0.len(), 1);
    }
    // no tangential motion: the contact never breaks, so nothing is queued
    assert_eq!(sim.queue().live_game(), 0);

    // and it stays put
    sim.tick(2100, &keys);
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 0.));
}

#[test]
fn sliding_rest_releases_at_segment_end() {
    let level = Level::new(boundary())
        .with_player(
            particle(Point2::new(9.9, 0.001))
                .with_velocity(Vector2::new(1., -0.0001))
                .with_material(Material::new(0.5)),
        )
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    let keys = Keyboard::new();

    sim.tick(50, &keys);
    // resting, sliding toward the floor's right end with a release queued
    {
        let rests = sim.world().read_storage::<RestingSet>();
        assert_eq!(rests.get(ball).unwrap().0.len(), 1);
    }
    assert_eq!(sim.queue().live_game(), 1);
    assert_ulps_eq!(sim.acceleration_of(ball).unwrap(), Vector2::new(0., 0.));

    sim.tick(1000, &keys);
    // slid off the edge around t ≈ 0.1: contact gone, gravity restored,
    // ballistic past the end of the floor
    {
        let rests = sim.world().read_storage::<RestingSet>();
        assert!(rests.get(ball).unwrap().0.is_empty());
    }
    assert_ulps_eq!(sim.acceleration_of(ball).unwrap(), Vector2::new(0., -10.));
    let position = sim.effective_position(ball).unwrap();
    assert!(position.x > 10.);
    assert!(position.y < 0.);
}

#[test]
fn thrust_invalidates_pending_impact() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)))
        .with_fixture(floor());
    let mut sim = Simulation::new(
        WorldParameters::new(Vector2::new(0., -10.)).with_thrust(Vector2::new(0., 20.), 10.),
        Bindings::default(),
    );
    sim.load_level(&level);
    let ball = sim.player().unwrap();

    let mut keys = Keyboard::new();
    sim.tick(0, &keys);
    assert_eq!(sim.queue().live_game(), 1);

    // at t = 0.5 the jetpack starts thrusting the ball upward
    keys.press(KeyCode::W);
    sim.tick(500, &keys);
    assert_ulps_eq!(sim.acceleration_of(ball).unwrap(), Vector2::new(0., 10.));
    // the old prediction is tombstoned, and the new trajectory never lands
    assert_eq!(sim.queue().live_game(), 0);

    sim.tick(2000, &keys);
    assert_ulps_eq!(sim.clock().game_time(), 2.0);
    assert!(sim.effective_position(ball).unwrap().y > 5.);
}

#[test]
fn pause_preserves_the_future() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)).with_material(Material::new(0.5)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();

    let mut keys = Keyboard::new();
    sim.tick(0, &keys);

    keys.press(KeyCode::P);
    sim.tick(300, &keys);
    assert!(sim.clock().is_paused());

    keys.release(KeyCode::P);
    sim.tick(800, &keys);
    // a real second slips by; game time stands still
    assert_ulps_eq!(sim.clock().game_time(), 0.3);
    assert_ulps_eq!(sim.clock().real_time(), 0.8);

    keys.press(KeyCode::P);
    sim.tick(1300, &keys);
    assert!(!sim.clock().is_paused());
    assert_ulps_eq!(sim.clock().game_time(), 0.3);

    keys.release(KeyCode::P);
    sim.tick(2000, &keys);
    // the impact still fires at game time 1.0, now at real time 2.0
    assert_relative_eq!(sim.clock().game_time(), 1.0, epsilon = 1e-9);
    let velocity = sim.effective_velocity(ball).unwrap();
    assert_relative_eq!(velocity.y, 5.0, epsilon = 1e-6);
}

#[test]
fn double_speed_halves_real_time() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)).with_material(Material::new(0.5)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    sim.set_speed(2.0).unwrap();
    let keys = Keyboard::new();

    sim.tick(0, &keys);
    sim.tick(500, &keys);
    assert_ulps_eq!(sim.clock().real_time(), 0.5);
    assert_ulps_eq!(sim.clock().game_time(), 1.0);
    // same impact as at normal speed
    assert_ulps_eq!(sim.effective_position(ball).unwrap(), Point2::new(0., 0.));
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 5.));
}

#[test]
fn quit_binding_unwinds_the_loop() {
    let level = Level::new(boundary()).with_player(particle(Point2::new(0., 5.)));
    let mut sim = simulation(Vector2::new(0., -10.), &level);

    let mut keys = Keyboard::new();
    sim.tick(0, &keys);
    keys.press(KeyCode::Escape);
    assert_eq!(sim.tick(16, &keys), Flow::Quit);
}

#[test]
fn reset_restores_the_player() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)).with_material(Material::new(0.5)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();

    let mut keys = Keyboard::new();
    sim.tick(0, &keys);
    sim.tick(700, &keys);
    let fallen = sim.effective_position(ball).unwrap();
    assert!(fallen.y < 5.);

    keys.press(KeyCode::Space);
    sim.tick(750, &keys);
    assert_ulps_eq!(sim.effective_position(ball).unwrap(), Point2::new(0., 5.));
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 0.));
    // the reset trajectory gets its own impact prediction
    assert_eq!(sim.queue().live_game(), 1);
}

#[test]
fn direct_trajectory_writes_redo_predictions() {
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    let keys = Keyboard::new();
    sim.tick(0, &keys);

    // flying off sideways: the drop's impact is stale, a new one replaces it
    sim.set_velocity(ball, Vector2::new(20., 0.));
    sim.tick(100, &keys);
    assert_eq!(sim.queue().live_game(), 0);

    // teleport back over the floor and drop again
    sim.set_position(ball, Point2::new(0., 5.));
    sim.set_velocity(ball, Vector2::new(0., 0.));
    sim.tick(200, &keys);
    assert_eq!(sim.queue().live_game(), 1);
    // falling straight down again since the rewrite at t = 0.1
    let position = sim.effective_position(ball).unwrap();
    assert_ulps_eq!(position.x, 0.);
    assert_relative_eq!(position.y, 4.95, epsilon = 1e-9);
}

#[test]
fn bounces_lose_energy_until_rest() {
    // drop with restitution 0.5 and let the chatter controller catch it:
    // impacts at t = 1, 2, 2.5, 2.75, ... must eventually come to rest on
    // the floor instead of bouncing forever
    let level = Level::new(boundary())
        .with_player(particle(Point2::new(0., 5.)).with_material(Material::new(0.5)))
        .with_fixture(floor());
    let mut sim = simulation(Vector2::new(0., -10.), &level);
    let ball = sim.player().unwrap();
    let keys = Keyboard::new();

    for frame in 0..40u64 {
        sim.tick(frame * 100, &keys);
    }
    let resting = {
        let rests = sim.world().read_storage::<RestingSet>();
        rests.get(ball).unwrap().0.len()
    };
    assert_eq!(resting, 1);
    assert_relative_eq!(sim.effective_position(ball).unwrap().y, 0., epsilon = 1e-6);
    assert_ulps_eq!(sim.effective_velocity(ball).unwrap(), Vector2::new(0., 0.));
}
