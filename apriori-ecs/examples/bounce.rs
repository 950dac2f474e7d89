extern crate apriori_core;
extern crate apriori_ecs;
extern crate cgmath;
extern crate collision;

use std::f64::consts::PI;

use cgmath::prelude::*;
use cgmath::{Point2, Vector2};
use collision::Aabb2;

use apriori_core::{Material, Shape, WorldParameters};
use apriori_ecs::{
    Bindings, BodyDef, BodyKind, Flow, Keyboard, Level, Simulation, TerrainSpec,
};

fn hexagon(radius: f64) -> Shape<f64> {
    let center = Vector2::new(radius, radius);
    let points = (0..6)
        .map(|i| {
            let angle = f64::from(i) / 6. * 2. * PI;
            Point2::from_vec(center + Vector2::new(radius * angle.sin(), radius * angle.cos()))
        })
        .collect();
    Shape::polygon(points)
}

pub fn main() {
    let params = WorldParameters::new(Vector2::new(0., -200.));
    let mut sim = Simulation::new(params, Bindings::default());

    let boundary = Aabb2::new(Point2::new(0., 0.), Point2::new(640., 480.));
    let level = Level::new(boundary)
        .with_player(
            BodyDef::new(BodyKind::Player, Point2::new(30., 350.), hexagon(50.))
                .with_material(Material::BOUNCY_BALL),
        )
        .with_terrain(TerrainSpec {
            interval: 64.,
            min_height: 1.,
            max_height: 128.,
        });
    sim.load_level(&level);
    let mut impacts = sim.impact_reader();

    // drive two simulated seconds at 60 fps with nobody at the keyboard
    let keys = Keyboard::new();
    for frame in 0..120u64 {
        if let Flow::Quit = sim.tick(frame * 16, &keys) {
            break;
        }
        for impact in sim.read_impacts(&mut impacts) {
            println!(
                "impact at t={:.3}: {:?} point {} against {:?} segment {}",
                impact.time, impact.bodies.0, impact.point, impact.bodies.1, impact.segment
            );
        }
    }

    for state in sim.render_states() {
        println!(
            "{:?} ends at ({:.1}, {:.1})",
            state.entity, state.position.x, state.position.y
        );
    }
}
