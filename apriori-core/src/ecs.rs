//! ECS Component declarations for data structures in the crate, this needs
//! to be here and not in apriori-ecs because of the orphan rule.

use specs::prelude::{Component, DenseVecStorage};

use collide::CollisionShape;
use physics::{Mass, Material};
use trajectory::Trajectory;
use Position;

impl<S> Component for Position<S>
where
    S: Send + Sync + 'static,
{
    type Storage = DenseVecStorage<Self>;
}

impl<S> Component for Trajectory<S>
where
    S: Send + Sync + 'static,
{
    type Storage = DenseVecStorage<Self>;
}

impl<S> Component for CollisionShape<S>
where
    S: Send + Sync + 'static,
{
    type Storage = DenseVecStorage<Self>;
}

impl<S> Component for Mass<S>
where
    S: Send + Sync + 'static,
{
    type Storage = DenseVecStorage<Self>;
}

impl Component for Material {
    type Storage = DenseVecStorage<Self>;
}
