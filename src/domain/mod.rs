pub mod animation;
pub mod character;
pub mod enemy;
pub mod entity;
pub mod gauge;
pub mod physics;
pub mod projectile;
