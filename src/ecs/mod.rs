//! Entity roster

pub mod world;

pub use world::World;
