pub mod effects;
pub mod ai;
pub mod collision;
pub mod food;
pub mod respawn;
