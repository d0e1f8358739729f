//! Serpent Arena simulation library
//!
//! A deterministic, fixed-timestep snake arena: one player and up to four AI
//! agents on a bounded grid. `game::resolver::advance` is the pure tick
//! function; everything else either feeds it or reads its snapshots.

pub mod config;
pub mod util;
pub mod game;
