pub mod constants;
pub mod state;
pub mod rng;
pub mod spatial;
pub mod systems;
pub mod resolver;
pub mod outcome;
pub mod input_buffer;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod performance;
