#![forbid(unsafe_code)]

pub mod leveling;
pub mod model;
pub mod time;

pub use leveling::AdaptiveLevelPolicy;
pub use time::Clock;
