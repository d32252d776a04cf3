#![forbid(unsafe_code)]

pub mod choices;
pub mod model;
pub mod time;

pub use time::Clock;
