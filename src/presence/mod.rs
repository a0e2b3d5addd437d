//! Presence duration display.

pub mod duration;

pub use duration::{format_elapsed, ClockHandle, DurationClock};
