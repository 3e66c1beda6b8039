//! Engine-agnostic plumbing for the tether gameplay crate: fixed-step time,
//! edge-triggered input, timed tasks, feedback cues and run clocks.

pub mod cues;
pub mod input;
pub mod run_timer;
pub mod schedule;
pub mod time;
