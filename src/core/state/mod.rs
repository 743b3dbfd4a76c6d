// src/core/state/mod.rs

//! Defines the central `HubState` struct and its statistics component.

mod core;
mod stats;

pub use core::HubState;
pub use stats::StatsState;
