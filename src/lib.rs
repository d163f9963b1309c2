//! Agent locomotion library
//!
//! Movement integration, jump and landing coordination, moving-platform carry
//! and damped look control for a tick-driven agent.

pub mod config;
pub mod game;
