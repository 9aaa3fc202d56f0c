//! Deployable wiring for pourbot: configuration, the fixed dispense policy,
//! the command-backed actuator, and the monitoring loop.

pub mod config;
pub mod dispenser;
pub mod prompt;
pub mod runtime;
