//! Command-backed drink dispenser.
//!
//! The actuator's own wire protocol lives outside this process; the boundary
//! here is a configured shell command. Exit status zero means the dispense
//! physically completed, anything else means it did not.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pourbot_core::actions::DrinkDispenser;
use tokio::process::Command;
use tracing::debug;

/// A [`DrinkDispenser`] that shells out to a configured command.
pub struct CommandDispenser {
    command: String,
}

impl CommandDispenser {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl DrinkDispenser for CommandDispenser {
    async fn dispense(&self) -> Result<bool> {
        debug!(command = %self.command, "running dispense command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .with_context(|| format!("Failed to run dispense command: {}", self.command))?;
        Ok(status.success())
    }
}
