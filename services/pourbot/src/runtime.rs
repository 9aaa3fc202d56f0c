//! The monitoring loop: poll, dispatch, terminate on the first dispense.
//!
//! Runs as a single logical task. Each cycle polls the transcript, dispatches
//! a new utterance if one appeared, and sleeps for the configured interval.
//! The only terminal transition is a successful dispense; everything else
//! keeps the loop running. Termination is an explicit signal returned from
//! [`Monitor::step`], never a process-wide exit from inside the loop.

use anyhow::{Context, Result};
use pourbot_core::dispatcher::{Dispatcher, Outcome};
use pourbot_core::watcher::TranscriptWatcher;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// The result of one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Keep polling.
    Continue,
    /// A dispense succeeded; the loop is done.
    Dispensed,
}

/// Owns the watcher and dispatcher and drives dispatch cycles until the first
/// successful dispense.
pub struct Monitor {
    watcher: TranscriptWatcher,
    dispatcher: Dispatcher,
    poll_interval: Duration,
    flag_path: PathBuf,
}

impl Monitor {
    pub fn new(
        watcher: TranscriptWatcher,
        dispatcher: Dispatcher,
        poll_interval: Duration,
        flag_path: PathBuf,
    ) -> Self {
        Self {
            watcher,
            dispatcher,
            poll_interval,
            flag_path,
        }
    }

    /// Runs one dispatch cycle without sleeping.
    ///
    /// A transcript I/O fault (anything other than the file being absent)
    /// propagates as an error; the caller should treat it as fatal.
    pub async fn step(&mut self) -> Result<CycleOutcome> {
        let Some(utterance) = self
            .watcher
            .poll()
            .context("Transcript polling failed with an unrecoverable I/O error")?
        else {
            return Ok(CycleOutcome::Continue);
        };

        match self.dispatcher.dispatch(&utterance).await {
            Outcome::ActionSucceeded(_) => {
                info!("Successful dispense detected. Stopping to prevent repeated triggers.");
                self.write_flag();
                Ok(CycleOutcome::Dispensed)
            }
            Outcome::ActionFailed | Outcome::NoAction => Ok(CycleOutcome::Continue),
        }
    }

    /// Polls until the first successful dispense, sleeping `poll_interval`
    /// between cycles. Returns `Ok(())` exactly once, after that dispense.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            transcript = %self.watcher.path().display(),
            interval = ?self.poll_interval,
            "Watching transcript for new utterances"
        );
        loop {
            if self.step().await? == CycleOutcome::Dispensed {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Marks the completed dispense for other processes. A write failure must
    /// not mask the dispense itself, so it is logged and swallowed.
    fn write_flag(&self) {
        match std::fs::write(&self.flag_path, "done") {
            Ok(()) => info!(flag = %self.flag_path.display(), "Dispense flag written"),
            Err(e) => warn!(
                flag = %self.flag_path.display(),
                error = %e,
                "Failed to write dispense flag"
            ),
        }
    }
}
