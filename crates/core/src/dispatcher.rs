//! Stateless dispatch of one utterance through the oracle to an action.
//!
//! The dispatcher owns the single decision cycle: one oracle call with the
//! fixed system prompt and the registry's tool declarations, then at most one
//! action invocation. Almost every failure mode is absorbed locally. Only
//! the exact success sentinel from an action is allowed to stop the loop
//! upstream, and the dispatcher reports that through [`Outcome`].

use crate::actions::{ActionRegistry, SUCCESS_SENTINEL};
use crate::oracle::{ActionRequest, Oracle, OracleReply};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The result of dispatching one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The oracle selected no action (or its response was unusable).
    NoAction,
    /// An action ran but did not produce the success sentinel, or errored.
    ActionFailed,
    /// An action returned exactly the success sentinel.
    ActionSucceeded(Value),
}

/// Submits utterances to the oracle and performs the chosen action.
pub struct Dispatcher {
    oracle: Arc<dyn Oracle>,
    registry: ActionRegistry,
    system_prompt: String,
}

impl Dispatcher {
    pub fn new(oracle: Arc<dyn Oracle>, registry: ActionRegistry, system_prompt: String) -> Self {
        Self {
            oracle,
            registry,
            system_prompt,
        }
    }

    /// Runs one dispatch cycle for an utterance.
    ///
    /// Oracle transport failures, malformed responses, and unknown action
    /// names are logged and collapsed into [`Outcome::NoAction`]; an actuator
    /// error becomes [`Outcome::ActionFailed`]. Neither crashes the loop.
    pub async fn dispatch(&self, utterance: &str) -> Outcome {
        info!(utterance = %utterance, "dispatching utterance");

        let tools = match self.registry.declarations() {
            Ok(tools) => tools,
            Err(e) => {
                error!(error = ?e, "failed to build tool declarations");
                return Outcome::NoAction;
            }
        };

        let reply = match self
            .oracle
            .decide(&self.system_prompt, utterance, tools)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = ?e, "oracle call failed; continuing to next cycle");
                return Outcome::NoAction;
            }
        };

        match reply {
            OracleReply::Empty => {
                info!("oracle selected no action");
                Outcome::NoAction
            }
            OracleReply::Text(text) => {
                info!(text = %text, "oracle replied with text only");
                Outcome::NoAction
            }
            OracleReply::Action(request) => self.invoke(request).await,
        }
    }

    async fn invoke(&self, request: ActionRequest) -> Outcome {
        let Some(action) = self.registry.get(&request.name) else {
            // Guards against oracle/registry drift.
            error!(action = %request.name, "oracle selected an unknown action");
            return Outcome::NoAction;
        };

        info!(action = %request.name, arguments = ?request.arguments, "invoking action");
        match action.invoke(request.arguments).await {
            Ok(value) if value == SUCCESS_SENTINEL => {
                info!(action = %request.name, "action reported success");
                Outcome::ActionSucceeded(value)
            }
            Ok(value) => {
                info!(action = %request.name, result = ?value, "action completed without the success sentinel");
                Outcome::ActionFailed
            }
            Err(e) => {
                warn!(action = %request.name, error = ?e, "action invocation failed");
                Outcome::ActionFailed
            }
        }
    }
}
