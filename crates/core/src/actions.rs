//! Registered actions and the drink-dispense actuator seam.
//!
//! Actions are the physical capabilities the oracle may select. Each one
//! carries a name, a description, and a JSON schema for its arguments; the
//! registry turns those into tool declarations for the oracle. Registering a
//! new capability is one `register` call, the dispatcher never changes.

use anyhow::Result;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolArgs, FunctionObjectArgs};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// The sentinel an action returns when a physical dispense has completed.
///
/// Success is strict equality with this value; `"true"`, `1`, or any other
/// truthy shape does not count.
pub const SUCCESS_SENTINEL: Value = Value::Bool(true);

/// A named capability with a uniform async invoke contract.
///
/// Argument validation and coercion are the action's own responsibility; the
/// dispatcher passes the oracle's argument map through untouched.
#[async_trait]
pub trait Action: Send + Sync {
    /// The name the oracle selects this action by.
    fn name(&self) -> &str;
    /// Human-readable description advertised to the oracle.
    fn description(&self) -> &str;
    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;
    /// Performs the side effect and returns its result value.
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value>;
}

/// Maps action names to invocable capabilities.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action under its own name, replacing any previous entry.
    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions.insert(action.name().to_string(), action);
    }

    /// Looks up an action by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(name)
    }

    /// Builds the tool declarations the oracle receives with every call.
    pub fn declarations(&self) -> Result<Vec<ChatCompletionTool>> {
        self.actions
            .values()
            .map(|action| {
                Ok(ChatCompletionToolArgs::default()
                    .function(
                        FunctionObjectArgs::default()
                            .name(action.name())
                            .description(action.description())
                            .parameters(action.parameters())
                            .build()?,
                    )
                    .build()?)
            })
            .collect()
    }
}

/// The external drink-dispense actuator.
///
/// The physical protocol behind this trait is out of scope here; the actuator
/// reports only whether the dispense physically completed.
#[async_trait]
pub trait DrinkDispenser: Send + Sync {
    async fn dispense(&self) -> Result<bool>;
}

/// Adapts a [`DrinkDispenser`] into a registrable [`Action`].
pub struct DispenseDrinkAction {
    dispenser: Arc<dyn DrinkDispenser>,
}

impl DispenseDrinkAction {
    pub const NAME: &'static str = "dispense_drink";

    pub fn new(dispenser: Arc<dyn DrinkDispenser>) -> Self {
        Self { dispenser }
    }
}

#[async_trait]
impl Action for DispenseDrinkAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Dispense a drink from the physical dispenser. Use this whenever the \
         user expresses thirst or asks for a drink in any way."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(&self, _arguments: Map<String, Value>) -> Result<Value> {
        Ok(Value::Bool(self.dispenser.dispense().await?))
    }
}
