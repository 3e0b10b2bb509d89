//! Session lifecycle commands.

use async_trait::async_trait;
use serde_json::Value;

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation, Scope};
use crate::driver::Capabilities;

/// Launches a driver and publishes the new id as `sessionId`, which the
/// redirect renderer substitutes into its target.
#[derive(Debug)]
pub struct NewSession {
    capabilities: Capabilities,
}

#[async_trait]
impl Handler for NewSession {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let capabilities = std::mem::take(&mut self.capabilities);
        let session = cx.registry().create(capabilities).await?;
        cx.variables.insert("sessionId", session.id());
        Ok(Value::Object(session.capabilities().clone()))
    }
}

impl Command for NewSession {
    const SCOPE: Scope = Scope::Server;

    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            capabilities: invocation.optional("desiredCapabilities")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug)]
pub struct GetSessionCapabilities;

#[async_trait]
impl Handler for GetSessionCapabilities {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        Ok(Value::Object(cx.session()?.capabilities().clone()))
    }
}

impl Command for GetSessionCapabilities {
    const SCOPE: Scope = Scope::Session;

    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

/// Session-scoped so the driver is not locked here; release waits for
/// any command still running against the session.
#[derive(Debug)]
pub struct DeleteSession;

#[async_trait]
impl Handler for DeleteSession {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let id = cx.session()?.id().to_string();
        cx.registry().delete(&id).await;
        Ok(Value::Null)
    }
}

impl Command for DeleteSession {
    const SCOPE: Scope = Scope::Session;

    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}
