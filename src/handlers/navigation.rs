//! Page navigation, scripts and timeouts.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation};

#[derive(Debug)]
pub struct ChangeUrl {
    url: String,
}

#[async_trait]
impl Handler for ChangeUrl {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.navigate(&self.url).await?;
        Ok(Value::Null)
    }
}

impl Command for ChangeUrl {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            url: invocation.required("url")?,
        })
    }
}

#[derive(Debug)]
pub struct GetCurrentUrl;

#[async_trait]
impl Handler for GetCurrentUrl {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        Ok(Value::String(cx.driver()?.current_url().await?))
    }
}

impl Command for GetCurrentUrl {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct GoBack;

#[async_trait]
impl Handler for GoBack {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.back().await?;
        Ok(Value::Null)
    }
}

impl Command for GoBack {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct GoForward;

#[async_trait]
impl Handler for GoForward {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.forward().await?;
        Ok(Value::Null)
    }
}

impl Command for GoForward {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct RefreshPage;

#[async_trait]
impl Handler for RefreshPage {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.refresh().await?;
        Ok(Value::Null)
    }
}

impl Command for RefreshPage {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct GetTitle;

#[async_trait]
impl Handler for GetTitle {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        Ok(Value::String(cx.driver()?.title().await?))
    }
}

impl Command for GetTitle {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct GetPageSource;

#[async_trait]
impl Handler for GetPageSource {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        Ok(Value::String(cx.driver()?.page_source().await?))
    }
}

impl Command for GetPageSource {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct ExecuteScript {
    script: String,
    args: Vec<Value>,
}

#[async_trait]
impl Handler for ExecuteScript {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.execute_script(&self.script, &self.args).await
    }
}

impl Command for ExecuteScript {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            script: invocation.required("script")?,
            args: invocation.optional("args")?.unwrap_or_default(),
        })
    }
}

/// Sets how long element lookups may wait.
#[derive(Debug)]
pub struct ImplicitlyWait {
    wait: Duration,
}

#[async_trait]
impl Handler for ImplicitlyWait {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.set_implicit_wait(self.wait).await?;
        Ok(Value::Null)
    }
}

impl Command for ImplicitlyWait {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        // Clients send either 500 or 500.0.
        let ms: f64 = invocation.required("ms")?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(CommandError::InvalidArgument(format!(
                "'ms' must be a non-negative number, got {ms}"
            )));
        }
        Ok(Self {
            wait: Duration::from_secs_f64(ms / 1000.0),
        })
    }
}
