//! Window handles, switching and sizing.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation};
use crate::driver::WindowSize;

#[derive(Debug)]
pub struct GetCurrentWindowHandle;

#[async_trait]
impl Handler for GetCurrentWindowHandle {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.window_handle().await.map(Value::String)
    }
}

impl Command for GetCurrentWindowHandle {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct GetAllWindowHandles;

#[async_trait]
impl Handler for GetAllWindowHandles {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let handles = cx.driver()?.window_handles().await?;
        Ok(Value::Array(handles.into_iter().map(Value::String).collect()))
    }
}

impl Command for GetAllWindowHandles {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct SwitchToWindow {
    name: String,
}

#[async_trait]
impl Handler for SwitchToWindow {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.switch_to_window(&self.name).await?;
        Ok(Value::Null)
    }
}

impl Command for SwitchToWindow {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            name: invocation.required("name")?,
        })
    }
}

#[derive(Debug)]
pub struct CloseWindow;

#[async_trait]
impl Handler for CloseWindow {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.close_window().await?;
        Ok(Value::Null)
    }
}

impl Command for CloseWindow {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

/// `:windowHandle` may be `current`.
#[derive(Debug)]
pub struct GetWindowSize {
    handle: String,
}

#[async_trait]
impl Handler for GetWindowSize {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let size = cx.driver()?.window_size(&self.handle).await?;
        Ok(json!({ "width": size.width, "height": size.height }))
    }
}

impl Command for GetWindowSize {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            handle: invocation.variable("windowHandle")?,
        })
    }
}

#[derive(Debug)]
pub struct SetWindowSize {
    handle: String,
    size: WindowSize,
}

#[async_trait]
impl Handler for SetWindowSize {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.set_window_size(&self.handle, self.size).await?;
        Ok(Value::Null)
    }
}

impl Command for SetWindowSize {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            handle: invocation.variable("windowHandle")?,
            size: WindowSize {
                width: invocation.required("width")?,
                height: invocation.required("height")?,
            },
        })
    }
}
