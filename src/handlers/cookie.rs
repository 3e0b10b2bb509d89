//! Cookie commands.

use async_trait::async_trait;
use serde_json::Value;

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation};
use crate::driver::Cookie;

#[derive(Debug)]
pub struct GetAllCookies;

#[async_trait]
impl Handler for GetAllCookies {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let cookies = cx.driver()?.cookies().await?;
        serde_json::to_value(cookies).map_err(|e| CommandError::Driver(e.to_string()))
    }
}

impl Command for GetAllCookies {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct AddCookie {
    cookie: Option<Cookie>,
}

#[async_trait]
impl Handler for AddCookie {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let cookie = self
            .cookie
            .take()
            .ok_or_else(|| CommandError::Driver("cookie already added".to_string()))?;
        cx.driver()?.add_cookie(cookie).await?;
        Ok(Value::Null)
    }
}

impl Command for AddCookie {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            cookie: Some(invocation.required("cookie")?),
        })
    }
}

/// Deletes every visible cookie.
#[derive(Debug)]
pub struct DeleteCookie;

#[async_trait]
impl Handler for DeleteCookie {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.delete_all_cookies().await?;
        Ok(Value::Null)
    }
}

impl Command for DeleteCookie {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[derive(Debug)]
pub struct DeleteNamedCookie {
    name: String,
}

#[async_trait]
impl Handler for DeleteNamedCookie {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.delete_cookie(&self.name).await?;
        Ok(Value::Null)
    }
}

impl Command for DeleteNamedCookie {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            name: invocation.variable("name")?,
        })
    }
}
