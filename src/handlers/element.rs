//! Element lookup and interaction.
//!
//! Elements are referenced on the wire as `{"ELEMENT": "<id>"}`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation};
use crate::driver::Locator;

fn element_ref(id: String) -> Value {
    json!({ "ELEMENT": id })
}

fn locator(invocation: &Invocation<'_>) -> Result<Locator, CommandError> {
    Ok(Locator::new(
        invocation.required::<String>("using")?,
        invocation.required::<String>("value")?,
    ))
}

#[derive(Debug)]
pub struct FindElement {
    locator: Locator,
}

#[async_trait]
impl Handler for FindElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.find_element(&self.locator).await.map(element_ref)
    }
}

impl Command for FindElement {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            locator: locator(invocation)?,
        })
    }
}

#[derive(Debug)]
pub struct FindElements {
    locator: Locator,
}

#[async_trait]
impl Handler for FindElements {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let ids = cx.driver()?.find_elements(&self.locator).await?;
        Ok(Value::Array(ids.into_iter().map(element_ref).collect()))
    }
}

impl Command for FindElements {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            locator: locator(invocation)?,
        })
    }
}

#[derive(Debug)]
pub struct FindActiveElement;

#[async_trait]
impl Handler for FindActiveElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.active_element().await.map(element_ref)
    }
}

impl Command for FindActiveElement {
    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

/// Confirms the element is still attached and echoes its reference.
#[derive(Debug)]
pub struct DescribeElement {
    element: String,
}

#[async_trait]
impl Handler for DescribeElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let tag = cx.driver()?.tag_name(&self.element).await?;
        Ok(json!({ "id": self.element, "tagName": tag }))
    }
}

impl Command for DescribeElement {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct ClickElement {
    element: String,
}

#[async_trait]
impl Handler for ClickElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.click(&self.element).await?;
        Ok(Value::Null)
    }
}

impl Command for ClickElement {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct ClearElement {
    element: String,
}

#[async_trait]
impl Handler for ClearElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.clear(&self.element).await?;
        Ok(Value::Null)
    }
}

impl Command for ClearElement {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct SubmitElement {
    element: String,
}

#[async_trait]
impl Handler for SubmitElement {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.submit(&self.element).await?;
        Ok(Value::Null)
    }
}

impl Command for SubmitElement {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct GetElementText {
    element: String,
}

#[async_trait]
impl Handler for GetElementText {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.element_text(&self.element).await.map(Value::String)
    }
}

impl Command for GetElementText {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct GetTagName {
    element: String,
}

#[async_trait]
impl Handler for GetTagName {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.tag_name(&self.element).await.map(Value::String)
    }
}

impl Command for GetTagName {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

/// Types a sequence of key strings into the element.
#[derive(Debug)]
pub struct SendKeys {
    element: String,
    keys: String,
}

#[async_trait]
impl Handler for SendKeys {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        cx.driver()?.send_keys(&self.element, &self.keys).await?;
        Ok(Value::Null)
    }
}

impl Command for SendKeys {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        let keys: Vec<String> = invocation.required("value")?;
        Ok(Self {
            element: invocation.variable("id")?,
            keys: keys.concat(),
        })
    }
}

#[derive(Debug)]
pub struct GetElementValue {
    element: String,
}

#[async_trait]
impl Handler for GetElementValue {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let value = cx.driver()?.attribute(&self.element, "value").await?;
        Ok(value.map(Value::String).unwrap_or(Value::Null))
    }
}

impl Command for GetElementValue {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
        })
    }
}

#[derive(Debug)]
pub struct GetElementAttribute {
    element: String,
    name: String,
}

#[async_trait]
impl Handler for GetElementAttribute {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let value = cx.driver()?.attribute(&self.element, &self.name).await?;
        Ok(value.map(Value::String).unwrap_or(Value::Null))
    }
}

impl Command for GetElementAttribute {
    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self {
            element: invocation.variable("id")?,
            name: invocation.variable("name")?,
        })
    }
}
