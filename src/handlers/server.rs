//! Commands that need no session.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::command::{Command, CommandContext, CommandError, Handler, Invocation, Scope};
use crate::render::{Attribute, Resource, RESPONSE};

/// Build and platform information.
#[derive(Debug)]
pub struct Status;

#[async_trait]
impl Handler for Status {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        Ok(json!({
            "ready": true,
            "build": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "os": {
                "name": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
            },
            "sessions": cx.registry().len(),
        }))
    }
}

impl Command for Status {
    const SCOPE: Scope = Scope::Server;

    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

/// Loads a file from the static directory into the response attribute.
#[derive(Debug)]
pub struct StaticResource {
    file: String,
}

#[async_trait]
impl Handler for StaticResource {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let path = cx.services().static_dir.join(&self.file);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "Static resource unavailable");
            CommandError::ResourceNotFound(self.file.clone())
        })?;
        cx.attributes.insert(
            RESPONSE,
            Attribute::Resource(Resource::new(self.file.clone(), bytes)),
        );
        Ok(Value::Null)
    }
}

impl Command for StaticResource {
    const SCOPE: Scope = Scope::Server;

    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        let file = invocation.variable("file")?;
        // A single path segment, and never a parent reference.
        let plain = Path::new(&file)
            .file_name()
            .is_some_and(|name| name == file.as_str());
        if !plain || file.contains('\\') {
            return Err(CommandError::ResourceNotFound(file));
        }
        Ok(Self { file })
    }
}

/// Every live session with its capabilities.
#[derive(Debug)]
pub struct GetAllSessions;

#[async_trait]
impl Handler for GetAllSessions {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let sessions = cx
            .registry()
            .snapshot()
            .into_iter()
            .map(|session| {
                json!({
                    "id": session.id(),
                    "capabilities": session.capabilities(),
                })
            })
            .collect();
        Ok(Value::Array(sessions))
    }
}

impl Command for GetAllSessions {
    const SCOPE: Scope = Scope::Server;

    fn from_invocation(_invocation: &Invocation<'_>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{HandlerFactory, Services};
    use crate::driver::InMemoryDriverFactory;
    use crate::render::Attributes;
    use crate::routing::PathVariables;
    use crate::session::SessionRegistry;
    use serde_json::Map;
    use std::sync::Arc;

    fn services(dir: &Path) -> Services {
        Services::new(SessionRegistry::new(Arc::new(InMemoryDriverFactory::new())), dir)
    }

    fn build(factory: HandlerFactory, file: &str) -> Result<Box<dyn Handler>, CommandError> {
        let mut vars = PathVariables::new();
        vars.insert("file", file);
        factory.build(&Invocation::new(&vars, &Map::new()))
    }

    #[test]
    fn test_static_resource_rejects_traversal() {
        let factory = HandlerFactory::of::<StaticResource>();
        assert!(build(factory.clone(), "hub.html").is_ok());
        for bad in ["..", ".", "a\\..\\b"] {
            assert!(matches!(
                build(factory.clone(), bad).err(),
                Some(CommandError::ResourceNotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_static_resource_publishes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hub.html"), "<h1>hub</h1>").unwrap();
        let services = services(dir.path());

        let mut vars = PathVariables::new();
        let mut attributes = Attributes::new();
        let mut cx = CommandContext::new(&services, &mut vars, &mut attributes);
        let mut handler = build(HandlerFactory::of::<StaticResource>(), "hub.html").unwrap();
        handler.execute(&mut cx).await.unwrap();

        match attributes.get(RESPONSE) {
            Some(Attribute::Resource(resource)) => assert_eq!(&resource.bytes[..], b"<h1>hub</h1>"),
            other => panic!("unexpected attribute {other:?}"),
        }

        let mut vars = PathVariables::new();
        let mut attributes = Attributes::new();
        let mut cx = CommandContext::new(&services, &mut vars, &mut attributes);
        let mut missing = build(HandlerFactory::of::<StaticResource>(), "nope.css").unwrap();
        assert_eq!(missing.execute(&mut cx).await.unwrap_err().status(), 13);
    }

    #[tokio::test]
    async fn test_status_reports_session_count() {
        let services = services(Path::new("static"));
        services.registry.create(Default::default()).await.unwrap();

        let mut vars = PathVariables::new();
        let mut attributes = Attributes::new();
        let mut cx = CommandContext::new(&services, &mut vars, &mut attributes);
        let value = Status.execute(&mut cx).await.unwrap();
        assert_eq!(value["sessions"], 1);
        assert_eq!(value["build"]["name"], "driver-hub");
    }
}
