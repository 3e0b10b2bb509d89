//! Handler trait, factories and the execution context.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::driver::Driver;
use crate::render::Attributes;
use crate::routing::PathVariables;
use crate::session::{Session, SessionRegistry};

use super::CommandError;

/// What a handler needs bound before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No session involved (status, new session, static files).
    Server,
    /// Session resolved from `:sessionId`, driver not locked.
    Session,
    /// Session resolved and its driver locked for the whole execution.
    Driver,
}

/// Server-wide collaborators shared by every command.
#[derive(Debug, Clone)]
pub struct Services {
    pub registry: SessionRegistry,
    pub static_dir: PathBuf,
}

impl Services {
    pub fn new(registry: SessionRegistry, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            static_dir: static_dir.into(),
        }
    }
}

/// Inputs a handler is constructed from.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    variables: &'a PathVariables,
    params: &'a Map<String, Value>,
}

impl<'a> Invocation<'a> {
    pub fn new(variables: &'a PathVariables, params: &'a Map<String, Value>) -> Self {
        Self { variables, params }
    }

    pub fn params(&self) -> &'a Map<String, Value> {
        self.params
    }

    /// A captured path variable.
    pub fn variable(&self, name: &str) -> Result<String, CommandError> {
        self.variables
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| CommandError::InvalidArgument(format!("missing path variable '{name}'")))
    }

    pub fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T, CommandError> {
        self.optional(name)?
            .ok_or_else(|| CommandError::InvalidArgument(format!("missing parameter '{name}'")))
    }

    /// A parameter that may be absent or `null`.
    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CommandError> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CommandError::InvalidArgument(format!("parameter '{name}': {e}"))),
        }
    }
}

/// Everything a running handler can reach.
pub struct CommandContext<'a> {
    services: &'a Services,
    session: Option<&'a Arc<Session>>,
    driver: Option<&'a mut dyn Driver>,
    pub variables: &'a mut PathVariables,
    pub attributes: &'a mut Attributes,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        services: &'a Services,
        variables: &'a mut PathVariables,
        attributes: &'a mut Attributes,
    ) -> Self {
        Self {
            services,
            session: None,
            driver: None,
            variables,
            attributes,
        }
    }

    pub fn with_session(mut self, session: &'a Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_driver(mut self, driver: &'a mut dyn Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn services(&self) -> &'a Services {
        self.services
    }

    pub fn registry(&self) -> &'a SessionRegistry {
        &self.services.registry
    }

    pub fn session(&self) -> Result<&'a Arc<Session>, CommandError> {
        self.session
            .ok_or_else(|| CommandError::NoSuchSession("<none>".to_string()))
    }

    /// The locked driver. Only bound for [`Scope::Driver`] handlers.
    pub fn driver(&mut self) -> Result<&mut (dyn Driver + 'a), CommandError> {
        match self.driver.as_mut() {
            Some(driver) => Ok(&mut **driver),
            None => Err(CommandError::Driver(
                "handler requires a driver but none is bound".to_string(),
            )),
        }
    }
}

/// One executable command. Runs exactly once per invocation.
#[async_trait]
pub trait Handler: Send {
    /// Execute and return the `value` of the response envelope.
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError>;
}

/// A handler type with a canonical constructor.
pub trait Command: Handler + Sized + 'static {
    const SCOPE: Scope = Scope::Driver;

    fn from_invocation(invocation: &Invocation<'_>) -> Result<Self, CommandError>;
}

type BuildFn = dyn Fn(&Invocation<'_>) -> Result<Box<dyn Handler>, CommandError> + Send + Sync;

/// Builds a fresh handler per request. Stored in the route.
#[derive(Clone)]
pub struct HandlerFactory {
    name: &'static str,
    scope: Scope,
    build: Arc<BuildFn>,
}

impl HandlerFactory {
    pub fn new<F>(name: &'static str, scope: Scope, build: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Box<dyn Handler>, CommandError> + Send + Sync + 'static,
    {
        Self {
            name,
            scope,
            build: Arc::new(build),
        }
    }

    /// Factory for a [`Command`] type.
    pub fn of<C: Command>() -> Self {
        let full = std::any::type_name::<C>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self::new(name, C::SCOPE, |invocation| {
            Ok(Box::new(C::from_invocation(invocation)?) as Box<dyn Handler>)
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn build(&self, invocation: &Invocation<'_>) -> Result<Box<dyn Handler>, CommandError> {
        (self.build)(invocation)
    }
}

impl fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}
