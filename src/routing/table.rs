//! Per-method route tables.
//!
//! # Responsibilities
//! - Keep routes in registration order
//! - Resolve a path to the first route whose template matches
//! - Hold global fallback renderers per outcome
//! - Pick the renderer for an outcome and negotiated content type
//!
//! # Design Decisions
//! - Built once at startup, read-only afterwards (no locking on lookup)
//! - First match wins; binding order is precedence
//! - Renderer precedence: route exact → exact-only globals → route
//!   wildcard → global exact → first general global
//! - Exact-only globals (JSONP) behave as if bound on every route

use std::sync::Arc;

use axum::http::Method;

use crate::command::{HandlerFactory, Outcome};
use crate::render::{Accept, RenderError, RenderRule, Renderer};

use super::template::{PathTemplate, PathVariables, TemplateError};

/// A template bound to a handler factory and its renderers.
#[derive(Debug)]
pub struct Route {
    template: PathTemplate,
    factory: HandlerFactory,
    rules: Vec<(Outcome, RenderRule)>,
}

impl Route {
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn factory(&self) -> &HandlerFactory {
        &self.factory
    }

    fn rules_for(&self, outcome: Outcome) -> impl Iterator<Item = &RenderRule> + Clone {
        self.rules
            .iter()
            .filter(move |(o, _)| *o == outcome)
            .map(|(_, rule)| rule)
    }
}

/// Fluent renderer registration for a freshly bound route.
pub struct RouteBuilder<'a> {
    route: &'a mut Route,
}

impl RouteBuilder<'_> {
    /// Default renderer for `outcome`.
    pub fn on(self, outcome: Outcome, renderer: Arc<dyn Renderer>) -> Self {
        self.add(outcome, RenderRule::any(renderer))
    }

    /// Renderer for `outcome` when `content_type` is negotiated.
    pub fn on_type(self, outcome: Outcome, renderer: Arc<dyn Renderer>, content_type: &str) -> Self {
        self.add(outcome, RenderRule::for_type(content_type, renderer))
    }

    fn add(self, outcome: Outcome, rule: RenderRule) -> Self {
        // One renderer per (outcome, content type); the later binding wins.
        self.route
            .rules
            .retain(|(o, existing)| !(*o == outcome && existing.same_key(&rule)));
        self.route.rules.push((outcome, rule));
        self
    }
}

/// Routes for one HTTP method.
#[derive(Debug)]
pub struct RouteTable {
    method: Method,
    routes: Vec<Route>,
    globals: Vec<(Outcome, RenderRule)>,
}

impl RouteTable {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            routes: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Append a route. Later bindings lose to earlier ones on overlap.
    pub fn bind(
        &mut self,
        template: &str,
        factory: HandlerFactory,
    ) -> Result<RouteBuilder<'_>, TemplateError> {
        let template = PathTemplate::compile(template)?;
        tracing::trace!(method = %self.method, template = %template, handler = factory.name(), "Route bound");
        self.routes.push(Route {
            template,
            factory,
            rules: Vec::new(),
        });
        let index = self.routes.len() - 1;
        Ok(RouteBuilder {
            route: &mut self.routes[index],
        })
    }

    /// Fallback renderer consulted when a route has none for the outcome.
    pub fn add_global_handler(&mut self, outcome: Outcome, rule: RenderRule) {
        self.globals.push((outcome, rule));
    }

    /// First route whose template matches `path`.
    pub fn resolve(&self, path: &str) -> Option<(&Route, PathVariables)> {
        self.routes
            .iter()
            .find_map(|route| route.template.matches(path).map(|vars| (route, vars)))
    }

    fn globals_for(&self, outcome: Outcome) -> impl Iterator<Item = &RenderRule> + Clone {
        self.globals
            .iter()
            .filter(move |(o, _)| *o == outcome)
            .map(|(_, rule)| rule)
    }

    /// Pick the renderer for `outcome` on `route`.
    pub fn select_renderer(
        &self,
        route: &Route,
        outcome: Outcome,
        accept: &Accept,
    ) -> Result<Arc<dyn Renderer>, RenderError> {
        let local = route.rules_for(outcome);
        let global = self.globals_for(outcome);

        local
            .clone()
            .find(|rule| rule.matches_exactly(accept))
            .or_else(|| {
                global
                    .clone()
                    .find(|rule| rule.is_exact_only() && rule.matches_exactly(accept))
            })
            .or_else(|| local.clone().find(|rule| rule.is_wildcard()))
            .or_else(|| {
                global
                    .clone()
                    .find(|rule| !rule.is_exact_only() && rule.matches_exactly(accept))
            })
            .or_else(|| global.clone().find(|rule| !rule.is_exact_only()))
            .map(|rule| Arc::clone(rule.renderer()))
            .ok_or_else(|| RenderError::NoRenderer {
                outcome,
                path: route.template.to_string(),
            })
    }
}

/// The GET, POST and DELETE tables of one server.
#[derive(Debug)]
pub struct RouteTables {
    pub get: RouteTable,
    pub post: RouteTable,
    pub delete: RouteTable,
}

impl RouteTables {
    pub fn new() -> Self {
        Self {
            get: RouteTable::new(Method::GET),
            post: RouteTable::new(Method::POST),
            delete: RouteTable::new(Method::DELETE),
        }
    }

    /// Methods that have a table, in the order `Allow` lists them.
    pub fn methods() -> [Method; 3] {
        [Method::DELETE, Method::GET, Method::POST]
    }

    pub fn for_method(&self, method: &Method) -> Option<&RouteTable> {
        match *method {
            Method::GET => Some(&self.get),
            Method::POST => Some(&self.post),
            Method::DELETE => Some(&self.delete),
            _ => None,
        }
    }

    /// Register a global renderer on every table.
    pub fn add_global_handler(&mut self, outcome: Outcome, rule: RenderRule) {
        self.get.add_global_handler(outcome, rule.clone());
        self.post.add_global_handler(outcome, rule.clone());
        self.delete.add_global_handler(outcome, rule);
    }
}

impl Default for RouteTables {
    fn default() -> Self {
        Self::new()
    }
}
