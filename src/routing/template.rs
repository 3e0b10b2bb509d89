//! Path templates with named variables.
//!
//! # Responsibilities
//! - Compile route strings such as `/session/:sessionId/element/:id`
//! - Match concrete request paths segment by segment
//! - Extract variable bindings on a full match
//! - Expand a template back into a path (redirect targets)
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - A variable matches exactly one non-empty segment
//! - Segment counts must agree; no prefix matching
//! - No regex in the hot path

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Errors raised while compiling or expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Templates are absolute paths.
    #[error("template {0:?} must start with '/'")]
    NotAbsolute(String),

    /// A `:` segment without a name.
    #[error("template {0:?} contains an unnamed variable")]
    UnnamedVariable(String),

    /// The same variable appears twice.
    #[error("template {template:?} binds variable {name:?} more than once")]
    DuplicateVariable { template: String, name: String },

    /// Expansion found no value for a variable.
    #[error("no value for variable {name:?} in template {template:?}")]
    Unbound { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A compiled path template. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

/// Variables captured from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables {
    values: HashMap<String, String>,
}

impl PathVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Bind a variable, replacing any previous value.
    ///
    /// Handlers use this to publish values (e.g. a freshly created
    /// session id) for redirect targets.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split an absolute path into its segments. `/` has none.
pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl PathTemplate {
    /// Compile a template string.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        if !template.starts_with('/') {
            return Err(TemplateError::NotAbsolute(template.to_string()));
        }

        let mut segments = Vec::new();
        for raw in split_segments(template) {
            match raw.strip_prefix(':') {
                Some("") => return Err(TemplateError::UnnamedVariable(template.to_string())),
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Variable(existing) if existing == name));
                    if duplicate {
                        return Err(TemplateError::DuplicateVariable {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Variable(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables().any(|v| v == name)
    }

    /// Match a request path, returning the captured variables on a full match.
    pub fn matches(&self, path: &str) -> Option<PathVariables> {
        let parts = split_segments(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut variables = PathVariables::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Variable(_) if part.is_empty() => return None,
                Segment::Variable(name) => variables.insert(name.clone(), part),
            }
        }
        Some(variables)
    }

    /// Substitute variables back into the template.
    pub fn expand(&self, variables: &PathVariables) -> Result<String, TemplateError> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::with_capacity(self.source.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Variable(name) => {
                    let value = variables.get(name).ok_or_else(|| TemplateError::Unbound {
                        template: self.source.clone(),
                        name: name.clone(),
                    })?;
                    path.push_str(value);
                }
            }
        }
        Ok(path)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
