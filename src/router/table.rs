//! Route table: compiled path templates bucketed by HTTP method.
//!
//! Templates use `{name}` placeholders. Each placeholder becomes a named capture
//! group matching one or more non-`/` characters; literal text is matched exactly.
//! Lookup scans a method's bucket in registration order and the first match wins,
//! so more specific templates must be registered before overlapping generic ones.

use std::collections::{HashMap, HashSet};

use axum::http::Method;
use regex::Regex;

use super::params::Param;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("unsupported HTTP method {0} for route {1}")]
    UnsupportedMethod(Method, String),
    #[error("route template {0:?} must start with '/'")]
    NotAbsolute(String),
    #[error("route template {0:?} has unbalanced braces")]
    UnbalancedBraces(String),
    #[error("route template {template:?} has an invalid parameter name {name:?}")]
    InvalidParam { template: String, name: String },
    #[error("route template {template:?} declares parameter {name:?} twice")]
    DuplicateParam { template: String, name: String },
    #[error("route template {template:?} failed to compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// Methods a route may be registered under.
pub const SUPPORTED_METHODS: [Method; 5] = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH];

/// A template compiled into an anchored regex. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl CompiledPattern {
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        if !template.starts_with('/') {
            return Err(RouteError::NotAbsolute(template.to_string()));
        }

        let mut source = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let mut rest = template;

        while let Some(open) = rest.find(&['{', '}'][..]) {
            if rest.as_bytes()[open] == b'}' {
                return Err(RouteError::UnbalancedBraces(template.to_string()));
            }
            source.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| RouteError::UnbalancedBraces(template.to_string()))?;
            let name = &after[..close];
            if name.contains('{') {
                return Err(RouteError::UnbalancedBraces(template.to_string()));
            }
            if !is_identifier(name) {
                return Err(RouteError::InvalidParam { template: template.to_string(), name: name.to_string() });
            }
            if !seen.insert(name.to_string()) {
                return Err(RouteError::DuplicateParam { template: template.to_string(), name: name.to_string() });
            }
            source.push_str(&format!("(?P<{}>[^/]+)", name));
            params.push(name.to_string());
            rest = &after[close + 1..];
        }
        source.push_str(&regex::escape(rest));
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|source| RouteError::Regex { template: template.to_string(), source })?;

        Ok(Self { template: template.to_string(), regex, params })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub fn is_static(&self) -> bool {
        self.params.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Captured parameters in template order, or `None` if the path does not match.
    pub fn captures(&self, path: &str) -> Option<Vec<Param>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .map(|name| Param::new(name.as_str(), caps.name(name).map(|m| m.as_str()).unwrap_or_default()))
                .collect(),
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One registration: method, template and whatever the dispatcher invokes.
#[derive(Debug, Clone)]
pub struct RouteDef<H> {
    pub method: Method,
    pub template: &'static str,
    pub handler: H,
}

#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    pub pattern: CompiledPattern,
    pub handler: H,
}

/// Per-method ordered pattern buckets. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    buckets: HashMap<Method, Vec<RouteEntry<H>>>,
}

impl<H> RouteTable<H> {
    /// Compiles every definition. Any malformed template aborts the whole build.
    ///
    /// Re-registering an identical `(method, template)` replaces the earlier handler
    /// in place (last write wins, original position kept).
    pub fn build(defs: impl IntoIterator<Item = RouteDef<H>>) -> Result<Self, RouteError> {
        let mut buckets: HashMap<Method, Vec<RouteEntry<H>>> = HashMap::new();

        for def in defs {
            if !SUPPORTED_METHODS.contains(&def.method) {
                return Err(RouteError::UnsupportedMethod(def.method, def.template.to_string()));
            }
            let pattern = CompiledPattern::compile(def.template)?;
            let bucket = buckets.entry(def.method.clone()).or_default();

            if let Some(existing) = bucket.iter_mut().find(|e| e.pattern.template() == def.template) {
                tracing::warn!(method = %def.method, template = def.template, "Duplicate route, later registration wins");
                existing.handler = def.handler;
                continue;
            }

            if pattern.is_static() {
                if let Some(shadow) = bucket.iter().find(|e| e.pattern.is_match(def.template)) {
                    tracing::warn!(
                        method = %def.method,
                        template = def.template,
                        shadowed_by = shadow.pattern.template(),
                        "Route is unreachable under first-match resolution"
                    );
                }
            }

            bucket.push(RouteEntry { pattern, handler: def.handler });
        }

        Ok(Self { buckets })
    }

    /// First entry (in registration order) whose pattern matches `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&RouteEntry<H>, Vec<Param>)> {
        self.buckets
            .get(method)?
            .iter()
            .find_map(|entry| entry.pattern.captures(path).map(|params| (entry, params)))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(method, template)` pairs in bucket order, for diagnostics.
    pub fn templates(&self) -> Vec<(Method, &str)> {
        let mut out: Vec<(Method, &str)> = self
            .buckets
            .iter()
            .flat_map(|(m, entries)| entries.iter().map(move |e| (m.clone(), e.pattern.template())))
            .collect();
        out.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        out
    }
}
