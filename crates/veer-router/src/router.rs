//! Per-method route table

use std::collections::HashMap;

use crate::error::RouteError;
use crate::params::{Param, Params, CATCH_ALL_KEY};
use crate::tree::Tree;

/// Routes organized by HTTP method, with the Allow-header bookkeeping
/// needed for OPTIONS and 405 answers.
///
/// Registration happens once at startup and takes `&mut self`; lookups are
/// read-only traversals and safe to share across request workers once
/// registration is done.
#[derive(Debug)]
pub struct Router<T> {
    /// Method -> match tree, method token stored verbatim so custom
    /// methods work.
    trees: HashMap<String, Tree<T>>,
    /// Cached Allow value for server-wide (`*`) OPTIONS requests.
    global_allowed: String,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            global_allowed: String::new(),
        }
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value for the given method and pattern.
    ///
    /// The method tree is created lazily on first use; creating one
    /// refreshes the cached server-wide Allow value.
    pub fn handle(&mut self, method: &str, pattern: &str, value: T) -> Result<(), RouteError> {
        if method.is_empty() {
            return Err(RouteError::EmptyMethod);
        }
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "must begin with '/'",
            });
        }

        let created = !self.trees.contains_key(method);
        let result = self
            .trees
            .entry(method.to_string())
            .or_default()
            .insert(pattern, value);
        if created {
            self.global_allowed = self.allowed("*", "");
        }
        if result.is_ok() {
            log::debug!("registered route {method} {pattern}");
        }
        result
    }

    /// Looks up a path for a method, returning the stored value and the
    /// captured parameters zipped with their declared names. A catch-all
    /// stored under the bare name `*` is surfaced as [`CATCH_ALL_KEY`].
    pub fn lookup(&self, method: &str, path: &str) -> Option<(&T, Params)> {
        let matched = self.trees.get(method)?.at(path)?;
        let params = matched
            .names
            .iter()
            .zip(matched.captures)
            .map(|(name, value)| {
                if name == "*" {
                    Param { name: CATCH_ALL_KEY.to_string(), value }
                } else {
                    Param { name: name.clone(), value }
                }
            })
            .collect();
        Some((matched.value, params))
    }

    /// The Allow header value for `path`, excluding `exclude`; empty when
    /// nothing else is registered there. A non-empty result always
    /// contains `OPTIONS`, sorted with the rest.
    ///
    /// The path `"*"` means server-wide: with an exclusion it answers from
    /// the cache, without one it recomputes from the registered method set
    /// (that form refreshes the cache itself).
    pub fn allowed(&self, path: &str, exclude: &str) -> String {
        let mut allowed: Vec<&str> = Vec::new();

        if path == "*" {
            if !exclude.is_empty() {
                return self.global_allowed.clone();
            }
            for method in self.trees.keys() {
                if method != "OPTIONS" {
                    allowed.push(method);
                }
            }
        } else {
            for (method, tree) in &self.trees {
                if method == exclude || method == "OPTIONS" {
                    continue;
                }
                if tree.at(path).is_some() {
                    allowed.push(method);
                }
            }
        }

        if allowed.is_empty() {
            return String::new();
        }
        allowed.push("OPTIONS");
        allowed.sort_unstable();
        allowed.join(", ")
    }

    /// True if any route is registered for `method`.
    pub fn has_method(&self, method: &str) -> bool {
        self.trees.contains_key(method)
    }

    /// All methods with registered routes, in no particular order.
    pub fn methods(&self) -> Vec<&str> {
        self.trees.keys().map(String::as_str).collect()
    }
}
