//! Error types for route registration

use thiserror::Error;

/// Errors reported while registering a route.
///
/// All of these are detected at registration time and abort it; lookups
/// never fail, an unmatched path is a normal outcome handled by the
/// dispatcher's fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern is syntactically invalid.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// A catch-all segment appeared before the end of the pattern.
    #[error("catch-all must be the last segment in pattern '{0}'")]
    CatchAllNotTerminal(String),

    /// A parameter or catch-all was registered at a tree position that
    /// already holds one.
    #[error("cannot add ambiguous pattern '{pattern}', existing route '{existing}' already exists")]
    AmbiguousRoute { pattern: String, existing: String },

    /// The exact pattern was registered twice for the same method.
    #[error("a handler is already registered for '{0}'")]
    RouteAlreadyRegistered(String),

    /// Registration was attempted with an empty method name.
    #[error("method must not be empty")]
    EmptyMethod,
}
