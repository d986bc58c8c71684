//! veer-router: radix tree HTTP routing engine
//!
//! Stores route patterns per HTTP method in a radix tree and resolves an
//! incoming path to the registered value plus its captured parameters.
//!
//! ## Path syntax
//! - `/users/profile` - literal path, matched byte for byte
//! - `:name` - named parameter, matches exactly one non-empty segment
//! - `*name` - catch-all, matches the remaining path including slashes;
//!   must be the final segment of the pattern
//!
//! ## Matching
//! At every node the literal children are scanned first (kept ordered so
//! the busiest branches come first), then the parameter branch, then the
//! catch-all. Conflicting registrations (two parameter names at one
//! position, a duplicate pattern) are rejected when the route is added,
//! never at lookup time.
//!
//! Registration is a build-then-freeze affair: insert everything up front,
//! then share the router freely between request workers.
//!
//! ## Example
//! ```
//! use veer_router::Router;
//!
//! let mut router = Router::new();
//! router.handle("GET", "/users", 0).unwrap();
//! router.handle("GET", "/users/:id", 1).unwrap();
//! router.handle("GET", "/files/*path", 2).unwrap();
//!
//! let (value, params) = router.lookup("GET", "/users/42").unwrap();
//! assert_eq!(*value, 1);
//! assert_eq!(params.by_name("id"), Some("42"));
//!
//! let (value, params) = router.lookup("GET", "/files/docs/readme.md").unwrap();
//! assert_eq!(*value, 2);
//! assert_eq!(params.by_name("path"), Some("docs/readme.md"));
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
mod normalize;
pub mod params;
pub mod router;
pub mod tree;

pub use error::RouteError;
pub use params::{Param, Params, CATCH_ALL_KEY};
pub use router::Router;
pub use tree::{Matched, Tree};
