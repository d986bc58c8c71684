//! veer-core: HTTP dispatch layer for the veer router
//!
//! Builds the request-facing dispatcher on top of `veer-router`: opaque
//! handlers invoked with a request/response pair, trailing-slash
//! redirects, automatic OPTIONS and 405 answers carrying a computed Allow
//! header, and optional fault interception.
//!
//! The network listener, TLS and body I/O belong to the host server; this
//! crate only decides what a request resolves to. Path cleaning and
//! raw-vs-decoded path selection are likewise applied by the host before
//! a request reaches [`Router::serve`].
//!
//! ## Example
//! ```
//! use veer_core::{handler_fn, Request, Response, Router};
//!
//! let mut router = Router::new();
//! router
//!     .get(
//!         "/hello/:name",
//!         handler_fn(|req, res| {
//!             *res = Response::text(format!("Hello, {}!", req.param("name").unwrap_or("?")));
//!         }),
//!     )
//!     .unwrap();
//!
//! let mut req = Request::new("GET", "/hello/world");
//! let res = router.serve(&mut req);
//! assert_eq!(res.body_string().as_deref(), Some("Hello, world!"));
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod request;
pub mod response;
pub mod router;

// Re-exports
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use router::{handler_fn, FaultHandler, Handler, Router};

// Routing engine re-exports
pub use veer_router::{Param, Params, RouteError, CATCH_ALL_KEY};

/// Result type alias for registration operations
pub type Result<T> = std::result::Result<T, RouteError>;
