//! Request dispatcher
//!
//! Owns the per-method route table and decides, per request, between
//! invoking the matched handler and the HTTP-level fallbacks: trailing
//! slash redirect, automatic OPTIONS, 405 and 404.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use veer_router::{Params, RouteError};

use crate::{Request, Response, StatusCode};

/// Opaque request handler, invoked with the matched request and a response
/// to fill in.
pub type Handler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// Handler for faults caught while serving a request; receives the panic
/// payload as its third argument.
pub type FaultHandler = Arc<dyn Fn(&Request, &mut Response, Box<dyn Any + Send>) + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&Request, &mut Response) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// HTTP request router and dispatcher.
///
/// Register every route at startup, then call [`serve`](Router::serve)
/// from as many workers as the host runs; dispatch is a read-only
/// traversal with no shared mutable state.
pub struct Router {
    routes: veer_router::Router<Handler>,

    /// Redirect a request whose path differs from a registered route only
    /// by its trailing slash: 301 for GET, 308 for everything else.
    pub redirect_trailing_slash: bool,
    /// Answer OPTIONS requests automatically with an Allow header.
    pub handle_options: bool,
    /// Answer 405 with an Allow header when the path is registered for
    /// other methods.
    pub handle_method_not_allowed: bool,

    /// Invoked on automatic OPTIONS responses, after the Allow header has
    /// been set. Defaults to an empty 200.
    pub global_options: Option<Handler>,
    /// Invoked when no route matches. Defaults to a plain 404.
    pub not_found: Option<Handler>,
    /// Invoked on 405 responses, after the Allow header has been set.
    /// Defaults to a plain 405.
    pub method_not_allowed: Option<Handler>,
    /// When set, a panic raised by a handler is caught and redirected
    /// here, once per request, instead of unwinding into the worker.
    pub panic_handler: Option<FaultHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: veer_router::Router::new(),
            redirect_trailing_slash: true,
            handle_options: true,
            handle_method_not_allowed: true,
            global_options: None,
            not_found: None,
            method_not_allowed: None,
            panic_handler: None,
        }
    }

    /// Register a handler for the given method and pattern.
    pub fn handle(
        &mut self,
        method: &str,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        self.routes.handle(method, pattern, handler)
    }

    /// Shortcut for `handle("GET", ...)`
    pub fn get(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("GET", pattern, handler)
    }

    /// Shortcut for `handle("HEAD", ...)`
    pub fn head(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("HEAD", pattern, handler)
    }

    /// Shortcut for `handle("OPTIONS", ...)`
    pub fn options(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("OPTIONS", pattern, handler)
    }

    /// Shortcut for `handle("POST", ...)`
    pub fn post(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("POST", pattern, handler)
    }

    /// Shortcut for `handle("PUT", ...)`
    pub fn put(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("PUT", pattern, handler)
    }

    /// Shortcut for `handle("PATCH", ...)`
    pub fn patch(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("PATCH", pattern, handler)
    }

    /// Shortcut for `handle("DELETE", ...)`
    pub fn delete(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.handle("DELETE", pattern, handler)
    }

    /// Manual lookup of a method and path, bypassing the fallback chain.
    pub fn lookup(&self, method: &str, path: &str) -> Option<(&Handler, Params)> {
        self.routes.lookup(method, path)
    }

    /// Allow header value for the given path, excluding `exclude`.
    pub fn allowed(&self, path: &str, exclude: &str) -> String {
        self.routes.allowed(path, exclude)
    }

    /// Serve a single request, producing either the matched handler's
    /// response or one of the fallbacks.
    pub fn serve(&self, req: &mut Request) -> Response {
        if self.panic_handler.is_none() {
            return self.dispatch(req);
        }

        let result = catch_unwind(AssertUnwindSafe(|| self.dispatch(req)));
        match result {
            Ok(res) => res,
            Err(payload) => {
                let mut res = Response::new(StatusCode::INTERNAL_SERVER_ERROR);
                if let Some(handler) = &self.panic_handler {
                    handler(req, &mut res, payload);
                }
                res
            }
        }
    }

    fn dispatch(&self, req: &mut Request) -> Response {
        if let Some((handler, params)) = self.routes.lookup(&req.method, &req.path) {
            req.params = params;
            let mut res = Response::ok();
            handler(req, &mut res);
            return res;
        }

        if req.method != "CONNECT" && req.path != "/" && self.redirect_trailing_slash {
            let redirect = if req.path.len() > 1 && req.path.ends_with('/') {
                req.path[..req.path.len() - 1].to_string()
            } else {
                format!("{}/", req.path)
            };
            if self.routes.lookup(&req.method, &redirect).is_some() {
                let status = if req.method == "GET" {
                    StatusCode::MOVED_PERMANENTLY
                } else {
                    StatusCode::PERMANENT_REDIRECT
                };
                log::debug!("redirecting {} {} to {redirect}", req.method, req.path);
                return Response::redirect(&redirect, status);
            }
        }

        if req.method == "OPTIONS" && self.handle_options {
            let allow = self.allowed(&req.path, "OPTIONS");
            if !allow.is_empty() {
                let mut res = Response::ok();
                res.set_header("allow", allow);
                if let Some(handler) = &self.global_options {
                    handler(req, &mut res);
                }
                return res;
            }
        } else if self.handle_method_not_allowed {
            let allow = self.allowed(&req.path, &req.method);
            if !allow.is_empty() {
                // a custom responder writes its own status over a neutral
                // response; only the default produces the plain 405
                let mut res = match &self.method_not_allowed {
                    Some(_) => Response::ok(),
                    None => Response::method_not_allowed(),
                };
                res.set_header("allow", allow);
                if let Some(handler) = &self.method_not_allowed {
                    handler(req, &mut res);
                }
                return res;
            }
        }

        match &self.not_found {
            Some(handler) => {
                let mut res = Response::ok();
                handler(req, &mut res);
                res
            }
            None => Response::not_found(),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Handler that tags the response so tests can tell who ran.
    fn tag(name: &'static str) -> Handler {
        handler_fn(move |_req, res| res.set_header("x-handler", name))
    }

    /// Handler that copies a captured parameter into a response header.
    fn echo_param(name: &'static str) -> Handler {
        handler_fn(move |req, res| {
            let value = req.param(name).unwrap_or("<missing>").to_string();
            res.set_header("x-param", value);
        })
    }

    fn serve(router: &Router, method: &str, path: &str) -> Response {
        let mut req = Request::new(method, path);
        router.serve(&mut req)
    }

    #[test]
    fn serves_the_matched_handler_with_params() {
        let mut router = Router::new();
        router.get("/", tag("index")).unwrap();
        router.get("/user/:id", echo_param("id")).unwrap();
        router.get("/src/*filepath", echo_param("filepath")).unwrap();

        let res = serve(&router, "GET", "/");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("x-handler"), Some("index"));

        let res = serve(&router, "GET", "/user/42");
        assert_eq!(res.header("x-param"), Some("42"));

        let res = serve(&router, "GET", "/src/some/file.png");
        assert_eq!(res.header("x-param"), Some("some/file.png"));
    }

    #[test]
    fn params_arrive_in_declaration_order() {
        let mut router = Router::new();
        router
            .get(
                "/cmd/:tool/:sub",
                handler_fn(|req, res| {
                    let joined: Vec<String> = req
                        .params
                        .iter()
                        .map(|p| format!("{}={}", p.name, p.value))
                        .collect();
                    res.set_header("x-params", joined.join(","));
                }),
            )
            .unwrap();

        let res = serve(&router, "GET", "/cmd/test/3");
        assert_eq!(res.header("x-params"), Some("tool=test,sub=3"));
    }

    #[test]
    fn redirects_on_trailing_slash_mismatch() {
        let mut router = Router::new();
        router.get("/doc/", tag("doc")).unwrap();
        router.post("/doc/", tag("post_doc")).unwrap();
        router.get("/api", tag("api")).unwrap();
        router.get("/cmd/:tool/", tag("tool")).unwrap();

        // missing slash, GET: 301
        let res = serve(&router, "GET", "/doc");
        assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.header("location"), Some("/doc/"));

        // the toggled path can land on a parameter route
        let res = serve(&router, "GET", "/cmd/test");
        assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.header("location"), Some("/cmd/test/"));

        // missing slash, other method: 308
        let res = serve(&router, "POST", "/doc");
        assert_eq!(res.status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(res.header("location"), Some("/doc/"));

        // superfluous slash
        let res = serve(&router, "GET", "/api/");
        assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.header("location"), Some("/api"));
    }

    #[test]
    fn no_redirect_for_connect_or_root() {
        let mut router = Router::new();
        router.handle("CONNECT", "/doc/", tag("doc")).unwrap();
        router.get("/x/", tag("x")).unwrap();

        // CONNECT never gets the trailing-slash treatment
        let res = serve(&router, "CONNECT", "/doc");
        assert_eq!(res.status, StatusCode::NOT_FOUND);

        // "/" cannot be toggled
        let res = serve(&router, "GET", "/");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn redirect_can_be_disabled() {
        let mut router = Router::new();
        router.redirect_trailing_slash = false;
        router.get("/doc/", tag("doc")).unwrap();

        let res = serve(&router, "GET", "/doc");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn answers_options_with_allow_header() {
        let mut router = Router::new();
        router.get("/doc/", tag("doc")).unwrap();
        router.post("/doc/", tag("post_doc")).unwrap();

        let res = serve(&router, "OPTIONS", "/doc/");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS, POST"));

        // server-wide request answers from the cached value
        let res = serve(&router, "OPTIONS", "*");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS, POST"));

        // unknown path: nothing allowed, so fall through to 404
        let res = serve(&router, "OPTIONS", "/missing");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn custom_global_options_responder_runs_after_allow_is_set() {
        let mut router = Router::new();
        router.get("/doc/", tag("doc")).unwrap();
        router.global_options = Some(handler_fn(|_req, res| {
            res.set_header("access-control-allow-origin", "*");
            res.status = StatusCode::NO_CONTENT;
        }));

        let res = serve(&router, "OPTIONS", "/doc/");
        assert_eq!(res.status, StatusCode::NO_CONTENT);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS"));
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn answers_405_when_other_methods_match() {
        let mut router = Router::new();
        router.get("/doc/", tag("doc")).unwrap();
        router.post("/doc/", tag("post_doc")).unwrap();

        let res = serve(&router, "DELETE", "/doc/");
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS, POST"));
        assert_eq!(res.body_string().as_deref(), Some("Method Not Allowed"));
    }

    #[test]
    fn custom_405_responder_gets_the_allow_header() {
        let mut router = Router::new();
        router.get("/doc/", tag("doc")).unwrap();
        router.method_not_allowed = Some(handler_fn(|_req, res| {
            res.status = StatusCode::METHOD_NOT_ALLOWED;
            res.body = bytes::Bytes::from_static(b"nope");
        }));

        let res = serve(&router, "PUT", "/doc/");
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS"));
        assert_eq!(res.body_string().as_deref(), Some("nope"));
    }

    #[test]
    fn handles_405_disabled() {
        let mut router = Router::new();
        router.handle_method_not_allowed = false;
        router.get("/doc/", tag("doc")).unwrap();

        let res = serve(&router, "DELETE", "/doc/");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn falls_back_to_404() {
        let router = Router::new();
        let res = serve(&router, "GET", "/nothing/here");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body_string().as_deref(), Some("Not Found"));
    }

    #[test]
    fn custom_not_found_responder() {
        let mut router = Router::new();
        router.not_found = Some(handler_fn(|req, res| {
            res.status = StatusCode::NOT_FOUND;
            res.set_header("x-missed", req.path.clone());
        }));

        let res = serve(&router, "GET", "/nope");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.header("x-missed"), Some("/nope"));
    }

    #[test]
    fn panic_handler_intercepts_handler_faults() {
        let mut router = Router::new();
        router
            .get("/boom", handler_fn(|_req, _res| panic!("kaboom")))
            .unwrap();
        router.panic_handler = Some(Arc::new(|_req, res, payload| {
            let msg = payload
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("unknown fault");
            res.set_header("x-fault", msg);
        }));

        let res = serve(&router, "GET", "/boom");
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.header("x-fault"), Some("kaboom"));
    }

    #[test]
    fn without_panic_handler_faults_propagate() {
        let mut router = Router::new();
        router
            .get("/boom", handler_fn(|_req, _res| panic!("kaboom")))
            .unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| serve(&router, "GET", "/boom")));
        assert!(result.is_err());
    }

    #[test]
    fn registration_errors_surface_unchanged() {
        let mut router = Router::new();
        assert_eq!(
            router.handle("", "/x", tag("x")),
            Err(RouteError::EmptyMethod)
        );
        assert!(matches!(
            router.handle("GET", "doc", tag("doc")),
            Err(RouteError::InvalidPattern { .. })
        ));
        router.get("/doc/", tag("doc")).unwrap();
        assert!(matches!(
            router.get("/doc/", tag("doc")),
            Err(RouteError::RouteAlreadyRegistered(_))
        ));
    }

    #[test]
    fn manual_lookup_exposes_handler_and_params() {
        let mut router = Router::new();
        router.put("/user/:id", tag("put_user")).unwrap();

        let (handler, params) = router.lookup("PUT", "/user/7").unwrap();
        assert_eq!(params.by_name("id"), Some("7"));
        let mut res = Response::ok();
        handler(&Request::new("PUT", "/user/7"), &mut res);
        assert_eq!(res.header("x-handler"), Some("put_user"));

        assert!(router.lookup("GET", "/user/7").is_none());
    }

    #[test]
    fn router_is_shareable_across_workers() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Router>();
    }
}
