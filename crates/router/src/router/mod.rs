//! Route registration and request dispatch.
//!
//! A [`Router`] is assembled once through a [`RouterBuilder`] and is immutable
//! afterwards, so it can be shared across tasks and serve requests concurrently.
//!
//! Every request goes through the same phases:
//! 1. the query string is parsed and the route table is scanned for the first
//!    route whose method and pattern accept the request
//! 2. global middleware runs in registration order
//! 3. the handlers of the matched route run in order
//!
//! The first handler that returns [`Flow::Respond`] ends the request. A request
//! that matches no route, or whose handlers all return [`Flow::Continue`], goes
//! to the not-found handler. A handler that fails or panics sends the request to
//! the error handler instead.

pub mod filter;
mod group;
mod pattern;
mod table;

pub use filter::MethodFilter;
pub use group::RouteGroup;
pub use pattern::PathPattern;
pub use table::{Route, RouteMatch, RouteTable};

use crate::body::ResponseBody;
use crate::error::{DispatchError, HandlerError, HandlerPanic, RouterError};
use crate::handler::{ErrorHandler, Flow, HandlerChain, HandlerResult, RequestHandler, SharedHandler};
use crate::request::RequestContext;
use crate::responder::{Json, Responder};
use bytes::Bytes;
use futures::FutureExt;
use http::{Method, Request, Response, StatusCode};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span};

/// An immutable route table plus the middleware and fallbacks around it.
///
/// `E` and `C` are the environment and execution context the host passes to
/// [`Router::handle`]; the router forwards them to every handler untouched.
pub struct Router<E = (), C = ()> {
    table: RouteTable<E, C>,
    middleware: Vec<SharedHandler<E, C>>,
    not_found: Option<SharedHandler<E, C>>,
    error_handler: Option<Arc<dyn ErrorHandler<E, C>>>,
}

impl<E, C> Router<E, C> {
    /// Creates an empty router builder
    pub fn builder() -> RouterBuilder<E, C> {
        RouterBuilder::new()
    }

    /// Finds the first route accepting `method` and `path`
    pub fn at(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, E, C>> {
        self.table.find(method, path)
    }

    /// All routes in the order they are tried
    pub fn routes(&self) -> &[Route<E, C>] {
        self.table.routes()
    }
}

impl<E: Sync, C: Sync> Router<E, C> {
    /// Dispatches one request and produces its response.
    ///
    /// Handler failures never surface here: they are turned into a response by the
    /// error handler, or by the default 500 response when none is registered. Only
    /// a failure of the not-found or error handler itself is returned as `Err`.
    pub async fn handle(
        &self,
        request: Request<Bytes>,
        env: &E,
        ctx: &C,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        let span = info_span!("dispatch", method = %request.method(), path = %request.uri().path());
        self.dispatch(request, env, ctx).instrument(span).await
    }

    async fn dispatch(
        &self,
        request: Request<Bytes>,
        env: &E,
        ctx: &C,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        let (head, body) = request.into_parts();
        let mut req = RequestContext::new(head, body);

        match self.run(&mut req, env, ctx).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => self.respond_not_found(&mut req, env, ctx).await,
            Err(e) => self.respond_error(e, &mut req, env, ctx).await,
        }
    }

    /// Runs routing, global middleware and route handlers; `Ok(None)` means nobody responded.
    async fn run(
        &self,
        req: &mut RequestContext,
        env: &E,
        ctx: &C,
    ) -> Result<Option<Response<ResponseBody>>, HandlerError> {
        req.parse_query()?;

        let Some(matched) = self.table.find(req.method(), req.path()) else {
            debug!("no route matched");
            return Ok(None);
        };
        let (route, params) = matched.into_parts();
        debug!(route = route.path(), method = %route.method(), "route matched");
        req.set_path_params(params);

        if let Some(response) = run_chain("global_middleware", &self.middleware, req, env, ctx).await? {
            return Ok(Some(response));
        }
        run_chain("route_handlers", route.handlers(), req, env, ctx).await
    }

    async fn respond_not_found(
        &self,
        req: &mut RequestContext,
        env: &E,
        ctx: &C,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        req.clear_path_params();

        if let Some(handler) = &self.not_found {
            match catch_panic(handler.invoke(req, env, ctx)).await {
                Ok(Flow::Respond(response)) => return Ok(response),
                Ok(Flow::Continue) => debug!("not found handler fell through, using default response"),
                Err(source) => {
                    error!(cause = %source, "not found handler failed");
                    return Err(DispatchError::NotFoundHandler { source });
                }
            }
        }

        Ok(default_not_found())
    }

    async fn respond_error(
        &self,
        err: HandlerError,
        req: &mut RequestContext,
        env: &E,
        ctx: &C,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        error!(cause = %err, "handler failed");

        let Some(handler) = &self.error_handler else {
            return Ok(default_error(&err.to_string()));
        };

        let message = err.to_string();
        match catch_panic(handler.handle_error(err, req, env, ctx)).await {
            Ok(Flow::Respond(response)) => Ok(response),
            Ok(Flow::Continue) => Ok(default_error(&message)),
            Err(source) => {
                error!(cause = %source, "error handler failed");
                Err(DispatchError::ErrorHandler { source })
            }
        }
    }
}

impl<E, C> fmt::Debug for Router<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table)
            .field("middleware", &self.middleware.len())
            .field("not_found", &self.not_found.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

async fn run_chain<E: Sync, C: Sync>(
    phase: &'static str,
    handlers: &[SharedHandler<E, C>],
    req: &mut RequestContext,
    env: &E,
    ctx: &C,
) -> Result<Option<Response<ResponseBody>>, HandlerError> {
    for (index, handler) in handlers.iter().enumerate() {
        if let Flow::Respond(response) = catch_panic(handler.invoke(req, env, ctx)).await? {
            debug!(phase, index, status = %response.status(), "handler responded");
            return Ok(Some(response));
        }
    }
    Ok(None)
}

/// A panicking handler is reported like any other handler failure.
async fn catch_panic<F>(future: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    AssertUnwindSafe(future).catch_unwind().await.unwrap_or_else(|payload| Err(HandlerPanic::from(payload).into()))
}

fn default_not_found() -> Response<ResponseBody> {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn default_error(message: &str) -> Response<ResponseBody> {
    let message = if message.is_empty() { "Internal Server Error" } else { message };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Collects routes, middleware and fallbacks, then freezes them into a [`Router`].
///
/// Paths are compiled as soon as they are registered. Registration never fails
/// on the spot: invalid routes are remembered and reported by [`build`](Self::build).
pub struct RouterBuilder<E = (), C = ()> {
    table: RouteTable<E, C>,
    middleware: Vec<SharedHandler<E, C>>,
    not_found: Option<SharedHandler<E, C>>,
    error_handler: Option<Arc<dyn ErrorHandler<E, C>>>,
    errors: Vec<RouterError>,
}

impl<E, C> RouterBuilder<E, C> {
    fn new() -> Self {
        Self {
            table: RouteTable::new(),
            middleware: Vec::new(),
            not_found: None,
            error_handler: None,
            errors: Vec::new(),
        }
    }

    /// Registers a route with an ordered list of handlers.
    pub fn route(mut self, method: impl Into<MethodFilter>, path: &str, handlers: HandlerChain<E, C>) -> Self {
        if let Err(e) = self.table.add_route(method.into(), path, handlers) {
            self.errors.push(RouterError::invalid_route(path, e));
        }
        self
    }

    /// Appends global middleware, run for every matched request before the route handlers.
    pub fn middleware<H>(mut self, handler: H) -> Self
    where
        H: RequestHandler<E, C> + 'static,
    {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Registers routes under `prefix` through a [`RouteGroup`].
    pub fn group<F>(mut self, prefix: &str, f: F) -> Self
    where
        F: FnOnce(&mut RouteGroup<'_, E, C>),
    {
        let mut group = RouteGroup::new(prefix.to_string(), Vec::new(), &mut self.table, &mut self.errors);
        f(&mut group);
        self
    }

    /// Copies every route of `sub` under `prefix`.
    ///
    /// The copy is taken now: routes added to `sub` afterwards are not seen by this
    /// router. Only routes are copied; the middleware and fallbacks of `sub` are not.
    pub fn mount(mut self, prefix: &str, sub: &RouterBuilder<E, C>) -> Self {
        self.errors.extend(sub.errors.iter().cloned());
        if let Err(e) = self.table.merge(prefix, &sub.table) {
            self.errors.push(RouterError::invalid_route(prefix, e));
        }
        self
    }

    /// Sets the handler for requests no route responded to.
    pub fn not_found<H>(mut self, handler: H) -> Self
    where
        H: RequestHandler<E, C> + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Sets the handler for failed requests.
    pub fn on_error<H>(mut self, handler: H) -> Self
    where
        H: ErrorHandler<E, C> + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Builds the router, failing with the first invalid route registered.
    pub fn build(self) -> Result<Router<E, C>, RouterError> {
        if let Some(e) = self.errors.into_iter().next() {
            error!(cause = %e, "router build failed");
            return Err(e);
        }

        debug!(routes = self.table.len(), middleware = self.middleware.len(), "router built");
        Ok(Router {
            table: self.table,
            middleware: self.middleware,
            not_found: self.not_found,
            error_handler: self.error_handler,
        })
    }
}

macro_rules! method_route {
    ($method:ident, $method_filter:ident) => {
        #[doc = concat!("Registers `handler` for `", stringify!($method), "` requests on `path`.")]
        pub fn $method<H>(self, path: &str, handler: H) -> Self
        where
            H: RequestHandler<E, C> + 'static,
        {
            self.route(filter::$method_filter(), path, HandlerChain::new().then(handler))
        }
    };
}

impl<E, C> RouterBuilder<E, C> {
    method_route!(get, get_method);
    method_route!(post, post_method);
    method_route!(put, put_method);
    method_route!(delete, delete_method);
    method_route!(patch, patch_method);
    method_route!(options, options_method);
    method_route!(head, head_method);
    method_route!(all, any_method);
}

impl<E, C> Default for RouterBuilder<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> fmt::Debug for RouterBuilder<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.table)
            .field("middleware", &self.middleware.len())
            .field("errors", &self.errors)
            .finish()
    }
}
