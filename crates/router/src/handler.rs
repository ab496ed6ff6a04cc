use crate::body::ResponseBody;
use crate::error::HandlerError;
use crate::fn_trait::{ErrorHandlerFn, HandlerFn};
use crate::request::RequestContext;
use crate::responder::Responder;
use async_trait::async_trait;
use http::Response;
use std::fmt;
use std::sync::Arc;

/// What a handler tells the chain executor.
#[derive(Debug)]
pub enum Flow {
    /// Fall through to the next handler.
    Continue,
    /// Stop the chain, this is the final response.
    Respond(Response<ResponseBody>),
}

impl Flow {
    pub fn respond<R: Responder>(responder: R) -> Self {
        Flow::Respond(responder.into_response())
    }

    #[inline]
    pub fn is_continue(&self) -> bool {
        matches!(self, Flow::Continue)
    }
}

pub type HandlerResult = Result<Flow, HandlerError>;

/// A link of the dispatch chain: global middleware, route handlers and the
/// not-found fallback all implement this trait.
///
/// `E` and `C` are the environment and execution context handed over by the host;
/// they are passed through untouched.
#[async_trait]
pub trait RequestHandler<E, C>: Send + Sync {
    async fn invoke(&self, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult;
}

/// The fallback invoked when a handler fails.
#[async_trait]
pub trait ErrorHandler<E, C>: Send + Sync {
    async fn handle_error(&self, err: HandlerError, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult;
}

#[async_trait]
impl<E, C, H> RequestHandler<E, C> for Arc<H>
where
    E: Sync,
    C: Sync,
    H: RequestHandler<E, C> + ?Sized,
{
    async fn invoke(&self, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult {
        self.as_ref().invoke(req, env, ctx).await
    }
}

/// a [`HandlerFn`] holder which represents any async fn usable as a handler
pub struct FnHandler<F> {
    f: F,
}

/// Wraps an `async fn(&mut RequestContext, &E, &C) -> HandlerResult` into a [`RequestHandler`]
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

#[async_trait]
impl<F, E, C> RequestHandler<E, C> for FnHandler<F>
where
    F: for<'a> HandlerFn<'a, E, C> + Send + Sync,
    E: Sync,
    C: Sync,
{
    async fn invoke(&self, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult {
        self.f.call(req, env, ctx).await
    }
}

/// a [`ErrorHandlerFn`] holder
pub struct FnErrorHandler<F> {
    f: F,
}

/// Wraps an `async fn(HandlerError, &mut RequestContext, &E, &C) -> HandlerResult` into an [`ErrorHandler`]
pub fn error_handler_fn<F>(f: F) -> FnErrorHandler<F> {
    FnErrorHandler { f }
}

impl<F> fmt::Debug for FnErrorHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnErrorHandler")
    }
}

#[async_trait]
impl<F, E, C> ErrorHandler<E, C> for FnErrorHandler<F>
where
    F: for<'a> ErrorHandlerFn<'a, E, C> + Send + Sync,
    E: Sync,
    C: Sync,
{
    async fn handle_error(&self, err: HandlerError, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult {
        self.f.call(err, req, env, ctx).await
    }
}

pub(crate) type SharedHandler<E, C> = Arc<dyn RequestHandler<E, C>>;

/// An ordered list of handlers, run left to right until one responds.
pub struct HandlerChain<E, C> {
    handlers: Vec<SharedHandler<E, C>>,
}

impl<E, C> HandlerChain<E, C> {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Appends a handler to the end of the chain
    #[must_use]
    pub fn then<H>(mut self, handler: H) -> Self
    where
        H: RequestHandler<E, C> + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn from_shared(handlers: Vec<SharedHandler<E, C>>) -> Self {
        Self { handlers }
    }

    pub(crate) fn into_inner(self) -> Vec<SharedHandler<E, C>> {
        self.handlers
    }
}

impl<E, C> Default for HandlerChain<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> fmt::Debug for HandlerChain<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain").field("len", &self.handlers.len()).finish()
    }
}
