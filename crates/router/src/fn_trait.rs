//! Function traits that let plain `async fn`s act as handlers.
//!
//! A handler borrows the request context, the environment and the execution context
//! for the duration of its call, so the returned future is tied to those borrows.
//! The traits here name that future per lifetime, which lets
//! `for<'a> HandlerFn<'a, E, C>` accept an `async fn` like
//!
//! ```
//! use micro_router::{Flow, HandlerResult, RequestContext};
//!
//! async fn show_user(req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     Ok(Flow::respond(format!("user {id}")))
//! }
//! ```

use crate::error::HandlerError;
use crate::handler::HandlerResult;
use crate::request::RequestContext;

/// Represents an async function `(request, env, ctx) -> HandlerResult`
pub trait HandlerFn<'a, E, C>: Send + Sync {
    type Future: Future<Output = HandlerResult> + Send + 'a;

    fn call(&self, req: &'a mut RequestContext, env: &'a E, ctx: &'a C) -> Self::Future;
}

impl<'a, E, C, Func, Fut> HandlerFn<'a, E, C> for Func
where
    E: Sync + 'static,
    C: Sync + 'static,
    Func: Fn(&'a mut RequestContext, &'a E, &'a C) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'a,
{
    type Future = Fut;

    #[inline]
    fn call(&self, req: &'a mut RequestContext, env: &'a E, ctx: &'a C) -> Self::Future {
        (self)(req, env, ctx)
    }
}

/// Represents an async function `(error, request, env, ctx) -> HandlerResult`
pub trait ErrorHandlerFn<'a, E, C>: Send + Sync {
    type Future: Future<Output = HandlerResult> + Send + 'a;

    fn call(&self, err: HandlerError, req: &'a mut RequestContext, env: &'a E, ctx: &'a C) -> Self::Future;
}

impl<'a, E, C, Func, Fut> ErrorHandlerFn<'a, E, C> for Func
where
    E: Sync + 'static,
    C: Sync + 'static,
    Func: Fn(HandlerError, &'a mut RequestContext, &'a E, &'a C) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'a,
{
    type Future = Fut;

    #[inline]
    fn call(&self, err: HandlerError, req: &'a mut RequestContext, env: &'a E, ctx: &'a C) -> Self::Future {
        (self)(err, req, env, ctx)
    }
}
