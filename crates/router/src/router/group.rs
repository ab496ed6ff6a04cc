use super::filter::{self, MethodFilter};
use super::table::RouteTable;
use crate::error::RouterError;
use crate::handler::{HandlerChain, RequestHandler, SharedHandler};
use std::fmt;
use std::sync::Arc;

/// A prefix and middleware scoped view over a route table.
///
/// A group stores nothing itself: every registration prepends the accumulated
/// prefix to the path and the accumulated middleware to the handlers, then adds
/// the route to the underlying table. Middleware added to a group only affects
/// routes registered through it afterwards.
///
/// ```
/// use micro_router::{Flow, HandlerResult, RequestContext, Router, handler_fn};
///
/// async fn ok(_req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
///     Ok(Flow::respond("ok"))
/// }
///
/// let router: Router = Router::builder()
///     .group("/api", |api| {
///         api.group("/v1").get("/x", handler_fn(ok));
///     })
///     .build()
///     .unwrap();
/// assert_eq!(router.routes()[0].path(), "/api/v1/x");
/// ```
pub struct RouteGroup<'t, E, C> {
    prefix: String,
    middleware: Vec<SharedHandler<E, C>>,
    table: &'t mut RouteTable<E, C>,
    errors: &'t mut Vec<RouterError>,
}

impl<'t, E, C> RouteGroup<'t, E, C> {
    pub(crate) fn new(
        prefix: String,
        middleware: Vec<SharedHandler<E, C>>,
        table: &'t mut RouteTable<E, C>,
        errors: &'t mut Vec<RouterError>,
    ) -> Self {
        Self { prefix, middleware, table, errors }
    }

    /// The accumulated prefix of this group
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Appends middleware that runs before the handlers of routes registered afterwards
    pub fn middleware<H>(&mut self, handler: H) -> &mut Self
    where
        H: RequestHandler<E, C> + 'static,
    {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Opens a nested group: its prefix and middleware extend this group's.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_, E, C> {
        RouteGroup {
            prefix: format!("{}{prefix}", self.prefix),
            middleware: self.middleware.clone(),
            table: &mut *self.table,
            errors: &mut *self.errors,
        }
    }

    /// Registers a route whose handler list is the group middleware followed by `handlers`.
    pub fn route(&mut self, method: impl Into<MethodFilter>, path: &str, handlers: HandlerChain<E, C>) -> &mut Self {
        let full_path = format!("{}{path}", self.prefix);
        let mut full_handlers = self.middleware.clone();
        full_handlers.extend(handlers.into_inner());

        if let Err(e) = self.table.add_route(method.into(), &full_path, HandlerChain::from_shared(full_handlers)) {
            self.errors.push(RouterError::invalid_route(full_path, e));
        }
        self
    }
}

macro_rules! group_method_route {
    ($method:ident, $method_filter:ident) => {
        #[doc = concat!("Registers `handler` for `", stringify!($method), "` requests on `prefix + path`.")]
        pub fn $method<H>(&mut self, path: &str, handler: H) -> &mut Self
        where
            H: RequestHandler<E, C> + 'static,
        {
            self.route(filter::$method_filter(), path, HandlerChain::new().then(handler))
        }
    };
}

impl<E, C> RouteGroup<'_, E, C> {
    group_method_route!(get, get_method);
    group_method_route!(post, post_method);
    group_method_route!(put, put_method);
    group_method_route!(delete, delete_method);
    group_method_route!(patch, patch_method);
    group_method_route!(options, options_method);
    group_method_route!(head, head_method);
    group_method_route!(all, any_method);
}

impl<E, C> fmt::Debug for RouteGroup<'_, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup").field("prefix", &self.prefix).field("middleware", &self.middleware.len()).finish()
    }
}
