use super::filter::MethodFilter;
use super::pattern::PathPattern;
use crate::error::PatternError;
use crate::handler::{HandlerChain, SharedHandler};
use crate::request::PathParams;
use http::Method;
use std::fmt;

/// One compiled `(method, pattern, handlers)` triple.
pub struct Route<E, C> {
    method: MethodFilter,
    pattern: PathPattern,
    handlers: Vec<SharedHandler<E, C>>,
}

impl<E, C> Route<E, C> {
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    /// The path as it was registered, including any group or mount prefix
    pub fn path(&self) -> &str {
        self.pattern.raw()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub(crate) fn handlers(&self) -> &[SharedHandler<E, C>] {
        &self.handlers
    }

    /// Copies this route under `prefix`, sharing the same handlers.
    pub(crate) fn prefixed(&self, prefix: &str) -> Result<Self, PatternError> {
        Ok(Self {
            method: self.method.clone(),
            pattern: self.pattern.prefixed(prefix)?,
            handlers: self.handlers.clone(),
        })
    }
}

impl<E, C> fmt::Debug for Route<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.pattern.raw())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// The result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'table, E, C> {
    route: &'table Route<E, C>,
    params: PathParams,
}

impl<'table, E, C> RouteMatch<'table, E, C> {
    pub fn route(&self) -> &'table Route<E, C> {
        self.route
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (&'table Route<E, C>, PathParams) {
        (self.route, self.params)
    }
}

/// Routes in registration order.
///
/// Lookup is a linear scan and the first route whose method and pattern both
/// accept the request wins, so registration order alone decides precedence.
pub struct RouteTable<E, C> {
    routes: Vec<Route<E, C>>,
}

impl<E, C> RouteTable<E, C> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compiles `path` and appends the route.
    pub fn add_route(
        &mut self,
        method: MethodFilter,
        path: &str,
        handlers: HandlerChain<E, C>,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::compile(path)?;
        self.routes.push(Route { method, pattern, handlers: handlers.into_inner() });
        Ok(())
    }

    /// Appends a copy of every route of `other` under `prefix`.
    pub fn merge(&mut self, prefix: &str, other: &RouteTable<E, C>) -> Result<(), PatternError> {
        let mounted = other.routes.iter().map(|route| route.prefixed(prefix)).collect::<Result<Vec<_>, _>>()?;
        self.routes.extend(mounted);
        Ok(())
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, E, C>> {
        self.routes.iter().filter(|route| route.method.matches(method)).find_map(|route| {
            route.pattern.captures(path).map(|params| RouteMatch { route, params: PathParams::from(params) })
        })
    }

    pub fn routes(&self) -> &[Route<E, C>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<E, C> Default for RouteTable<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> fmt::Debug for RouteTable<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Flow, HandlerResult, handler_fn};
    use crate::request::RequestContext;
    use crate::router::filter::{any_method, get_method, post_method};

    async fn noop(_req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
        Ok(Flow::Continue)
    }

    fn chain() -> HandlerChain<(), ()> {
        HandlerChain::new().then(handler_fn(noop))
    }

    fn table() -> RouteTable<(), ()> {
        let mut table = RouteTable::new();
        table.add_route(get_method(), "/users/new", chain()).unwrap();
        table.add_route(get_method(), "/users/:id", chain()).unwrap();
        table.add_route(post_method(), "/users", chain()).unwrap();
        table.add_route(any_method(), "/users/:id", chain().then(handler_fn(noop))).unwrap();
        table
    }

    #[test]
    fn test_first_match_wins() {
        let table = table();

        let matched = table.find(&Method::GET, "/users/new").unwrap();
        assert_eq!(matched.route().path(), "/users/new");
        assert!(matched.params().is_empty());

        let matched = table.find(&Method::GET, "/users/42").unwrap();
        assert_eq!(matched.route().path(), "/users/:id");
        assert_eq!(matched.route().method(), &get_method());
        assert_eq!(matched.params().get("id"), Some("42"));
    }

    #[test]
    fn test_method_mismatch_moves_on() {
        let table = table();

        let matched = table.find(&Method::DELETE, "/users/42").unwrap();
        assert_eq!(matched.route().method(), &any_method());
        assert_eq!(matched.route().handlers().len(), 2);

        assert!(table.find(&Method::POST, "/users/").is_none());
        assert_eq!(table.find(&Method::POST, "/users").unwrap().route().path(), "/users");
    }

    #[test]
    fn test_no_match() {
        let table = table();
        assert!(table.find(&Method::GET, "/posts").is_none());
        assert!(table.find(&Method::GET, "/users/").is_none());
        assert!(table.find(&Method::POST, "/users/1/x").is_none());
    }

    #[test]
    fn test_merge_copies_under_prefix() {
        let mut sub = RouteTable::new();
        sub.add_route(get_method(), "/", chain()).unwrap();
        sub.add_route(get_method(), "/:id", chain()).unwrap();

        let mut parent = RouteTable::new();
        parent.merge("/users", &sub).unwrap();
        sub.add_route(get_method(), "/late", chain()).unwrap();

        assert_eq!(parent.len(), 2);
        assert_eq!(parent.routes()[0].path(), "/users/");
        assert_eq!(parent.routes()[1].path(), "/users/:id");
        assert_eq!(parent.find(&Method::GET, "/users/9").unwrap().params().get("id"), Some("9"));
        assert!(parent.find(&Method::GET, "/users/late").unwrap().route().path() == "/users/:id");
        assert_eq!(sub.len(), 3);
    }

    #[test]
    fn test_invalid_route_is_not_added() {
        let mut table: RouteTable<(), ()> = RouteTable::new();
        assert!(table.add_route(get_method(), "/a/:x(", chain()).is_err());
        assert!(table.is_empty());
    }
}
