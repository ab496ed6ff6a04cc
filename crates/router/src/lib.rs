//! A request routing and middleware dispatch core.
//!
//! Routes pair a method filter and a path pattern with an ordered list of
//! handlers. Patterns support named segments (`:id`), regex constrained segments
//! (`:id(\d+)`) and a trailing wildcard (`*`). Lookup scans routes in
//! registration order and the first match wins.
//!
//! Every handler receives the request plus an environment and an execution
//! context owned by the host, and either answers with a response or lets the
//! request continue to the next handler.
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use micro_router::{Flow, HandlerResult, RequestContext, Router, handler_fn};
//!
//! async fn show_user(req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     Ok(Flow::respond(format!("user {id}")))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router: Router = Router::builder().get(r"/users/:id(\d+)", handler_fn(show_user)).build().unwrap();
//!
//! let request = Request::get("/users/7").body(Bytes::new()).unwrap();
//! let response = router.handle(request, &(), &()).await.unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let request = Request::get("/users/me").body(Bytes::new()).unwrap();
//! let response = router.handle(request, &(), &()).await.unwrap();
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! # }
//! ```

mod body;
mod error;
mod fn_trait;
mod handler;
mod request;
mod responder;

pub mod middleware;
pub mod router;

pub use body::ResponseBody;
pub use error::{DispatchError, HandlerError, HandlerPanic, PatternError, RouterError};
pub use fn_trait::{ErrorHandlerFn, HandlerFn};
pub use handler::{
    ErrorHandler, Flow, FnErrorHandler, FnHandler, HandlerChain, HandlerResult, RequestHandler, error_handler_fn,
    handler_fn,
};
pub use request::{ExtractError, PathParams, QueryParams, RequestContext};
pub use responder::{Json, Responder};
pub use router::{Router, RouterBuilder};
