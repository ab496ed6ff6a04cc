//! Error types of the routing and dispatch core.
//!
//! Three kinds of failure exist around a router:
//! - compile failures while registering routes ([`PatternError`], reported by
//!   [`RouterBuilder::build`](crate::router::RouterBuilder::build) as [`RouterError`])
//! - handler failures while dispatching, which are boxed as [`HandlerError`] and
//!   converted into a response by the error path
//! - failures of the fallback handlers themselves ([`DispatchError`]), which are
//!   not recovered and surface from [`Router::handle`](crate::Router::handle)

use std::any::Any;
use std::error::Error;
use thiserror::Error;

/// The error any handler may fail with.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("constraint of param '{param}' is not closed")]
    UnclosedConstraint { param: String },

    #[error("param '{name}' appears more than once")]
    DuplicateParam { name: String },

    #[error("invalid regex: {source}")]
    Regex {
        #[from]
        source: regex::Error,
    },
}

#[derive(Error, Debug, Clone)]
pub enum RouterError {
    #[error("invalid route '{path}': {source}")]
    InvalidRoute { path: String, source: PatternError },
}

impl RouterError {
    pub fn invalid_route<S: ToString>(path: S, source: PatternError) -> Self {
        Self::InvalidRoute { path: path.to_string(), source }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("not found handler failed: {source}")]
    NotFoundHandler { source: HandlerError },

    #[error("error handler failed: {source}")]
    ErrorHandler { source: HandlerError },
}

/// A handler panicked while being invoked.
#[derive(Error, Debug)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    message: String,
}

impl HandlerPanic {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Box<dyn Any + Send>> for HandlerPanic {
    fn from(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(HandlerPanic::from(payload).message(), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(HandlerPanic::from(payload).message(), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(HandlerPanic::from(payload).message(), "unknown panic");
    }

    #[test]
    fn router_error_display() {
        let err = RouterError::invalid_route("/a/:id", PatternError::DuplicateParam { name: "id".into() });
        assert_eq!(err.to_string(), "invalid route '/a/:id': param 'id' appears more than once");
    }
}
