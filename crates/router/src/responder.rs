//! Response handling module that converts handler values into HTTP responses.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! can be converted into HTTP responses. Handlers short-circuit the chain with
//! [`Flow::respond`](crate::Flow::respond), which accepts any [`Responder`].

use crate::body::ResponseBody;
use crate::request::ExtractError;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;

/// A trait for types that can be converted into HTTP responses.
pub trait Responder {
    fn into_response(self) -> Response<ResponseBody>;
}

/// Serializes the wrapped value as an `application/json` response.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

fn with_content_type(body: ResponseBody, content_type: &Mime) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// Implementation for Result allows handlers to build responses from fallible code.
/// The Ok and Err variants must both implement Responder.
impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Implementation for Response allows passing through pre-built responses.
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn into_response(self) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

/// Implementation for (StatusCode, T) tuple allows setting a status code
/// along with the response content.
impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.into_response();
        *response.status_mut() = status;
        response
    }
}

impl Responder for () {
    fn into_response(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn into_response(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl<T: Serialize> Responder for Json<T> {
    fn into_response(self) -> Response<ResponseBody> {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => with_content_type(ResponseBody::from(bytes), &mime::APPLICATION_JSON),
            Err(e) => {
                error!(cause = %e, "serialize json response error");
                (StatusCode::INTERNAL_SERVER_ERROR, ()).into_response()
            }
        }
    }
}

impl Responder for ExtractError {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            ExtractError::BodyConsumed => (StatusCode::BAD_REQUEST, "body has been consumed").into_response(),
            ExtractError::Query { .. } => (StatusCode::BAD_REQUEST, "invalid query string").into_response(),
            ExtractError::Form { .. } => (StatusCode::BAD_REQUEST, "invalid form data").into_response(),
            ExtractError::Json { .. } => (StatusCode::BAD_REQUEST, "invalid json").into_response(),
        }
    }
}

impl Responder for Infallible {
    fn into_response(self) -> Response<ResponseBody> {
        match self {}
    }
}
