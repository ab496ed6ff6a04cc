//! Request handling module that provides access to HTTP request information, path parameters
//! and query parameters.
//!
//! This module contains the core types handed to every handler:
//! - `RequestContext`: the request head and body, augmented with the routing results
//! - `PathParams`: values captured by the matched route pattern
//! - `QueryParams`: the parsed query string

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};
use serde::Deserialize;
use thiserror::Error;

/// Represents the context of an HTTP request while it walks through the handler chain.
///
/// Besides the original request head and body it carries the path parameters of the
/// matched route and the parsed query string. Middleware may pass typed values to
/// later handlers through [`extensions_mut`](RequestContext::extensions_mut).
#[derive(Debug)]
pub struct RequestContext {
    head: Parts,
    body: Option<Bytes>,
    path_params: PathParams,
    query: QueryParams,
}

impl RequestContext {
    /// Creates a new RequestContext from the request head and body, with no params attached
    pub fn new(head: Parts, body: Bytes) -> Self {
        Self { head, body: Some(body), path_params: PathParams::empty(), query: QueryParams::empty() }
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Returns the path of the request URI, the string routes are matched against
    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.head.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.head.extensions
    }

    /// Returns a reference to the path parameters extracted from the request path
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Shortcut for `path_params().get(name)`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Returns the parsed query string
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the request body, `None` once it has been taken
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Takes the request body out of the context; later calls return `None`
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Deserializes the query string into `T`
    pub fn query_as<T>(&self) -> Result<T, ExtractError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let query = self.head.uri.query().unwrap_or_default();
        serde_qs::from_str(query).map_err(ExtractError::from)
    }

    /// Deserializes the body as json into `T`, the body itself stays available
    pub fn json<T>(&self) -> Result<T, ExtractError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = self.body.as_ref().ok_or(ExtractError::BodyConsumed)?;
        serde_json::from_slice::<T>(body).map_err(ExtractError::from)
    }

    /// Deserializes the body as `application/x-www-form-urlencoded` into `T`
    pub fn form<T>(&self) -> Result<T, ExtractError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = self.body.as_ref().ok_or(ExtractError::BodyConsumed)?;
        serde_urlencoded::from_bytes::<T>(body).map_err(ExtractError::from)
    }

    pub(crate) fn set_path_params(&mut self, path_params: PathParams) {
        self.path_params = path_params;
    }

    pub(crate) fn clear_path_params(&mut self) {
        self.path_params = PathParams::empty();
    }

    pub(crate) fn parse_query(&mut self) -> Result<(), ExtractError> {
        self.query = match self.head.uri.query() {
            Some(query) => QueryParams::parse(query)?,
            None => QueryParams::empty(),
        };
        Ok(())
    }
}

/// Values captured from the request path by the matched route.
///
/// Every name declared by the route is present once it matched; a segment that
/// captured nothing yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in the order the names appear in the route
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl From<Vec<(String, String)>> for PathParams {
    fn from(params: Vec<(String, String)>) -> Self {
        Self { params }
    }
}

/// The parsed query string of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parses a raw query string with `application/x-www-form-urlencoded` rules
    pub fn parse(query: &str) -> Result<Self, ExtractError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query)?;
        Ok(Self { pairs })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns the last value given for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().rev().find(|(k, _)| k == key).map(|(_, value)| value.as_str())
    }

    /// Returns every value given for `key`, in query order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("request body has been consumed")]
    BodyConsumed,

    #[error("invalid query string: {source}")]
    Query {
        #[from]
        source: serde_qs::Error,
    },

    #[error("invalid form data: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn context(uri: &str, body: &'static str) -> RequestContext {
        let (head, body) = Request::builder().uri(uri).body(Bytes::from_static(body.as_bytes())).unwrap().into_parts();
        RequestContext::new(head, body)
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct User {
        name: String,
        zip: String,
    }

    #[test]
    fn test_query_params() {
        let mut req = context("/search?q=rust&tag=a&tag=b&empty=", "");
        req.parse_query().unwrap();

        let query = req.query();
        assert_eq!(query.len(), 4);
        assert_eq!(query.get("q"), Some("rust"));
        assert_eq!(query.get("tag"), Some("b"));
        assert_eq!(query.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(query.get("empty"), Some(""));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_query_percent_decoded() {
        let query = QueryParams::parse("name=hello%20world&plus=a+b").unwrap();
        assert_eq!(query.get("name"), Some("hello world"));
        assert_eq!(query.get("plus"), Some("a b"));
    }

    #[test]
    fn test_no_query() {
        let mut req = context("/search", "");
        req.parse_query().unwrap();
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_path_params() {
        let mut req = context("/users/42", "");
        assert!(req.path_params().is_empty());

        req.set_path_params(vec![("id".to_string(), "42".to_string())].into());
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.path_params().iter().collect::<Vec<_>>(), vec![("id", "42")]);

        req.clear_path_params();
        assert_eq!(req.param("id"), None);
    }

    #[test]
    fn test_typed_extract() {
        let req = context("/?name=hello&zip=world", "{\"name\":\"json\",\"zip\":\"1\"}");
        assert_eq!(req.query_as::<User>().unwrap(), User { name: "hello".into(), zip: "world".into() });
        assert_eq!(req.json::<User>().unwrap(), User { name: "json".into(), zip: "1".into() });

        let req = context("/", "name=form&zip=2");
        assert_eq!(req.form::<User>().unwrap(), User { name: "form".into(), zip: "2".into() });
        assert!(matches!(req.json::<User>(), Err(ExtractError::Json { .. })));
    }

    #[test]
    fn test_take_body() {
        let mut req = context("/", "payload");
        assert_eq!(req.take_body(), Some(Bytes::from_static(b"payload")));
        assert_eq!(req.take_body(), None);
        assert!(matches!(req.json::<User>(), Err(ExtractError::BodyConsumed)));
    }
}
