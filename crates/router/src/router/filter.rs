//! Method filtering for routes.
//!
//! Every route carries a [`MethodFilter`]: either a single HTTP method, or
//! [`MethodFilter::Any`] for routes registered with `all`.
//!
//! # Examples
//!
//! ```
//! use http::Method;
//! use micro_router::router::filter::{any_method, get_method, MethodFilter};
//!
//! assert!(get_method().matches(&Method::GET));
//! assert!(!get_method().matches(&Method::POST));
//! assert!(any_method().matches(&Method::DELETE));
//! assert_eq!(MethodFilter::from(Method::PUT), MethodFilter::Exact(Method::PUT));
//! ```

use http::Method;
use std::fmt;

/// The method part of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Matches every request method.
    Any,
    /// Matches exactly one request method.
    Exact(Method),
}

impl MethodFilter {
    /// Check if the request method matches this filter.
    #[inline]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Exact(expected) => expected == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Exact(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("ANY"),
            MethodFilter::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

/// Creates a filter that matches every request method.
#[inline]
pub fn any_method() -> MethodFilter {
    MethodFilter::Any
}

macro_rules! method_filter {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Creates a filter that matches HTTP ", stringify!($upper_case_method), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter::Exact(Method::$upper_case_method)
        }
    };
}

method_filter!(get_method, GET);
method_filter!(post_method, POST);
method_filter!(put_method, PUT);
method_filter!(delete_method, DELETE);
method_filter!(patch_method, PATCH);
method_filter!(options_method, OPTIONS);
method_filter!(head_method, HEAD);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_method() {
        let filter = post_method();
        assert!(filter.matches(&Method::POST));
        assert!(!filter.matches(&Method::GET));
        assert!(!filter.matches(&Method::HEAD));
    }

    #[test]
    fn test_any_method() {
        let filter = any_method();
        for method in [Method::GET, Method::POST, Method::OPTIONS, Method::TRACE] {
            assert!(filter.matches(&method));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(any_method().to_string(), "ANY");
        assert_eq!(patch_method().to_string(), "PATCH");
    }
}
