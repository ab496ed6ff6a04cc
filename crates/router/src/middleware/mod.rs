//! Ready made handlers to plug into a router.
//!
//! They are ordinary [`RequestHandler`](crate::RequestHandler)s: register them as
//! global middleware, group middleware or inline in a route's handler chain.

mod logger;
mod rate_limit;
mod timeout;

pub use logger::Logger;
pub use rate_limit::{Counter, CounterStore, MemoryCounterStore, RateLimit};
pub use timeout::{Timeout, TimeoutError};
