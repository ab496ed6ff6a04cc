use crate::handler::{HandlerResult, RequestHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// The wrapped handler did not finish in time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("handler timed out after {duration:?}")]
pub struct TimeoutError {
    duration: Duration,
}

impl TimeoutError {
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Bounds the running time of one handler.
///
/// When `inner` does not finish within `duration` it is dropped and the wrapper
/// fails with [`TimeoutError`], sending the request down the error path.
#[derive(Debug)]
pub struct Timeout<H> {
    inner: H,
    duration: Duration,
}

impl<H> Timeout<H> {
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

#[async_trait]
impl<H, E, C> RequestHandler<E, C> for Timeout<H>
where
    H: RequestHandler<E, C>,
    E: Sync,
    C: Sync,
{
    async fn invoke(&self, req: &mut RequestContext, env: &E, ctx: &C) -> HandlerResult {
        match tokio::time::timeout(self.duration, self.inner.invoke(req, env, ctx)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(duration = ?self.duration, "handler timed out");
                Err(TimeoutError { duration: self.duration }.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Flow, handler_fn};
    use bytes::Bytes;
    use http::Request;

    async fn slow(_req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Flow::respond("slow"))
    }

    async fn fast(_req: &mut RequestContext, _env: &(), _ctx: &()) -> HandlerResult {
        Ok(Flow::respond("fast"))
    }

    fn request() -> RequestContext {
        let (head, body) = Request::get("/").body(Bytes::new()).unwrap().into_parts();
        RequestContext::new(head, body)
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_handler_times_out() {
        let handler = Timeout::new(handler_fn(slow), Duration::from_secs(1));

        let err = handler.invoke(&mut request(), &(), &()).await.unwrap_err();
        let timeout = err.downcast_ref::<TimeoutError>().unwrap();
        assert_eq!(timeout.duration(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_handler_passes_through() {
        let handler = Timeout::new(handler_fn(fast), Duration::from_secs(1));

        let flow = handler.invoke(&mut request(), &(), &()).await.unwrap();
        assert!(!flow.is_continue());
    }
}
