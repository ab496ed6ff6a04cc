use crate::handler::{Flow, HandlerResult, RequestHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use tracing::info;

/// Logs every request it sees and lets it through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

#[async_trait]
impl<E: Sync, C: Sync> RequestHandler<E, C> for Logger {
    async fn invoke(&self, req: &mut RequestContext, _env: &E, _ctx: &C) -> HandlerResult {
        info!(method = %req.method(), path = req.path(), params = ?req.path_params(), "incoming request");
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request;

    #[tokio::test]
    async fn test_logger_continues() {
        let (head, body) = Request::get("/users/1").body(Bytes::new()).unwrap().into_parts();
        let mut req = RequestContext::new(head, body);

        let flow = Logger.invoke(&mut req, &(), &()).await.unwrap();
        assert!(flow.is_continue());
    }
}
