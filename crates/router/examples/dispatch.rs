use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use micro_router::middleware::{Logger, MemoryCounterStore, RateLimit, Timeout};
use micro_router::{
    Flow, HandlerChain, HandlerError, HandlerResult, Json, RequestContext, Router, error_handler_fn, handler_fn,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

struct AppEnv {
    service: &'static str,
}

#[derive(Serialize)]
struct User {
    id: u64,
    service: &'static str,
}

async fn list_users(_req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    Ok(Flow::respond("alice, bob"))
}

async fn show_user(req: &mut RequestContext, env: &AppEnv, _ctx: &()) -> HandlerResult {
    let id = req.param("id").unwrap_or_default().parse()?;
    Ok(Flow::respond(Json(User { id, service: env.service })))
}

async fn search(req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    let q = req.query().get("q").unwrap_or_default().to_string();
    Ok(Flow::respond(format!("searching for '{q}'")))
}

async fn require_token(req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    if req.headers().contains_key(http::header::AUTHORIZATION) {
        return Ok(Flow::Continue);
    }
    Ok(Flow::respond((StatusCode::UNAUTHORIZED, "missing token")))
}

async fn slow_report(_req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Ok(Flow::respond("report"))
}

async fn not_found(req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    Ok(Flow::respond((StatusCode::NOT_FOUND, format!("nothing at {}", req.path()))))
}

async fn on_error(err: HandlerError, _req: &mut RequestContext, _env: &AppEnv, _ctx: &()) -> HandlerResult {
    Ok(Flow::respond((StatusCode::INTERNAL_SERVER_ERROR, format!("failed: {err}"))))
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let users = Router::builder().get("/", handler_fn(list_users)).get(r"/:id(\d+)", handler_fn(show_user));

    let router = match Router::builder()
        .middleware(Logger)
        .middleware(RateLimit::new(MemoryCounterStore::new(Duration::from_secs(60)), 100))
        .mount("/users", &users)
        .get("/search", handler_fn(search))
        .group("/admin", |admin| {
            admin.middleware(handler_fn(require_token));
            admin.route(
                Method::GET,
                "/report",
                HandlerChain::new().then(Timeout::new(handler_fn(slow_report), Duration::from_millis(100))),
            );
        })
        .not_found(handler_fn(not_found))
        .on_error(error_handler_fn(on_error))
        .build()
    {
        Ok(router) => router,
        Err(e) => {
            error!(cause = %e, "invalid router");
            return;
        }
    };

    let env = AppEnv { service: "dispatch-demo" };
    let requests = [
        Request::get("/users/").body(Bytes::new()),
        Request::get("/users/42").body(Bytes::new()),
        Request::get("/users/abc").body(Bytes::new()),
        Request::get("/search?q=rust&page=2").body(Bytes::new()),
        Request::get("/admin/report").body(Bytes::new()),
        Request::get("/admin/report").header(http::header::AUTHORIZATION, "Bearer demo").body(Bytes::new()),
    ];

    for request in requests {
        let request = request.expect("valid request");
        let path = request.uri().to_string();
        match router.handle(request, &env, &()).await {
            Ok(response) => {
                let status = response.status();
                let body = response.into_body().collect().await.map(|body| body.to_bytes()).unwrap_or_default();
                info!(%path, %status, body = %String::from_utf8_lossy(&body), "dispatched");
            }
            Err(e) => error!(%path, cause = %e, "dispatch failed"),
        }
    }
}
