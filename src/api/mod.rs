pub mod dto;
pub mod errors;
pub mod handlers;

use std::{
    future::{Future, IntoFuture},
    time::{Duration, Instant},
};

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::oneshot, time};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::store::RecentReader;
use handlers::ApiDoc;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState<R> {
    pub recent: R,
}

/// Build the HTTP router. Requests that take longer than `request_timeout`
/// are answered with `408 Request Timeout`.
pub fn router<R: RecentReader>(recent: R, request_timeout: Duration) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/popularity.html", get(handlers::popularity_page::<R>))
        .route("/chart.js", get(handlers::chart_script::<R>))
        .route("/style.css", get(handlers::stylesheet))
        .route("/api/utilization", get(handlers::get_recent_utilization::<R>))
        .with_state(AppState { recent })
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(middleware::from_fn_with_state(request_timeout, enforce_timeout))
        .layer(middleware::from_fn(log_requests))
}

/// Serve `router` until `shutdown` resolves, then give open connections at
/// most `grace` to finish before returning.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => res?,
        _ = signalled_rx => match time::timeout(grace, &mut server).await {
            Ok(res) => res?,
            Err(_) => warn!(
                grace_secs = grace.as_secs_f64(),
                "Graceful shutdown timed out; dropping open connections"
            ),
        },
    }

    Ok(())
}

async fn enforce_timeout(State(limit): State<Duration>, req: Request, next: Next) -> Response {
    match time::timeout(limit, next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => StatusCode::REQUEST_TIMEOUT.into_response(),
    }
}

/// Log method, URI, status and latency of every request.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let resp = next.run(req).await;

    info!(
        method = %method,
        uri = %uri,
        status = resp.status().as_u16(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Request served"
    );
    resp
}
