//! HTTP/JSON front end for the cache
//!
//! A thin collaborator: every route deserializes its request, takes the
//! shared cache lock, calls straight into `cache_engine::Cache`, and
//! serializes the result. The core crate knows nothing about HTTP; this
//! binary is the only place that does.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cache_engine::{Cache, CacheConfig};
use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod handlers;

use handlers::*;

/// Default port when `CACHE_PORT` is unset
const DEFAULT_PORT: u16 = 7379;

#[derive(Parser, Debug)]
#[command(about = "HTTP/JSON server for the in-process cache")]
struct Args {
    /// Port to listen on; overrides CACHE_PORT
    #[arg(long)]
    port: Option<u16>,
}

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    cache: Arc<Mutex<Cache>>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let port = args
        .port
        .or_else(|| std::env::var("CACHE_PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    let cache = Arc::new(Mutex::new(Cache::new(CacheConfig::default())));
    let _background_timers = spawn_background_tasks(Arc::clone(&cache));

    let state = AppState { cache };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/set", post(set))
        .route("/get", get(get_key))
        .route("/del", post(del))
        .route("/zadd", post(zadd))
        .route("/zrem", post(zrem))
        .route("/zscore", get(zscore))
        .route("/zrangeByScore", get(zrange_by_score))
        .route("/sadd", post(sadd))
        .route("/smembers", get(smembers))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Starts the two cooperative background loops (active TTL expiration, LFU
/// decay) against the shared lock, matching the coordinator's contract that
/// it never spawns threads itself. The caller must keep the returned
/// handles alive for as long as the loops should keep running; dropping
/// them stops the corresponding thread.
fn spawn_background_tasks(
    cache: Arc<Mutex<Cache>>,
) -> (cache_engine::BackgroundTimer, cache_engine::BackgroundTimer) {
    let (active_expire_interval, decay_interval) = {
        let guard = cache.lock();
        let config = guard.config();
        (
            Duration::from_millis(config.active_expire_interval_ms),
            Duration::from_millis(config.lfu_decay_interval_ms),
        )
    };

    let active_expire_cache = Arc::clone(&cache);
    let active_expire_timer = cache_engine::BackgroundTimer::spawn(active_expire_interval, move || {
        active_expire_cache.lock().run_active_expire_round();
    });

    let lfu_decay_timer = cache_engine::BackgroundTimer::spawn(decay_interval, move || {
        cache.lock().run_lfu_decay_round();
    });

    (active_expire_timer, lfu_decay_timer)
}

/// Wraps a `cache_core::Error` as the HTTP 400 the route table mandates for WRONGTYPE
pub struct ApiError(cache_core::Error);

impl From<cache_core::Error> for ApiError {
    fn from(err: cache_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.0.to_string() };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
