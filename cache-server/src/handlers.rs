//! Route handlers
//!
//! Each handler deserializes its request, validates what the core doesn't
//! (missing fields, non-numeric scores), takes the cache lock for the
//! duration of one call, and serializes the result. `cache_core::Error`
//! reaching a handler becomes [`crate::ApiError`], surfaced as HTTP 400.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::{ApiResult, AppState};

#[derive(Serialize)]
pub struct HealthBody {
    ok: bool,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { ok: true })
}

#[derive(Deserialize)]
pub struct SetRequest {
    key: String,
    value: String,
    /// Milliseconds until expiration; absent means no TTL
    px: Option<u64>,
}

#[derive(Serialize)]
pub struct OkBody {
    ok: bool,
}

pub async fn set(State(state): State<AppState>, Json(req): Json<SetRequest>) -> ApiResult<OkBody> {
    state.cache.lock().set(req.key, req.value.into_bytes(), req.px);
    Ok(Json(OkBody { ok: true }))
}

#[derive(Deserialize)]
pub struct GetQuery {
    key: String,
}

#[derive(Serialize)]
pub struct GetBody {
    value: Option<String>,
}

pub async fn get_key(
    State(state): State<AppState>,
    Query(q): Query<GetQuery>,
) -> ApiResult<GetBody> {
    let value = state.cache.lock().get(&q.key)?;
    let value = value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    Ok(Json(GetBody { value }))
}

#[derive(Deserialize)]
pub struct DelRequest {
    key: String,
}

#[derive(Serialize)]
pub struct DeletedBody {
    deleted: u64,
}

pub async fn del(
    State(state): State<AppState>,
    Json(req): Json<DelRequest>,
) -> Json<DeletedBody> {
    let deleted = state.cache.lock().del(&req.key);
    Json(DeletedBody { deleted })
}

#[derive(Deserialize)]
pub struct ZaddRequest {
    key: String,
    score: f64,
    member: String,
}

#[derive(Serialize)]
pub struct AddedBody {
    added: u64,
}

pub async fn zadd(
    State(state): State<AppState>,
    Json(req): Json<ZaddRequest>,
) -> ApiResult<AddedBody> {
    let added = state.cache.lock().zadd(&req.key, req.score, req.member)?;
    Ok(Json(AddedBody { added }))
}

#[derive(Deserialize)]
pub struct ZremRequest {
    key: String,
    member: String,
}

#[derive(Serialize)]
pub struct RemovedBody {
    removed: u64,
}

pub async fn zrem(
    State(state): State<AppState>,
    Json(req): Json<ZremRequest>,
) -> ApiResult<RemovedBody> {
    let removed = state.cache.lock().zrem(&req.key, &req.member)?;
    Ok(Json(RemovedBody { removed: u64::from(removed) }))
}

#[derive(Deserialize)]
pub struct ZscoreQuery {
    key: String,
    member: String,
}

#[derive(Serialize)]
pub struct ScoreBody {
    score: Option<f64>,
}

pub async fn zscore(
    State(state): State<AppState>,
    Query(q): Query<ZscoreQuery>,
) -> ApiResult<ScoreBody> {
    let score = state.cache.lock().zscore(&q.key, &q.member)?;
    Ok(Json(ScoreBody { score }))
}

#[derive(Deserialize)]
pub struct ZrangeByScoreQuery {
    key: String,
    min: f64,
    max: f64,
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ItemsBody {
    items: Vec<(String, f64)>,
}

pub async fn zrange_by_score(
    State(state): State<AppState>,
    Query(q): Query<ZrangeByScoreQuery>,
) -> ApiResult<ItemsBody> {
    let items = state.cache.lock().zrange_by_score(&q.key, q.min, q.max, q.limit)?;
    Ok(Json(ItemsBody { items }))
}

#[derive(Deserialize)]
pub struct SaddRequest {
    key: String,
    members: Vec<String>,
}

pub async fn sadd(
    State(state): State<AppState>,
    Json(req): Json<SaddRequest>,
) -> ApiResult<AddedBody> {
    let added = state.cache.lock().sadd(&req.key, req.members)?;
    Ok(Json(AddedBody { added }))
}

#[derive(Deserialize)]
pub struct SmembersQuery {
    key: String,
}

#[derive(Serialize)]
pub struct MembersBody {
    members: Vec<String>,
}

pub async fn smembers(
    State(state): State<AppState>,
    Query(q): Query<SmembersQuery>,
) -> ApiResult<MembersBody> {
    let members = state.cache.lock().smembers(&q.key)?;
    Ok(Json(MembersBody { members }))
}

#[derive(Serialize)]
pub struct StatsBody {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    operations: u64,
    key_count: usize,
    memory_used: usize,
    hit_rate: f64,
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsBody> {
    let snapshot = state.cache.lock().get_stats();
    Json(StatsBody {
        hits: snapshot.hits,
        misses: snapshot.misses,
        evictions: snapshot.evictions,
        expirations: snapshot.expirations,
        operations: snapshot.operations,
        key_count: snapshot.key_count,
        memory_used: snapshot.memory_used,
        hit_rate: snapshot.hit_rate,
    })
}
