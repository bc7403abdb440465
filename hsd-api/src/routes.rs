//! Update-feed and query endpoints, §6.

use crate::errors::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use hsd_core::{BenchmarkRecord, Host, Network, PublicKey, ScanRecord};
use hsd_journal::UpdateId;
use hsd_store::{ListFilters, RecordFilters};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

fn parse_network(raw: Option<&str>) -> Result<Option<Network>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => Network::from_str(s)
            .map(Some)
            .map_err(|_| ApiError::UnknownNetwork(s.to_string())),
    }
}

fn parse_public_key(raw: &str) -> Result<PublicKey, ApiError> {
    PublicKey::from_hex(raw).map_err(|e| ApiError::Internal(e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct UpdatesResponse {
    pub id: String,
    pub hosts: Vec<Host>,
    pub scans: Vec<ScanRecord>,
    pub benchmarks: Vec<BenchmarkRecord>,
}

/// `GET /hostdb/updates`: an empty response (all three lists empty) is
/// valid when nothing is pending, §6.
pub async fn get_updates(State(state): State<AppState>) -> Json<UpdatesResponse> {
    let (id, batch) = state.journal.take();
    Json(UpdatesResponse {
        id: hex::encode(id.0),
        hosts: batch.hosts,
        scans: batch.scans,
        benchmarks: batch.benchmarks,
    })
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub id: String,
}

/// `GET /hostdb/updates/confirm?id=...`
pub async fn confirm_update(State(state): State<AppState>, Query(q): Query<ConfirmQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let bytes = hex::decode(&q.id).map_err(|e| ApiError::Internal(e.to_string()))?;
    if bytes.len() != 16 {
        return Err(ApiError::Internal("update id must be 16 bytes".into()));
    }
    let mut id = [0u8; 16];
    id.copy_from_slice(&bytes);
    state.journal.confirm(UpdateId(id));
    Ok(Json(serde_json::json!({ "confirmed": true })))
}

#[derive(Debug, Deserialize)]
pub struct HostsQuery {
    pub network: Option<String>,
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
    pub query: Option<String>,
}

/// `GET /hostdb/hosts?network&all&offset&limit&query`, stable sort key
/// `(rank, public_key)` — `list` already sorts by `(score desc,
/// public_key)`, which is the daemon's rank ordering, §6.
pub async fn get_hosts(State(state): State<AppState>, Query(q): Query<HostsQuery>) -> Result<Json<Vec<Host>>, ApiError> {
    let network = parse_network(q.network.as_deref())?;
    let filters = ListFilters {
        network,
        include_blocked: q.all,
        query: q.query,
        offset: q.offset,
        limit: q.limit.unwrap_or(100),
    };
    Ok(Json(state.store.list(&filters).await))
}

#[derive(Debug, Deserialize)]
pub struct HostQuery {
    pub network: String,
    pub publickey: String,
}

/// `GET /hostdb/host?network&publickey`
pub async fn get_host(State(state): State<AppState>, Query(q): Query<HostQuery>) -> Result<Json<Option<Host>>, ApiError> {
    let network = parse_network(Some(&q.network))?.expect("parse_network(Some) always yields Some");
    let pk = parse_public_key(&q.publickey)?;
    Ok(Json(state.store.get(network, pk).await))
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub network: String,
    pub publickey: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

fn records_filters(q: &RecordsQuery) -> Result<RecordFilters, ApiError> {
    let network = parse_network(Some(&q.network))?.expect("parse_network(Some) always yields Some");
    let public_key = parse_public_key(&q.publickey)?;
    Ok(RecordFilters {
        network,
        public_key,
        from: q.from,
        to: q.to,
        limit: q.limit.unwrap_or(100),
    })
}

/// `GET /hostdb/scans?network&publickey&from&to`
pub async fn get_scans(State(state): State<AppState>, Query(q): Query<RecordsQuery>) -> Result<Json<Vec<ScanRecord>>, ApiError> {
    let filters = records_filters(&q)?;
    state
        .store
        .list_scans(&filters)
        .await
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /hostdb/benchmarks?network&publickey&from&to`
pub async fn get_benchmarks(State(state): State<AppState>, Query(q): Query<RecordsQuery>) -> Result<Json<Vec<BenchmarkRecord>>, ApiError> {
    let filters = records_filters(&q)?;
    state
        .store
        .list_benchmarks(&filters)
        .await
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}
