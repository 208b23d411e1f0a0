use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use frontlines_shared::{
    MapDefinition, MatchResult, Outcome, SwatchFormat, TableKind, normalize_territory,
    swatch_format,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::services::map_refresher;
use crate::state::{AppState, ObservabilitySnapshot, RosterSwatch};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const MAP_CACHE_CONTROL: &str = "public, max-age=5";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (seq, rendered_maps) = {
        let live = state.live.read().await;
        (live.seq, live.maps.len())
    };
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "seq": seq,
        "maps": rendered_maps,
        "data_dir": state.store.dir().display().to_string(),
        "observability": {
            "map_requests_total": observability.map_requests_total,
            "refreshes_total": observability.refreshes_total,
            "refresh_failures_total": observability.refresh_failures_total,
            "results_appended_total": observability.results_appended_total,
            "results_rejected_total": observability.results_rejected_total,
            "broadcast_events_total": observability.broadcast_events_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (seq, rendered_maps) = {
        let live = state.live.read().await;
        (live.seq, live.maps.len())
    };
    let body = render_prometheus_metrics(rendered_maps, seq, state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP frontlines_{name} {help}");
    let _ = writeln!(body, "# TYPE frontlines_{name} {kind}");
    let _ = writeln!(body, "frontlines_{name} {value}");
}

fn render_prometheus_metrics(
    rendered_maps: usize,
    seq: u64,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "rendered_maps",
        "gauge",
        "Maps currently held in the live render cache.",
        rendered_maps as u64,
    );
    write_metric(
        &mut body,
        "event_seq",
        "gauge",
        "Sequence number of the latest map event.",
        seq,
    );
    write_metric(
        &mut body,
        "map_requests_total",
        "counter",
        "Total /api/maps/{map} requests.",
        observability.map_requests_total,
    );
    write_metric(
        &mut body,
        "refreshes_total",
        "counter",
        "Total successful table reloads.",
        observability.refreshes_total,
    );
    write_metric(
        &mut body,
        "refresh_failures_total",
        "counter",
        "Total table reloads that failed and kept the previous renders.",
        observability.refresh_failures_total,
    );
    write_metric(
        &mut body,
        "results_appended_total",
        "counter",
        "Total match results appended through the API.",
        observability.results_appended_total,
    );
    write_metric(
        &mut body,
        "results_rejected_total",
        "counter",
        "Total match results rejected at validation.",
        observability.results_rejected_total,
    );
    write_metric(
        &mut body,
        "broadcast_events_total",
        "counter",
        "Total map events sent to SSE subscribers.",
        observability.broadcast_events_total,
    );
    body
}

pub async fn list_maps(State(state): State<AppState>) -> Json<Vec<MapDefinition>> {
    Json(state.campaign.maps.clone())
}

/// Serve the cached render bytes for one map.
pub async fn get_map(
    State(state): State<AppState>,
    Path(map): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    state.observability.record_map_request();
    let (etag, json): (String, Arc<Bytes>) = {
        let live = state.live.read().await;
        let cached = live.maps.get(&map).ok_or_else(|| missing_map_status(&state, &map))?;
        (cached.etag(), Arc::clone(&cached.json))
    };

    if if_none_match_matches(&headers, &etag) {
        return Ok(not_modified_response(MAP_CACHE_CONTROL, Some(etag.as_str())));
    }

    Ok(json_bytes_response(
        (*json).clone(),
        MAP_CACHE_CONTROL,
        Some(etag.as_str()),
    ))
}

pub async fn get_legend(
    State(state): State<AppState>,
    Path(map): Path<String>,
) -> Result<Response, StatusCode> {
    let live = state.live.read().await;
    let cached = live.maps.get(&map).ok_or_else(|| missing_map_status(&state, &map))?;
    Ok(Json(&cached.render.legend).into_response())
}

/// A configured map that has not rendered yet is unavailable, anything else is unknown.
fn missing_map_status(state: &AppState, map: &str) -> StatusCode {
    if state.campaign.map(map).is_some() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn get_roster(State(state): State<AppState>) -> Response {
    let live = state.live.read().await;
    Json(&live.roster).into_response()
}

#[derive(Serialize)]
struct RosterFormats<'a> {
    formatted: usize,
    entries: &'a [RosterSwatch],
}

pub async fn get_roster_formats(State(state): State<AppState>) -> Response {
    let live = state.live.read().await;
    let formatted = live
        .roster_swatches
        .iter()
        .filter(|swatch| swatch.format.is_some())
        .count();
    Json(RosterFormats {
        formatted,
        entries: &live.roster_swatches,
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct ColorCell {
    #[serde(default)]
    pub color: String,
}

pub async fn post_roster_format(Json(cell): Json<ColorCell>) -> Json<Option<SwatchFormat>> {
    Json(swatch_format(&cell.color))
}

#[derive(Serialize)]
struct ResultOptions<'a> {
    players: &'a [String],
    outcomes: Vec<&'static str>,
    maps: Vec<&'a str>,
}

pub async fn get_result_options(State(state): State<AppState>) -> Response {
    let live = state.live.read().await;
    Json(ResultOptions {
        players: &live.player_names,
        outcomes: Outcome::RECOGNIZED.iter().map(|o| o.label()).collect(),
        maps: state.campaign.map_ids().collect(),
    })
    .into_response()
}

/// A result as submitted for entry. The outcome stays a string until validated.
#[derive(Debug, Deserialize)]
pub struct ResultSubmission {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub player1: String,
    #[serde(default)]
    pub player2: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub claimed_territory: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResultRejection {
    #[error("unknown map {0:?}")]
    UnknownMap(String),
    #[error("unrecognized result {0:?}; expected one of P1 Win, P2 Win, Draw")]
    UnrecognizedOutcome(String),
    #[error("both players must be named")]
    MissingPlayer,
    #[error("a decisive result must claim a territory")]
    MissingTerritory,
    #[error("territory {0:?} is not on the grid")]
    OffGridTerritory(String),
}

impl IntoResponse for ResultRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

fn validate_submission(
    state: &AppState,
    submission: ResultSubmission,
) -> Result<MatchResult, ResultRejection> {
    let map = submission.map.trim();
    if state.campaign.map(map).is_none() {
        return Err(ResultRejection::UnknownMap(submission.map));
    }

    let label = submission.result.trim();
    let outcome = Outcome::RECOGNIZED
        .into_iter()
        .find(|outcome| outcome.label() == label)
        .ok_or_else(|| ResultRejection::UnrecognizedOutcome(submission.result.clone()))?;

    // Names are roster keys and are stored as submitted.
    if submission.player1.trim().is_empty() || submission.player2.trim().is_empty() {
        return Err(ResultRejection::MissingPlayer);
    }

    let claimed = submission
        .claimed_territory
        .as_deref()
        .map(normalize_territory)
        .filter(|label| !label.is_empty());
    if outcome != Outcome::Draw {
        let Some(label) = claimed.as_deref() else {
            return Err(ResultRejection::MissingTerritory);
        };
        if !state.campaign.grid.contains_label(label) {
            return Err(ResultRejection::OffGridTerritory(label.to_string()));
        }
    }

    let date = match submission.date.trim() {
        "" => Utc::now().format("%Y-%m-%d").to_string(),
        date => date.to_string(),
    };

    Ok(MatchResult {
        date,
        player1: submission.player1,
        player2: submission.player2,
        outcome,
        map: map.to_string(),
        claimed_territory: claimed,
        extra: submission.extra,
    })
}

#[derive(Serialize)]
struct Appended {
    position: usize,
    changed_maps: Vec<String>,
}

/// Append a result to the log, then run the mutation hook so renders and SSE clients catch up.
pub async fn post_result(
    State(state): State<AppState>,
    Json(submission): Json<ResultSubmission>,
) -> Response {
    let result = match validate_submission(&state, submission) {
        Ok(result) => result,
        Err(rejection) => {
            state.observability.record_result_rejected();
            info!(reason = %rejection, "rejected match result");
            return rejection.into_response();
        }
    };

    let position = match state.store.append_result(&result).await {
        Ok(position) => position,
        Err(e) => {
            error!(error = %e, "failed to append match result");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    state.observability.record_result_appended();

    let changed_maps = match map_refresher::on_table_mutation(&state, TableKind::Results).await {
        Ok(outcome) => outcome.changed_maps,
        Err(e) => {
            warn!(error = %e, "result appended but re-render failed");
            Vec::new()
        }
    };

    (
        StatusCode::CREATED,
        Json(Appended {
            position,
            changed_maps,
        }),
    )
        .into_response()
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
