use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use frontlines_shared::{CampaignConfig, MapRender, RosterSummary, SwatchFormat};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::store::{TableRevision, TableStore};

/// Pre-serialized SSE event, serialized once by the refresher and shared by all clients.
#[derive(Debug, Clone)]
pub enum PreSerializedEvent {
    Snapshot { seq: u64, json: Arc<Bytes> },
    Update { seq: u64, json: Arc<Bytes> },
}

/// One rendered map plus its cached payload.
#[derive(Debug, Clone)]
pub struct CachedRender {
    pub render: MapRender,
    pub fingerprint: u32,
    pub json: Arc<Bytes>,
}

impl CachedRender {
    pub fn etag(&self) -> String {
        format!("\"map-{:08x}\"", self.fingerprint)
    }
}

/// Formatting decision for one roster color cell; `format` is `None` for an invalid color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSwatch {
    pub name: String,
    pub color: String,
    pub format: Option<SwatchFormat>,
}

/// Everything the HTTP layer serves, replaced wholesale on each refresh.
#[derive(Debug, Clone)]
pub struct LiveRenders {
    pub seq: u64,
    pub timestamp: String,
    /// Keyed by map id.
    pub maps: HashMap<String, CachedRender>,
    pub roster: RosterSummary,
    pub roster_swatches: Vec<RosterSwatch>,
    pub player_names: Vec<String>,
    pub snapshot_json: Arc<Bytes>,
    /// Table revision the renders were built from.
    pub revision: TableRevision,
}

impl LiveRenders {
    pub fn empty(config: &CampaignConfig) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now().to_rfc3339(),
            maps: HashMap::new(),
            roster: RosterSummary::from_directory(&Default::default(), config),
            roster_swatches: Vec::new(),
            player_names: Vec::new(),
            snapshot_json: Arc::new(Bytes::new()),
            revision: TableRevision::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub campaign: Arc<CampaignConfig>,
    pub store: Arc<TableStore>,
    pub live: Arc<RwLock<LiveRenders>>,
    pub next_seq: Arc<AtomicU64>,
    pub event_tx: broadcast::Sender<PreSerializedEvent>,
    /// Serializes refreshes so two mutations can't interleave partial table reads.
    pub refresh_lock: Arc<Mutex<()>>,
    pub observability: Arc<ObservabilityCounters>,
}

impl AppState {
    pub fn new(campaign: CampaignConfig, store: TableStore, broadcast_buffer: usize) -> Self {
        let (event_tx, _) = broadcast::channel(broadcast_buffer.max(1));
        Self {
            live: Arc::new(RwLock::new(LiveRenders::empty(&campaign))),
            campaign: Arc::new(campaign),
            store: Arc::new(store),
            next_seq: Arc::new(AtomicU64::new(0)),
            event_tx,
            refresh_lock: Arc::new(Mutex::new(())),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    map_requests_total: AtomicU64,
    refreshes_total: AtomicU64,
    refresh_failures_total: AtomicU64,
    results_appended_total: AtomicU64,
    results_rejected_total: AtomicU64,
    broadcast_events_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub map_requests_total: u64,
    pub refreshes_total: u64,
    pub refresh_failures_total: u64,
    pub results_appended_total: u64,
    pub results_rejected_total: u64,
    pub broadcast_events_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            map_requests_total: self.map_requests_total.load(Ordering::Relaxed),
            refreshes_total: self.refreshes_total.load(Ordering::Relaxed),
            refresh_failures_total: self.refresh_failures_total.load(Ordering::Relaxed),
            results_appended_total: self.results_appended_total.load(Ordering::Relaxed),
            results_rejected_total: self.results_rejected_total.load(Ordering::Relaxed),
            broadcast_events_total: self.broadcast_events_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_map_request(&self) {
        self.map_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_appended(&self) {
        self.results_appended_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_rejected(&self) {
        self.results_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_events(&self, count: u64) {
        self.broadcast_events_total
            .fetch_add(count, Ordering::Relaxed);
    }
}
