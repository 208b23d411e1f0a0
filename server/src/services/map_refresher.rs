use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use frontlines_shared::render::fingerprint_bytes;
use frontlines_shared::{
    CampaignTables, MapEvent, MapRender, Outcome, RosterSummary, TableKind, render_all,
    swatch_format,
};
use tracing::{debug, info, warn};

use crate::state::{AppState, CachedRender, LiveRenders, PreSerializedEvent, RosterSwatch};
use crate::store::TableError;

/// What a refresh changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub seq: u64,
    pub changed_maps: Vec<String>,
}

/// Polls the table files and re-renders whenever they change on disk.
pub async fn run(state: AppState, poll_interval: Duration) {
    info!(
        dir = %state.store.dir().display(),
        "Table watcher started (interval: {}s)",
        poll_interval.as_secs()
    );

    let mut interval = tokio::time::interval(poll_interval);
    loop {
        interval.tick().await;

        if !tables_changed(&state).await {
            continue;
        }
        if let Err(e) = refresh(&state).await {
            warn!(error = %e, "table reload failed; keeping previous renders");
        }
    }
}

/// Whether the table files differ from the ones the live renders were built from.
async fn tables_changed(state: &AppState) -> bool {
    let revision = state.store.revision().await;
    let live = state.live.read().await;
    live.maps.is_empty() || live.revision != revision
}

/// The host's "a table was edited" hook. Every mutation re-renders from the full tables.
pub async fn on_table_mutation(
    state: &AppState,
    table: TableKind,
) -> Result<RefreshOutcome, TableError> {
    debug!(%table, "table mutated");
    refresh(state).await
}

/// Reload every table, re-render every map, swap the live renders and broadcast what changed.
pub async fn refresh(state: &AppState) -> Result<RefreshOutcome, TableError> {
    let _guard = state.refresh_lock.lock().await;

    let revision = state.store.revision().await;
    let tables = match state.store.load().await {
        Ok(tables) => tables,
        Err(e) => {
            state.observability.record_refresh_failure();
            return Err(e);
        }
    };
    state.observability.record_refresh();

    let skipped = unresolvable_results(&state.campaign.map_ids().collect::<Vec<_>>(), &tables);
    if skipped > 0 {
        debug!(skipped, "results without a winner or territory were ignored");
    }

    let renders = render_all(&state.campaign, &tables);
    let previous: HashMap<String, u32> = {
        let live = state.live.read().await;
        live.maps
            .iter()
            .map(|(id, cached)| (id.clone(), cached.fingerprint))
            .collect()
    };
    let first_load = previous.is_empty();

    let timestamp = Utc::now().to_rfc3339();
    let mut seq = state.next_seq.load(Ordering::Relaxed);
    let mut cached_maps = HashMap::new();
    let mut outgoing = Vec::new();
    let mut changed_maps = Vec::new();

    for render in &renders {
        let Some(cached) = cache_render(render) else {
            continue;
        };
        if previous.get(&render.map) != Some(&cached.fingerprint) {
            changed_maps.push(render.map.clone());
            if !first_load {
                seq += 1;
                if let Some(json) = serialize_event(&MapEvent::Update {
                    seq,
                    map: render.clone(),
                    timestamp: timestamp.clone(),
                }) {
                    outgoing.push(PreSerializedEvent::Update { seq, json });
                }
            }
        }
        cached_maps.insert(render.map.clone(), cached);
    }

    if first_load {
        seq += 1;
    }
    let snapshot_json = serialize_event(&MapEvent::Snapshot {
        seq,
        maps: renders.clone(),
        timestamp: timestamp.clone(),
    })
    .unwrap_or_else(|| Arc::new(Bytes::new()));
    if first_load && !snapshot_json.is_empty() {
        outgoing.push(PreSerializedEvent::Snapshot {
            seq,
            json: Arc::clone(&snapshot_json),
        });
    }

    let directory = tables.player_directory();
    {
        let mut live = state.live.write().await;
        *live = LiveRenders {
            seq,
            timestamp,
            maps: cached_maps,
            roster: RosterSummary::from_directory(&directory, &state.campaign),
            roster_swatches: roster_swatches(&tables),
            player_names: tables.player_names(),
            snapshot_json,
            revision,
        };
    }
    state.next_seq.store(seq, Ordering::Relaxed);

    if !changed_maps.is_empty() {
        info!(
            seq,
            maps = ?changed_maps,
            results = tables.results.len(),
            players = directory.len(),
            "map renders updated"
        );
    }

    let sent = outgoing.len() as u64;
    for event in outgoing {
        // No subscribers is fine.
        let _ = state.event_tx.send(event);
    }
    state.observability.record_broadcast_events(sent);

    Ok(RefreshOutcome { seq, changed_maps })
}

fn cache_render(render: &MapRender) -> Option<CachedRender> {
    match serde_json::to_vec(render) {
        Ok(json) => Some(CachedRender {
            fingerprint: fingerprint_bytes(&json),
            json: Arc::new(Bytes::from(json)),
            render: render.clone(),
        }),
        Err(e) => {
            warn!(map = %render.map, error = %e, "failed to serialize map render");
            None
        }
    }
}

fn serialize_event(event: &MapEvent) -> Option<Arc<Bytes>> {
    match serde_json::to_vec(event) {
        Ok(json) => Some(Arc::new(Bytes::from(json))),
        Err(e) => {
            warn!(
                seq = event.seq(),
                event = event.kind(),
                error = %e,
                "failed to serialize map event"
            );
            None
        }
    }
}

fn roster_swatches(tables: &CampaignTables) -> Vec<RosterSwatch> {
    tables
        .roster
        .iter()
        .filter(|row| !row.name.is_empty())
        .map(|row| RosterSwatch {
            name: row.name.clone(),
            color: row.color.clone(),
            format: swatch_format(&row.color),
        })
        .collect()
}

/// Non-draw results on a known map that claim nothing.
fn unresolvable_results(map_ids: &[&str], tables: &CampaignTables) -> usize {
    tables
        .results
        .iter()
        .filter(|result| map_ids.contains(&result.map.as_str()))
        .filter(|result| result.outcome != Outcome::Draw)
        .filter(|result| result.winner().is_none() || result.claimed_label().is_none())
        .count()
}
