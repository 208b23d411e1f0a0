use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::config::SSE_KEEPALIVE_SECS;
use crate::state::{AppState, PreSerializedEvent};

/// Every map on connect, then one `update` per changed map.
pub async fn map_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        // Subscribe before reading the snapshot so no update slips between them.
        let rx = state.event_tx.subscribe();

        if let Some(event) = snapshot_event(&state).await {
            yield Ok(event);
        }

        let mut stream = BroadcastStream::new(rx);
        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => {
                    let (event_type, seq, data) = match event {
                        PreSerializedEvent::Snapshot { seq, json } => ("snapshot", seq, json),
                        PreSerializedEvent::Update { seq, json } => ("update", seq, json),
                    };
                    let Some(payload) = event_payload(data.as_ref()) else {
                        warn!(seq, event = event_type, "map event is not valid utf-8; dropping");
                        continue;
                    };
                    yield Ok(Event::default().id(seq.to_string()).event(event_type).data(payload));
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(
                        skipped_events = skipped,
                        "SSE client lagged behind broadcast buffer; replaying snapshot"
                    );
                    if let Some(event) = snapshot_event(&state).await {
                        yield Ok(event);
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keep-alive"),
    )
}

async fn snapshot_event(state: &AppState) -> Option<Event> {
    let (seq, data): (u64, Arc<Bytes>) = {
        let live = state.live.read().await;
        (live.seq, Arc::clone(&live.snapshot_json))
    };
    if data.is_empty() {
        return None;
    }
    let Some(payload) = event_payload(data.as_ref()) else {
        warn!(seq, "snapshot payload is not valid utf-8; skipping");
        return None;
    };
    Some(Event::default().id(seq.to_string()).event("snapshot").data(payload))
}

fn event_payload(bytes: &Bytes) -> Option<&str> {
    std::str::from_utf8(bytes.as_ref()).ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use frontlines_shared::CampaignConfig;
    use futures::StreamExt;
    use tower::ServiceExt;

    use super::event_payload;
    use crate::services::map_refresher;
    use crate::state::AppState;
    use crate::store::TableStore;

    async fn next_frame(body: &mut axum::body::BodyDataStream) -> String {
        let chunk = body
            .next()
            .await
            .expect("stream open")
            .expect("frame readable");
        String::from_utf8(chunk.to_vec()).expect("utf-8 frame")
    }

    #[tokio::test]
    async fn subscriber_gets_snapshot_then_updates() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("roster.json"),
            r##"[{"name":"Alice","color":"#FF0000","maps":"Both"}]"##,
        )
        .expect("write roster");
        let state = AppState::new(CampaignConfig::default(), TableStore::new(dir.path()), 8);
        map_refresher::refresh(&state).await.expect("initial refresh");

        let response = crate::app::build_app(state.clone())
            .oneshot(Request::get("/api/events").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        let mut body = response.into_body().into_data_stream();

        let snapshot = next_frame(&mut body).await;
        assert!(snapshot.contains("event: snapshot"));
        assert!(snapshot.contains("id: 1"));

        std::fs::write(
            dir.path().join("results.json"),
            r#"[{"player1":"Alice","player2":"Bob","result":"P1 Win",
              "map":"TGA","claimed_territory":"C3"}]"#,
        )
        .expect("write results");
        map_refresher::refresh(&state).await.expect("refresh after edit");

        let update = next_frame(&mut body).await;
        assert!(update.contains("event: update"));
        assert!(update.contains("id: 2"));
        assert!(update.contains(r#""map":"TGA""#));
    }

    #[test]
    fn payload_requires_utf8() {
        assert_eq!(
            event_payload(&Bytes::from_static(br#"{"type":"Update"}"#)),
            Some(r#"{"type":"Update"}"#)
        );
        let invalid = Arc::new(Bytes::from_static(&[0xff, 0xfe]));
        assert!(event_payload(invalid.as_ref()).is_none());
    }
}
