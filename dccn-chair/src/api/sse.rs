//! Server-Sent Events for chair dashboards
//!
//! Streams the workflow events of one conference so that open dashboards
//! can refresh without polling.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::Chair;
use crate::AppState;

/// GET /api/conferences/:conf_id/events
///
/// Event names are the [`dccn_common::DccnEvent`] variant names; the data is
/// the event as JSON.
pub async fn event_stream(
    State(state): State<AppState>,
    chair: Chair,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(chair = chair.user_id, conference_id = chair.conference_id, "SSE client connected");

    let mut rx = state.events.subscribe();
    let conference_id = chair.conference_id;

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => match received {
                    Ok(event) if event.conference_id() == conference_id => {
                        let event_type = event.event_type().to_string();
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                debug!("SSE: Broadcasting {}", event_type);
                                yield Ok(Event::default().event(event_type).data(json));
                            }
                            Err(e) => warn!("SSE: Failed to serialize event {}: {}", event_type, e),
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("SSE: client lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

pub fn sse_routes() -> Router<AppState> {
    Router::new().route("/api/conferences/:conf_id/events", get(event_stream))
}
