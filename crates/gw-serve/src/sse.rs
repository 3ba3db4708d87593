use crate::AppState;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use gw_core::activity::StoreFeedSource;
use gw_core::types::TeamId;
use gw_events::{Feed, FeedMessage};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

/// Streams the tenant's feed as SSE. Each snapshot is one `data:` frame
/// holding a JSON array; a terminated feed sends one `event: error` frame
/// and closes. Dropping the response stops the poller.
pub fn feed(state: &AppState, team_id: TeamId) -> Response {
    let source = Arc::new(StoreFeedSource::new(state.provider.clone()));
    tracing::debug!(team_id = %team_id, "feed subscribed");
    let subscription = Feed::new(source, team_id, state.feed).subscribe();
    let stream = subscription.map(|message| Ok::<Event, Infallible>(frame(&message)));
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn frame(message: &FeedMessage) -> Event {
    match message {
        FeedMessage::Snapshot { events } => {
            let json = serde_json::to_string(events).unwrap_or_else(|_| "[]".to_string());
            Event::default().data(json)
        }
        FeedMessage::Terminated { reason } => Event::default()
            .event("error")
            .data(json!({ "error": reason }).to_string()),
    }
}
