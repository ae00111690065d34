use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};

use crate::handlers::AppState;

/// GET /api/objects/events - Object events as server-sent events
///
/// Each connection holds its own bus subscription; it is released when the
/// client disconnects and the stream is dropped.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (subscription, rx) = state.actions.service().bus().subscribe_channel();
    tracing::debug!("Event stream opened");

    let events = stream::unfold((subscription, rx), |(subscription, mut rx)| async move {
        let event = rx.recv().await?;
        let sse = match Event::default().event(event.name()).json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                tracing::warn!("Failed to encode {} for event stream: {}", event.name(), e);
                Event::default().event("error").data("encoding failed")
            }
        };
        Some((Ok(sse), (subscription, rx)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
