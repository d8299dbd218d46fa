use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream::Stream, StreamExt};
use sitewatch_core::{activity::Severity, feed::ACTIVITY_EVENT};
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, warn};

use crate::state::AppState;

pub const CONNECT_MESSAGE: &str = "Server is running up.";
pub const DISCONNECT_MESSAGE: &str = "A client has disconnected.";

/// Announces the departure of an SSE subscriber when its stream is dropped.
struct SubscriberGuard {
    state: Arc<AppState>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        info!("activity subscriber left");
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state
                        .announce("disconnection", DISCONNECT_MESSAGE, Severity::Info)
                        .await;
                });
            }
            Err(_) => warn!("no runtime to announce subscriber departure"),
        }
    }
}

/// Server-Sent Events handler streaming activity records as `activity` events
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before announcing so the new client sees its own greeting
    let rx = state.activity_tx.subscribe();
    info!("activity subscriber joined");
    state
        .announce("server_status", CONNECT_MESSAGE, Severity::Success)
        .await;

    let guard = SubscriberGuard {
        state: Arc::clone(&state),
    };

    let stream = BroadcastStream::new(rx).map(move |msg| {
        let _guard = &guard;
        match msg {
            Ok(record) => match serde_json::to_string(&record) {
                Ok(json) => Ok(Event::default().event(ACTIVITY_EVENT).data(json)),
                Err(e) => {
                    error!("Failed to serialize activity record: {}", e);
                    Ok(Event::default().comment("Error serializing activity"))
                }
            },
            Err(e) => {
                error!("Error receiving from broadcast: {}", e);
                Ok(Event::default().comment("Activity stream lagged"))
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.config.keep_alive_interval())
            .text(state.config.keep_alive_text.clone()),
    )
}
