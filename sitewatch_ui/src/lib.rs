//! SiteWatch feed server: accepts activity messages, keeps the recent log and
//! pushes every record to dashboards over Server-Sent Events.

pub mod activity;
pub mod events;
pub mod state;

use axum::{
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    activity::{list_activity, post_message},
    events::sse_handler,
    state::AppState,
};

/// Builds the application router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ping", get(ping_handler))
        .route("/events", get(sse_handler))
        .route("/message", post(post_message))
        .route("/api/activity", get(list_activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn index_handler() -> impl IntoResponse {
    let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <title>SiteWatch</title>
    <style>
        #feed {
            max-height: 480px;
            overflow-y: auto;
            border: 1px solid #ccc;
            padding: 10px;
            margin: 10px 0;
            font-family: sans-serif;
        }
        .item { display: flex; gap: 8px; padding: 4px 0; }
        .dot { width: 10px; height: 10px; border-radius: 50%; margin-top: 5px; }
        .success { background: #22c55e; }
        .warning { background: #eab308; }
        .danger, .error { background: #ef4444; }
        .info { background: #3b82f6; }
        .time { color: #6b7280; font-size: 12px; }
        #status.paused { color: #b91c1c; }
    </style>
</head>
<body>
    <h1>SiteWatch - Recent Activity</h1>
    <div id="status" class="paused">Live updates paused</div>
    <div id="feed"></div>

    <script>
        const MAX_ITEMS = 50;
        const feed = document.getElementById("feed");
        const status = document.getElementById("status");

        function render(activity) {
            const item = document.createElement("div");
            item.className = "item";
            const dot = document.createElement("span");
            dot.className = "dot " + activity.status;
            const body = document.createElement("div");
            const message = document.createElement("div");
            message.textContent = activity.message;
            const time = document.createElement("div");
            time.className = "time";
            time.textContent = activity.time;
            body.appendChild(message);
            body.appendChild(time);
            item.appendChild(dot);
            item.appendChild(body);
            return item;
        }

        function prepend(activity) {
            feed.insertBefore(render(activity), feed.firstChild);
            while (feed.children.length > MAX_ITEMS) {
                feed.removeChild(feed.lastChild);
            }
        }

        async function loadHistory() {
            const res = await fetch("/api/activity?limit=" + MAX_ITEMS);
            const activities = await res.json();
            feed.innerHTML = "";
            activities.forEach(a => feed.appendChild(render(a)));
        }

        function connect() {
            const source = new EventSource("/events");
            source.onopen = () => {
                status.textContent = "Live";
                status.className = "";
            };
            source.onerror = () => {
                status.textContent = "Live updates paused";
                status.className = "paused";
            };
            source.addEventListener("activity", (event) => {
                try {
                    prepend(JSON.parse(event.data));
                } catch (e) {
                    console.error("Failed to parse activity", e);
                }
            });
        }

        // History replaces the list, so subscribe only once it is in place.
        loadHistory()
            .catch(e => console.error("Failed to load history", e))
            .finally(connect);
    </script>
</body>
</html>"#;
    Html(html)
}

/// Handler for the /ping endpoint
///
/// # Examples
///
/// ```no_run
/// use axum::{
///     Router,
///     routing::get,
/// };
///
/// async fn test_ping() {
///     let app: Router = Router::new().route("/ping", get(sitewatch_ui::ping_handler));
///     // In a real server, we would bind and serve
/// }
/// ```
pub async fn ping_handler() -> &'static str {
    "Pong from sitewatch feed server!"
}
