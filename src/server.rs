use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use std::{future::Future, io, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::dispatcher::{Dispatcher, Outcome, OutcomeStatus};
use crate::models::github::decode_events;

const EVENT_HEADER: &str = "X-GitHub-Event";
const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Shared state of all handlers.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(github_webhook))
        // GitHub's ping on app installation
        .route("/", post(|| async { StatusCode::OK }))
        .route("/health", get(health))
        .with_state(state)
}

#[tracing::instrument(skip_all, fields(event_type, delivery))]
pub async fn github_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event_type = header(&headers, EVENT_HEADER).unwrap_or_default().to_string();
    let delivery = header(&headers, DELIVERY_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = tracing::Span::current();
    span.record("event_type", event_type.as_str());
    span.record("delivery", delivery.as_str());

    if !state.dispatcher.mapping().handles(&event_type) {
        info!("Ignored event type: {}", event_type);
        return (StatusCode::OK, "Event ignored").into_response();
    }

    let events = match decode_events(&event_type, &body) {
        Ok(Some(events)) => events,
        Ok(None) => {
            info!("Ignored event type: {} (no decoder)", event_type);
            return (StatusCode::OK, "Event ignored").into_response();
        }
        Err(error) => {
            info!(%error, "Error binding JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON" })),
            )
                .into_response();
        }
    };

    // Runs detached so a dropped connection never aborts a command mid-flight.
    let dispatcher = state.dispatcher.clone();
    let task = tokio::spawn(
        async move { dispatcher.dispatch(&event_type, &events).await }.in_current_span(),
    );

    match task.await {
        Ok(Ok(outcomes)) => (StatusCode::OK, summarize(&outcomes)).into_response(),
        Ok(Err(error)) => {
            error!(%error, "dispatch aborted");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(error) => {
            error!(%error, "dispatch task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Drives `serve` to completion, but gives up `grace` after `stopping` turns `true`.
pub async fn drain_with_deadline<F>(
    serve: F,
    mut stopping: watch::Receiver<bool>,
    grace: Duration,
) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => return result,
        stopped = async { stopping.wait_for(|stop| *stop).await.is_ok() } => {
            if !stopped {
                return serve.await;
            }
        }
    }

    match tokio::time::timeout(grace, &mut serve).await {
        Ok(result) => result,
        Err(_) => {
            warn!("in-flight requests still running after {:?}, stopping anyway", grace);
            Ok(())
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
    }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Response text listing updated and failed issues.
fn summarize(outcomes: &[Outcome]) -> String {
    let tickets = |wanted: OutcomeStatus| -> Vec<String> {
        outcomes
            .iter()
            .filter(|o| o.status == wanted)
            .filter_map(|o| o.ticket.as_ref().map(ToString::to_string))
            .collect()
    };
    let updated = tickets(OutcomeStatus::Succeeded);
    let failed = tickets(OutcomeStatus::Failed);

    let mut text = if updated.is_empty() {
        "No issues updated".to_string()
    } else {
        format!("Issues {} updated", updated.join(", "))
    };
    if !failed.is_empty() {
        text.push_str(&format!("; failed: {}", failed.join(", ")));
    }
    text
}
