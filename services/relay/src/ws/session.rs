//! Accepts caller WebSockets and hands each one to a relay session.

use super::adapter::inbound_duplex;
use crate::{handlers, state::AppState};
use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use relay_core::{CallerParams, run_session};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};

/// The optional caller parameters on the connection URL.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallerQuery {
    pub name: Option<String>,
    pub voice: Option<String>,
    pub style: Option<String>,
}

impl CallerQuery {
    /// Picks the caller parameters out of decoded query pairs. A repeated key
    /// keeps its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = CallerQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut query.name,
                "voice" => &mut query.voice,
                "style" => &mut query.style,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

impl From<CallerQuery> for CallerParams {
    fn from(query: CallerQuery) -> Self {
        CallerParams::new(query.name, query.voice, query.style)
    }
}

/// Axum handler to upgrade an HTTP connection to a relay session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(pairs): Query<Vec<(String, String)>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let params = CallerParams::from(CallerQuery::from_pairs(pairs));
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// The root path serves the health check to plain requests and relays
/// WebSocket upgrades.
pub async fn root_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    query: Query<Vec<(String, String)>>,
    state: State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => ws_handler(ws, query, state).await,
        Err(_) => handlers::health().await.into_response(),
    }
}

async fn handle_socket(socket: WebSocket, params: CallerParams, state: Arc<AppState>) {
    let span = info_span!("relay_session", caller = %params.name);
    let report = run_session(
        inbound_duplex(socket),
        params,
        state.connector.as_ref(),
        &state.session_config,
    )
    .instrument(span)
    .await;
    debug!(
        session_id = %report.session_id,
        started_at = %report.started_at.to_rfc3339(),
        duration_secs = report.duration.as_secs_f64(),
        "Relay session released."
    );
}
