//! Axum Router Configuration
//!
//! The relay exposes a single surface: the root path answers health checks
//! and accepts WebSocket upgrades; `/ws` accepts upgrades only.

use crate::{
    state::AppState,
    ws::{root_handler, ws_handler},
};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use gemini_realtime::{EnvelopeFormat, GeminiConnector};
    use relay_core::SessionConfigBuilder;
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            connector: Arc::new(GeminiConnector::new(
                "ws://127.0.0.1:9/live",
                SecretString::from("test-key".to_string()),
                "models/test",
                EnvelopeFormat::CamelCase,
            )),
            session_config: Arc::new(SessionConfigBuilder::default()),
        })
    }

    #[tokio::test]
    async fn test_root_serves_health_check() {
        let response = create_router(test_state())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Gemini Live relay is running.");
    }

    #[tokio::test]
    async fn test_root_with_query_but_no_upgrade_is_health_check() {
        let response = create_router(test_state())
            .oneshot(
                Request::get("/?name=Asha&voice=Puck")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeated_query_key_is_still_health_check() {
        let response = create_router(test_state())
            .oneshot(
                Request::get("/?name=a&name=b&style=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Gemini Live relay is running.");
    }

    #[tokio::test]
    async fn test_ws_path_requires_upgrade() {
        let response = create_router(test_state())
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_caller_query_keeps_first_of_repeated_keys() {
        let pairs = [("name", "a"), ("voice", "Puck"), ("name", "b"), ("lang", "mr")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            crate::ws::CallerQuery::from_pairs(pairs),
            crate::ws::CallerQuery {
                name: Some("a".into()),
                voice: Some("Puck".into()),
                style: None,
            }
        );
    }

    #[test]
    fn test_caller_query_defaults() {
        let params = relay_core::CallerParams::from(crate::ws::CallerQuery {
            name: Some("Asha".into()),
            voice: None,
            style: Some(String::new()),
        });
        assert_eq!(params.name, "Asha");
        assert_eq!(params.voice, "Kore");
        assert_eq!(params.style, "Casual");
    }
}
