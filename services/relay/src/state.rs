//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the read-only
//! resources every relay session needs: the upstream connector and the session
//! configuration builder.

use crate::config::Config;
use gemini_realtime::GeminiConnector;
use relay_core::{SessionConfigBuilder, UpstreamConnector, persona::PersonaTable};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::info;

/// The shared application state, created once at startup and passed to all handlers.
/// Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn UpstreamConnector>,
    pub session_config: Arc<SessionConfigBuilder>,
}

impl AppState {
    /// Builds the state the relay runs with in production: Gemini Live upstream.
    pub fn from_config(config: &Config) -> Self {
        let connector = GeminiConnector::new(
            config.gemini_live_url.clone(),
            SecretString::from(config.gemini_api_key.expose_secret().to_owned()),
            config.gemini_model.clone(),
            config.setup_envelope,
        );
        let personas = PersonaTable::new(
            config.low_pitch_voices.iter().cloned(),
            config.male_persona.clone(),
            config.female_persona.clone(),
        );
        info!(
            upstream = %connector.base_url(),
            model = %connector.model(),
            envelope = ?config.setup_envelope,
            "Upstream connector ready."
        );
        Self {
            connector: Arc::new(connector),
            session_config: Arc::new(SessionConfigBuilder::new(
                personas,
                config.response_modalities.clone(),
            )),
        }
    }
}
