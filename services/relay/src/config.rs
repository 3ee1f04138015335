use gemini_realtime::{DEFAULT_LIVE_URL, DEFAULT_MODEL, EnvelopeFormat};
use relay_core::{
    ResponseModality,
    persona::{DEFAULT_FEMALE_PERSONA, DEFAULT_LOW_PITCH_VOICES, DEFAULT_MALE_PERSONA},
};
use secrecy::SecretString;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub gemini_api_key: SecretString,
    pub gemini_live_url: String,
    pub gemini_model: String,
    pub setup_envelope: EnvelopeFormat,
    pub response_modalities: Vec<ResponseModality>,
    pub low_pitch_voices: Vec<String>,
    pub male_persona: String,
    pub female_persona: String,
    pub log_level: Level,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let port_str = var_or("PORT", "10000");
        let port = port_str
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(addr) => addr.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], port)),
        };

        let gemini_live_url = var_or("GEMINI_LIVE_URL", DEFAULT_LIVE_URL);
        let gemini_model = var_or("GEMINI_MODEL", DEFAULT_MODEL);

        let setup_envelope = var_or("SETUP_ENVELOPE", "camel")
            .parse::<EnvelopeFormat>()
            .map_err(|e| ConfigError::InvalidValue("SETUP_ENVELOPE".to_string(), e.to_string()))?;

        let response_modalities = comma_list(&var_or("RESPONSE_MODALITIES", "AUDIO"))
            .iter()
            .map(|m| m.parse::<ResponseModality>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidValue("RESPONSE_MODALITIES".to_string(), e))?;
        if response_modalities.is_empty() {
            return Err(ConfigError::InvalidValue(
                "RESPONSE_MODALITIES".to_string(),
                "at least one modality is required".to_string(),
            ));
        }

        let low_pitch_voices = comma_list(&var_or(
            "LOW_PITCH_VOICES",
            &DEFAULT_LOW_PITCH_VOICES.join(","),
        ));
        let male_persona = var_or("MALE_PERSONA", DEFAULT_MALE_PERSONA);
        let female_persona = var_or("FEMALE_PERSONA", DEFAULT_FEMALE_PERSONA);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            gemini_api_key,
            gemini_live_url,
            gemini_model,
            setup_envelope,
            response_modalities,
            low_pitch_voices,
            male_persona,
            female_persona,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            for var in [
                "GEMINI_API_KEY",
                "PORT",
                "BIND_ADDRESS",
                "GEMINI_LIVE_URL",
                "GEMINI_MODEL",
                "SETUP_ENVELOPE",
                "RESPONSE_MODALITIES",
                "LOW_PITCH_VOICES",
                "MALE_PERSONA",
                "FEMALE_PERSONA",
                "RUST_LOG",
            ] {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:10000");
        assert_eq!(config.gemini_api_key.expose_secret(), "test-gemini-key");
        assert_eq!(config.gemini_live_url, DEFAULT_LIVE_URL);
        assert_eq!(config.gemini_model, "models/gemini-2.0-flash-exp");
        assert_eq!(config.setup_envelope, EnvelopeFormat::CamelCase);
        assert_eq!(config.response_modalities, vec![ResponseModality::Audio]);
        assert_eq!(config.low_pitch_voices, vec!["Charon", "Fenrir", "Puck"]);
        assert_eq!(config.male_persona, "Rahul");
        assert_eq!(config.female_persona, "Riya");
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("GEMINI_MODEL", "models/gemini-live-2.5-flash-preview");
            env::set_var("SETUP_ENVELOPE", "snake");
            env::set_var("RESPONSE_MODALITIES", "audio, text");
            env::set_var("LOW_PITCH_VOICES", "Orus, Charon");
            env::set_var("MALE_PERSONA", "Arjun");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.gemini_model, "models/gemini-live-2.5-flash-preview");
        assert_eq!(config.setup_envelope, EnvelopeFormat::SnakeCase);
        assert_eq!(
            config.response_modalities,
            vec![ResponseModality::Audio, ResponseModality::Text]
        );
        assert_eq!(config.low_pitch_voices, vec!["Orus", "Charon"]);
        assert_eq!(config.male_persona, "Arjun");
        assert_eq!(config.female_persona, "Riya");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_bind_address_overrides_port() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("BIND_ADDRESS", "127.0.0.1:9000");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "GEMINI_API_KEY"),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_modality() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RESPONSE_MODALITIES", "AUDIO,VIDEO");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, msg) => {
                assert_eq!(var, "RESPONSE_MODALITIES");
                assert!(msg.contains("VIDEO"));
            }
            _ => panic!("Expected InvalidValue for RESPONSE_MODALITIES"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}
