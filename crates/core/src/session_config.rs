//! Turns caller-supplied parameters into the one-time setup payload for the
//! upstream session.

use crate::persona::{Persona, PersonaTable};

pub const DEFAULT_CALLER_NAME: &str = "Student";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_STYLE: &str = "Casual";

/// The three optional parameters a caller passes on the connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerParams {
    pub name: String,
    pub voice: String,
    pub style: String,
}

impl CallerParams {
    /// Missing or empty values fall back to the defaults.
    pub fn new(name: Option<String>, voice: Option<String>, style: Option<String>) -> Self {
        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }
        Self {
            name: or_default(name, DEFAULT_CALLER_NAME),
            voice: or_default(voice, DEFAULT_VOICE),
            style: or_default(style, DEFAULT_STYLE),
        }
    }
}

impl Default for CallerParams {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseModality {
    Audio,
    Text,
}

impl ResponseModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseModality::Audio => "AUDIO",
            ResponseModality::Text => "TEXT",
        }
    }
}

impl std::str::FromStr for ResponseModality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUDIO" => Ok(ResponseModality::Audio),
            "TEXT" => Ok(ResponseModality::Text),
            other => Err(format!("unknown response modality '{other}'")),
        }
    }
}

/// Everything the upstream needs to know about the session, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupDescriptor {
    pub persona: Persona,
    pub voice: String,
    pub instructions: String,
    pub response_modalities: Vec<ResponseModality>,
}

/// Pure mapping from [`CallerParams`] to a [`SetupDescriptor`].
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    personas: PersonaTable,
    response_modalities: Vec<ResponseModality>,
}

impl SessionConfigBuilder {
    pub fn new(personas: PersonaTable, response_modalities: Vec<ResponseModality>) -> Self {
        Self {
            personas,
            response_modalities,
        }
    }

    pub fn build(&self, params: &CallerParams) -> SetupDescriptor {
        let persona = self.personas.resolve(&params.voice);
        let instructions = coach_instructions(&persona.name, &params.name, &params.style);
        SetupDescriptor {
            persona,
            voice: params.voice.clone(),
            instructions,
            response_modalities: self.response_modalities.clone(),
        }
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new(PersonaTable::default(), vec![ResponseModality::Audio])
    }
}

fn coach_instructions(persona: &str, caller: &str, style: &str) -> String {
    format!(
        "You are {persona}, an expert English language coach.\n\
         User: {caller}. Level: Intermediate. Style: {style}.\n\
         \n\
         RULES:\n\
         1. Greet immediately: \"Namaskar {caller}! I am {persona}. Shall we start practice?\"\n\
         2. Speak mostly English (90%). Explain grammar in Marathi (10%).\n\
         3. Keep responses concise.\n\
         4. No politics or adult topics.\n\
         5. If you hear only background noise or silence, stay silent and wait.\n"
    )
}
