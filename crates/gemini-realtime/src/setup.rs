//! The `setup` message that opens a Gemini Live session.
//!
//! Field naming has changed between protocol revisions, so the envelope can be
//! emitted in camelCase or snake_case.

use relay_core::{ResponseModality, SetupDescriptor};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeFormat {
    #[default]
    CamelCase,
    SnakeCase,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown setup envelope format '{0}', expected 'camel' or 'snake'")]
pub struct ParseEnvelopeFormatError(String);

impl std::str::FromStr for EnvelopeFormat {
    type Err = ParseEnvelopeFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "camel" | "camelcase" => Ok(EnvelopeFormat::CamelCase),
            "snake" | "snake_case" => Ok(EnvelopeFormat::SnakeCase),
            other => Err(ParseEnvelopeFormatError(other.to_string())),
        }
    }
}

// --- Wire types ---
// The same envelope under both field namings; only `rename_all` differs.
macro_rules! setup_wire_types {
    ($module:ident, $case:literal) => {
        mod $module {
            use serde::Serialize;

            #[derive(Serialize)]
            pub(super) struct SetupMessage<'a> {
                pub setup: BidiGenerateContentSetup<'a>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = $case)]
            pub(super) struct BidiGenerateContentSetup<'a> {
                pub model: &'a str,
                pub generation_config: GenerationConfig<'a>,
                pub system_instruction: Content<'a>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = $case)]
            pub(super) struct GenerationConfig<'a> {
                pub response_modalities: Vec<super::WireModality>,
                pub speech_config: SpeechConfig<'a>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = $case)]
            pub(super) struct SpeechConfig<'a> {
                pub voice_config: VoiceConfig<'a>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = $case)]
            pub(super) struct VoiceConfig<'a> {
                pub prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = $case)]
            pub(super) struct PrebuiltVoiceConfig<'a> {
                pub voice_name: &'a str,
            }
            #[derive(Serialize)]
            pub(super) struct Content<'a> {
                pub parts: Vec<Part<'a>>,
            }
            #[derive(Serialize)]
            pub(super) struct Part<'a> {
                pub text: &'a str,
            }

            pub(super) fn message<'a>(
                model: &'a str,
                setup: &'a relay_core::SetupDescriptor,
            ) -> SetupMessage<'a> {
                SetupMessage {
                    setup: BidiGenerateContentSetup {
                        model,
                        generation_config: GenerationConfig {
                            response_modalities: setup
                                .response_modalities
                                .iter()
                                .map(|&m| super::WireModality::from(m))
                                .collect(),
                            speech_config: SpeechConfig {
                                voice_config: VoiceConfig {
                                    prebuilt_voice_config: PrebuiltVoiceConfig {
                                        voice_name: &setup.voice,
                                    },
                                },
                            },
                        },
                        system_instruction: Content {
                            parts: vec![Part {
                                text: &setup.instructions,
                            }],
                        },
                    },
                }
            }
        }
    };
}

setup_wire_types!(camel, "camelCase");
setup_wire_types!(snake, "snake_case");

#[derive(Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum WireModality {
    Text,
    Audio,
}

impl From<ResponseModality> for WireModality {
    fn from(modality: ResponseModality) -> Self {
        match modality {
            ResponseModality::Audio => WireModality::Audio,
            ResponseModality::Text => WireModality::Text,
        }
    }
}

/// Serializes the setup descriptor into the JSON text of the first frame.
pub fn encode_setup(
    model: &str,
    format: EnvelopeFormat,
    setup: &SetupDescriptor,
) -> Result<String, serde_json::Error> {
    match format {
        EnvelopeFormat::CamelCase => serde_json::to_string(&camel::message(model, setup)),
        EnvelopeFormat::SnakeCase => serde_json::to_string(&snake::message(model, setup)),
    }
}
