//! Gemini Live as the upstream of a relay session.
//!
//! - `setup`: the versioned setup envelope sent as the first frame.
//! - `connector`: dials the live endpoint over `tokio-tungstenite` and adapts
//!   the socket to the relay's leg vocabulary.

pub mod connector;
pub mod setup;

pub use connector::{DEFAULT_LIVE_URL, DEFAULT_MODEL, GeminiConnector};
pub use setup::{EnvelopeFormat, encode_setup};
