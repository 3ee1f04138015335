//! Picks the close signal a caller receives when the upstream side ends.

use crate::frame::CloseSignal;

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_GOING_AWAY: u16 = 1001;
pub const CLOSE_NO_STATUS: u16 = 1005;
pub const CLOSE_ABNORMAL: u16 = 1006;
pub const CLOSE_POLICY: u16 = 1008;
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;
pub const CLOSE_BAD_GATEWAY: u16 = 1014;

/// Lowercase fragments the upstream puts in close reasons when it rejects the
/// API key.
const CREDENTIAL_MARKERS: [&str; 5] = [
    "api key",
    "api_key",
    "credential",
    "unauthenticated",
    "permission denied",
];

/// The classes of session end a caller can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// The upstream could not even be dialed.
    Configuration,
    /// The upstream transport failed.
    UpstreamError,
    /// The upstream refused the server's credential.
    InvalidCredential,
    /// The upstream ended the session with a normal close.
    Normal,
    /// The upstream closed with some other code.
    UpstreamClosed,
}

impl CloseKind {
    pub fn code(self) -> u16 {
        match self {
            CloseKind::Configuration => CLOSE_INTERNAL_ERROR,
            CloseKind::UpstreamError => CLOSE_BAD_GATEWAY,
            CloseKind::InvalidCredential => CLOSE_POLICY,
            CloseKind::Normal => CLOSE_NORMAL,
            CloseKind::UpstreamClosed => CLOSE_GOING_AWAY,
        }
    }
}

pub fn is_credential_reason(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    CREDENTIAL_MARKERS.iter().any(|m| reason.contains(m))
}

/// Classifies an upstream close frame. A credential marker wins over the code.
pub fn classify_upstream_close(code: u16, reason: &str) -> CloseKind {
    if is_credential_reason(reason) {
        CloseKind::InvalidCredential
    } else if code == CLOSE_NORMAL {
        CloseKind::Normal
    } else {
        CloseKind::UpstreamClosed
    }
}

pub fn configuration_error() -> CloseSignal {
    CloseSignal::new(
        CloseKind::Configuration.code(),
        "Server configuration error: could not contact upstream.",
    )
}

pub fn upstream_error(diagnostic: &str) -> CloseSignal {
    CloseSignal::new(
        CloseKind::UpstreamError.code(),
        format!("Upstream error: {diagnostic}"),
    )
}

pub fn upstream_closed(code: u16, reason: &str) -> CloseSignal {
    let kind = classify_upstream_close(code, reason);
    let text = match kind {
        CloseKind::InvalidCredential => "Upstream rejected the server credential.".to_string(),
        CloseKind::Normal => "Upstream session ended.".to_string(),
        _ => format!("Upstream closed session (code {code})."),
    };
    CloseSignal::new(kind.code(), text)
}
