//! The transport-neutral shape of a duplex connection.
//!
//! Both legs of a relay session (the caller's socket and the upstream socket)
//! are adapted into the same vocabulary: a stream of [`LegEvent`]s coming in and
//! a sink of [`LegCommand`]s going out. The relay never looks inside a
//! [`Frame`].

use bytes::Bytes;
use futures::{Sink, Stream};
use std::pin::Pin;

/// WebSocket close reasons must fit in a 125-byte control frame along with the
/// two-byte code.
pub const MAX_CLOSE_REASON_BYTES: usize = 123;

/// One opaque message unit exchanged over a duplex connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A close code plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSignal {
    pub code: u16,
    pub reason: String,
}

impl CloseSignal {
    /// Builds a signal, truncating the reason on a char boundary so it always
    /// fits in a close frame.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        if reason.len() > MAX_CLOSE_REASON_BYTES {
            let mut end = MAX_CLOSE_REASON_BYTES;
            while !reason.is_char_boundary(end) {
                end -= 1;
            }
            reason.truncate(end);
        }
        Self { code, reason }
    }
}

/// Something that happened on a leg, as seen by its reading half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegEvent {
    Frame(Frame),
    /// The peer closed the connection, with its close frame if it sent one.
    Closed(Option<CloseSignal>),
    /// The transport failed; carries whatever diagnostic text was available.
    Failed(String),
}

/// An instruction for a leg's writing half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegCommand {
    Send(Frame),
    Close(Option<CloseSignal>),
}

#[derive(Debug, thiserror::Error)]
pub enum LegError {
    #[error("failed to send on connection: {0}")]
    Send(String),
}

pub type BoxLegSink = Pin<Box<dyn Sink<LegCommand, Error = LegError> + Send>>;
pub type BoxLegStream = Pin<Box<dyn Stream<Item = LegEvent> + Send>>;

/// Both halves of an adapted connection.
pub struct Duplex {
    pub sink: BoxLegSink,
    pub stream: BoxLegStream,
}

impl Duplex {
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<LegCommand, Error = LegError> + Send + 'static,
        R: Stream<Item = LegEvent> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

impl std::fmt::Debug for Duplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Duplex").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_is_truncated_on_char_boundary() {
        let long = "é".repeat(100);
        let signal = CloseSignal::new(1011, long);
        assert!(signal.reason.len() <= MAX_CLOSE_REASON_BYTES);
        assert_eq!(signal.reason.len(), 122);
        assert!(signal.reason.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_short_close_reason_is_untouched() {
        let signal = CloseSignal::new(1000, "bye");
        assert_eq!(signal.code, 1000);
        assert_eq!(signal.reason, "bye");
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(Frame::Text("abc".into()).len(), 3);
        assert!(Frame::Binary(Bytes::new()).is_empty());
    }
}
