//! Open/closing/closed bookkeeping for one side of a relay session.
//!
//! A [`Duplex`] is split into a writing [`Leg`] and a reading [`LegReader`]
//! that share a [`LegStatus`]. The reader flips the status when the peer goes
//! away, so whoever holds the writer stops forwarding to it without having to
//! wait for a failed send.

use crate::frame::{BoxLegSink, BoxLegStream, CloseSignal, Duplex, Frame, LegCommand, LegEvent};
use futures::{SinkExt, StreamExt};
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on flushing a closing transport to a peer that stopped reading.
const SINK_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState {
    Open,
    Closing,
    Closed,
}

impl LegState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LegState::Open,
            1 => LegState::Closing,
            _ => LegState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LegState::Open => 0,
            LegState::Closing => 1,
            LegState::Closed => 2,
        }
    }
}

/// Shared, lock-free view of a leg's state.
#[derive(Debug, Clone)]
pub struct LegStatus(Arc<AtomicU8>);

impl LegStatus {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(LegState::Open.as_u8())))
    }

    pub fn get(&self) -> LegState {
        LegState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.get() == LegState::Open
    }

    /// Moves `Open -> Closing`. Returns `false` if the leg was not open.
    fn begin_close(&self) -> bool {
        self.0
            .compare_exchange(
                LegState::Open.as_u8(),
                LegState::Closing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn mark_closed(&self) {
        self.0.store(LegState::Closed.as_u8(), Ordering::Release);
    }
}

impl Default for LegStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of the session a leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Inbound,
    Upstream,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Inbound => write!(f, "inbound"),
            Side::Upstream => write!(f, "upstream"),
        }
    }
}

/// How a leg's reading half ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegEnd {
    Closed(Option<CloseSignal>),
    Failed(String),
    /// The stream ended without a close frame.
    Dropped,
}

/// The writing half of a connection.
pub struct Leg {
    side: Side,
    sink: BoxLegSink,
    status: LegStatus,
}

/// The reading half of a connection.
pub struct LegReader {
    side: Side,
    stream: BoxLegStream,
    status: LegStatus,
}

impl Leg {
    pub fn split(side: Side, duplex: Duplex) -> (Leg, LegReader) {
        let status = LegStatus::new();
        (
            Leg {
                side,
                sink: duplex.sink,
                status: status.clone(),
            },
            LegReader {
                side,
                stream: duplex.stream,
                status,
            },
        )
    }

    pub fn status(&self) -> &LegStatus {
        &self.status
    }

    /// Sends `frame` if the leg is open. Frames for a leg that is not open are
    /// dropped, not buffered. Returns whether the frame went out.
    pub async fn forward(&mut self, frame: Frame) -> bool {
        if !self.status.is_open() {
            debug!(side = %self.side, bytes = frame.len(), "Dropping frame for a leg that is not open.");
            return false;
        }
        match self.sink.send(LegCommand::Send(frame)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(side = %self.side, error = %e, "Send failed; marking leg closed.");
                self.status.mark_closed();
                false
            }
        }
    }

    /// Requests closure. Only the first call on an open leg sends a close frame.
    ///
    /// Every call then closes the underlying sink. When the peer closed first,
    /// the transport's queued close reply is flushed here, so the peer sees a
    /// completed handshake rather than a reset.
    pub async fn close(&mut self, signal: Option<CloseSignal>) {
        if self.status.begin_close() {
            debug!(side = %self.side, ?signal, "Closing leg.");
            if let Err(e) = self.sink.send(LegCommand::Close(signal)).await {
                debug!(side = %self.side, error = %e, "Close frame could not be delivered.");
            }
        } else {
            debug!(side = %self.side, state = ?self.status.get(), "Leg already closing; finishing transport close only.");
        }
        match tokio::time::timeout(SINK_CLOSE_TIMEOUT, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(side = %self.side, error = %e, "Transport close failed."),
            Err(_) => warn!(side = %self.side, "Transport close timed out."),
        }
        self.status.mark_closed();
    }
}

impl LegReader {
    pub fn status(&self) -> &LegStatus {
        &self.status
    }

    /// Next frame from the peer, or how the leg ended. Terminal outcomes mark
    /// the shared status closed.
    pub async fn next_frame(&mut self) -> Result<Frame, LegEnd> {
        let end = match self.stream.next().await {
            Some(LegEvent::Frame(frame)) => return Ok(frame),
            Some(LegEvent::Closed(signal)) => LegEnd::Closed(signal),
            Some(LegEvent::Failed(reason)) => LegEnd::Failed(reason),
            None => LegEnd::Dropped,
        };
        debug!(side = %self.side, ?end, "Leg ended.");
        self.status.mark_closed();
        Err(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::LegError;
    use futures::channel::mpsc;

    fn channel_leg() -> (
        Leg,
        LegReader,
        mpsc::UnboundedSender<LegEvent>,
        mpsc::UnboundedReceiver<LegCommand>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded();
        let (command_tx, command_rx) = mpsc::unbounded();
        let duplex = Duplex::new(
            command_tx.sink_map_err(|e| LegError::Send(e.to_string())),
            event_rx,
        );
        let (leg, reader) = Leg::split(Side::Upstream, duplex);
        (leg, reader, event_tx, command_rx)
    }

    #[tokio::test]
    async fn test_forward_on_open_leg() {
        let (mut leg, _reader, _events, mut commands) = channel_leg();
        assert!(leg.forward(Frame::Text("hello".into())).await);
        assert_eq!(
            commands.next().await,
            Some(LegCommand::Send(Frame::Text("hello".into())))
        );
    }

    #[tokio::test]
    async fn test_forward_after_peer_close_is_dropped() {
        let (mut leg, mut reader, events, mut commands) = channel_leg();
        events
            .unbounded_send(LegEvent::Closed(Some(CloseSignal::new(1000, ""))))
            .unwrap();
        assert_eq!(
            reader.next_frame().await,
            Err(LegEnd::Closed(Some(CloseSignal::new(1000, ""))))
        );
        assert_eq!(leg.status().get(), LegState::Closed);

        assert!(!leg.forward(Frame::Text("late".into())).await);
        drop(leg);
        assert_eq!(commands.next().await, None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut leg, _reader, _events, mut commands) = channel_leg();
        leg.close(Some(CloseSignal::new(1000, "done"))).await;
        leg.close(Some(CloseSignal::new(1011, "again"))).await;
        leg.close(None).await;
        drop(leg);

        assert_eq!(
            commands.next().await,
            Some(LegCommand::Close(Some(CloseSignal::new(1000, "done"))))
        );
        assert_eq!(commands.next().await, None);
    }

    #[tokio::test]
    async fn test_close_after_peer_close_finishes_transport_without_frame() {
        let (mut leg, mut reader, events, mut commands) = channel_leg();
        events.unbounded_send(LegEvent::Closed(None)).unwrap();
        assert_eq!(reader.next_frame().await, Err(LegEnd::Closed(None)));

        leg.close(None).await;

        // The sink is closed while the leg is still alive, and no close frame of
        // our own went out.
        assert_eq!(commands.next().await, None);
        assert_eq!(leg.status().get(), LegState::Closed);
    }

    #[tokio::test]
    async fn test_failed_send_marks_leg_closed() {
        let (mut leg, _reader, _events, commands) = channel_leg();
        drop(commands);
        assert!(!leg.forward(Frame::Binary(vec![1, 2].into())).await);
        assert_eq!(leg.status().get(), LegState::Closed);
    }

    #[tokio::test]
    async fn test_stream_end_is_reported_as_dropped() {
        let (_leg, mut reader, events, _commands) = channel_leg();
        drop(events);
        assert_eq!(reader.next_frame().await, Err(LegEnd::Dropped));
        assert!(!reader.status().is_open());
    }
}
