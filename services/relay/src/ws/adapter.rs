//! Glue between axum's WebSocket and the relay core.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt, future};
use relay_core::{CloseSignal, Duplex, Frame, LegCommand, LegError, LegEvent};

/// Splits an accepted caller socket into the relay's inbound leg.
pub(crate) fn inbound_duplex(socket: WebSocket) -> Duplex {
    let (sink, stream) = socket.split();
    let sink = sink
        .sink_map_err(|e| LegError::Send(e.to_string()))
        .with(|command: LegCommand| future::ready(Ok::<_, LegError>(to_ws_message(command))));
    let stream = stream.filter_map(|result| future::ready(to_leg_event(result)));
    Duplex::new(sink, stream)
}

fn to_ws_message(command: LegCommand) -> Message {
    match command {
        LegCommand::Send(Frame::Text(text)) => Message::Text(text.into()),
        LegCommand::Send(Frame::Binary(data)) => Message::Binary(data),
        LegCommand::Close(signal) => Message::Close(signal.map(|s| CloseFrame {
            code: s.code,
            reason: s.reason.into(),
        })),
    }
}

// Ping/pong is handled by axum.
fn to_leg_event(result: Result<Message, axum::Error>) -> Option<LegEvent> {
    match result {
        Ok(Message::Text(text)) => Some(LegEvent::Frame(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(LegEvent::Frame(Frame::Binary(data))),
        Ok(Message::Close(frame)) => Some(LegEvent::Closed(
            frame.map(|f| CloseSignal::new(f.code, f.reason.as_str())),
        )),
        Ok(Message::Ping(_) | Message::Pong(_)) => None,
        Err(e) => Some(LegEvent::Failed(e.to_string())),
    }
}
