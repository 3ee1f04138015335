//! Dials the Gemini Live WebSocket endpoint.

use crate::setup::{EnvelopeFormat, encode_setup};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, future};
use relay_core::{
    CloseSignal, ConnectError, Duplex, Frame, LegCommand, LegError, LegEvent, SetupDescriptor,
    UpstreamConnector,
};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Error as WsError,
        client::IntoClientRequest,
        protocol::{CloseFrame, Message as WsMessage, frame::coding::CloseCode},
    },
};
use tracing::{debug, info};

pub const DEFAULT_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Opens one Gemini Live connection per relay session.
///
/// The API key travels as the `key` query parameter and is only exposed while
/// building the request.
#[derive(Debug)]
pub struct GeminiConnector {
    base_url: String,
    api_key: SecretString,
    model: String,
    format: EnvelopeFormat,
}

impl GeminiConnector {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        format: EnvelopeFormat,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            format,
        }
    }

    /// The endpoint without the credential, safe to log.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}key={}",
            self.base_url,
            separator,
            self.api_key.expose_secret()
        )
    }
}

#[async_trait]
impl UpstreamConnector for GeminiConnector {
    fn setup_frame(&self, setup: &SetupDescriptor) -> Result<Frame, ConnectError> {
        encode_setup(&self.model, self.format, setup)
            .map(Frame::Text)
            .map_err(|e| ConnectError::Configuration(format!("setup encoding failed: {e}")))
    }

    async fn connect(&self) -> Result<Duplex, ConnectError> {
        let request = self
            .endpoint()
            .into_client_request()
            .map_err(classify_dial_error)?;
        info!(url = %self.base_url, model = %self.model, "Dialing Gemini Live.");

        let (ws_stream, response) = connect_async(request).await.map_err(classify_dial_error)?;
        debug!(status = %response.status(), "Gemini Live handshake complete.");

        let (sink, stream) = ws_stream.split();
        let sink = sink
            .sink_map_err(|e| LegError::Send(e.to_string()))
            .with(|command: LegCommand| future::ready(Ok::<_, LegError>(to_ws_message(command))));
        let stream = stream.filter_map(|result| future::ready(to_leg_event(result)));
        Ok(Duplex::new(sink, stream))
    }
}

/// A malformed address never reaches the network; everything else did.
fn classify_dial_error(err: WsError) -> ConnectError {
    match err {
        WsError::Url(e) => ConnectError::Configuration(e.to_string()),
        WsError::HttpFormat(e) => ConnectError::Configuration(e.to_string()),
        other => ConnectError::Transport(other.to_string()),
    }
}

fn to_ws_message(command: LegCommand) -> WsMessage {
    match command {
        LegCommand::Send(Frame::Text(text)) => WsMessage::Text(text.into()),
        LegCommand::Send(Frame::Binary(data)) => WsMessage::Binary(data),
        LegCommand::Close(signal) => WsMessage::Close(signal.map(|s| CloseFrame {
            code: CloseCode::from(s.code),
            reason: s.reason.into(),
        })),
    }
}

/// Control frames are answered by tungstenite itself and never surface.
fn to_leg_event(result: Result<WsMessage, WsError>) -> Option<LegEvent> {
    match result {
        Ok(WsMessage::Text(text)) => Some(LegEvent::Frame(Frame::Text(text.as_str().to_owned()))),
        Ok(WsMessage::Binary(data)) => Some(LegEvent::Frame(Frame::Binary(data))),
        Ok(WsMessage::Close(frame)) => Some(LegEvent::Closed(
            frame.map(|f| CloseSignal::new(u16::from(f.code), f.reason.as_str())),
        )),
        Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => None,
        Err(e) => Some(LegEvent::Failed(e.to_string())),
    }
}
