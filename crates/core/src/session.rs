//! Session lifecycle: dial upstream, send setup, pump, tear down.
//!
//! One call to [`run_session`] owns one caller connection from acceptance to
//! close. Sessions share nothing mutable, so any number can run at once.

use crate::{
    close,
    frame::{CloseSignal, Duplex, Frame},
    leg::{Leg, LegEnd, LegReader, Side},
    persona::Persona,
    pump::{self, RelayStats},
    session_config::{CallerParams, SessionConfigBuilder},
    upstream::{ConnectError, UpstreamConnector},
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Upstream dial in flight.
    Connecting,
    /// Upstream open, setup frame in flight.
    Configuring,
    /// Frames flowing both ways.
    Relaying,
    /// One side ended, the other is being torn down.
    Closing,
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The caller closed, failed or vanished first.
    InboundClosed,
    /// The upstream could not be dialed, or the setup could not be encoded.
    Configuration(String),
    /// The upstream transport failed, during the dial or mid-session.
    UpstreamFailed(String),
    /// The upstream closed the session.
    UpstreamClosed { code: u16, reason: String },
}

impl Termination {
    /// The close signal the caller should get, if the caller is still there.
    pub fn inbound_signal(&self) -> Option<CloseSignal> {
        match self {
            Termination::InboundClosed => None,
            Termination::Configuration(_) => Some(close::configuration_error()),
            Termination::UpstreamFailed(diagnostic) => Some(close::upstream_error(diagnostic)),
            Termination::UpstreamClosed { code, reason } => {
                Some(close::upstream_closed(*code, reason))
            }
        }
    }

    fn from_pump(side: Side, end: LegEnd) -> Self {
        match (side, end) {
            (Side::Inbound, _) => Termination::InboundClosed,
            (Side::Upstream, LegEnd::Closed(Some(signal))) => Termination::UpstreamClosed {
                code: signal.code,
                reason: signal.reason,
            },
            (Side::Upstream, LegEnd::Closed(None)) => Termination::UpstreamClosed {
                code: close::CLOSE_NO_STATUS,
                reason: String::new(),
            },
            (Side::Upstream, LegEnd::Dropped) => Termination::UpstreamClosed {
                code: close::CLOSE_ABNORMAL,
                reason: String::new(),
            },
            (Side::Upstream, LegEnd::Failed(diagnostic)) => Termination::UpstreamFailed(diagnostic),
        }
    }
}

impl From<ConnectError> for Termination {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Configuration(msg) => Termination::Configuration(msg),
            ConnectError::Transport(msg) => Termination::UpstreamFailed(msg),
        }
    }
}

/// What is left of a session once both legs are closed.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub caller: String,
    pub persona: Persona,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub state: SessionState,
    pub termination: Termination,
    pub stats: RelayStats,
    pub setup_sent: bool,
}

struct Session {
    id: Uuid,
    params: CallerParams,
    started_at: DateTime<Utc>,
    started: Instant,
    state: SessionState,
}

impl Session {
    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug!(session_id = %self.id, from = ?self.state, to = ?next, "Session state change.");
        self.state = next;
    }
}

/// Runs one relay session to completion.
///
/// `inbound` is the caller's already-accepted connection. The upstream is
/// dialed exactly once; there is no retry.
pub async fn run_session(
    inbound: Duplex,
    params: CallerParams,
    connector: &dyn UpstreamConnector,
    builder: &SessionConfigBuilder,
) -> SessionReport {
    let mut session = Session {
        id: Uuid::new_v4(),
        params,
        started_at: Utc::now(),
        started: Instant::now(),
        state: SessionState::Connecting,
    };
    let setup = builder.build(&session.params);
    info!(
        session_id = %session.id,
        caller = %session.params.name,
        voice = %session.params.voice,
        style = %session.params.style,
        persona = %setup.persona.name,
        "New client connected."
    );

    let (mut inbound_leg, mut inbound_reader) = Leg::split(Side::Inbound, inbound);
    let mut stats = RelayStats::default();
    let mut setup_sent = false;

    let termination = match connector.setup_frame(&setup) {
        Err(e) => {
            error!(session_id = %session.id, error = %e, "Failed to encode setup frame.");
            Termination::from(e)
        }
        Ok(setup_frame) => {
            relay(
                &mut session,
                connector,
                setup_frame,
                (&mut inbound_leg, &mut inbound_reader),
                &mut stats,
                &mut setup_sent,
            )
            .await
        }
    };

    session.transition(SessionState::Closing);
    // Sends nothing when the caller left first, but still answers its close.
    inbound_leg.close(termination.inbound_signal()).await;
    session.transition(SessionState::Closed);

    let duration = session.started.elapsed();
    info!(
        session_id = %session.id,
        caller = %session.params.name,
        duration_secs = duration.as_secs_f64(),
        to_upstream = stats.to_upstream,
        to_inbound = stats.to_inbound,
        termination = ?termination,
        "Client disconnected."
    );

    SessionReport {
        session_id: session.id,
        caller: session.params.name,
        persona: setup.persona,
        started_at: session.started_at,
        duration,
        state: session.state,
        termination,
        stats,
        setup_sent,
    }
}

/// Everything between dialing and the first leg ending. Leaves the upstream leg
/// closed; the caller's leg is the caller's to close.
async fn relay(
    session: &mut Session,
    connector: &dyn UpstreamConnector,
    setup_frame: Frame,
    inbound: (&mut Leg, &mut LegReader),
    stats: &mut RelayStats,
    setup_sent: &mut bool,
) -> Termination {
    let (inbound_leg, inbound_reader) = inbound;

    let dialed = tokio::select! {
        biased;
        dialed = connector.connect() => dialed,
        end = drain_until_end(&mut *inbound_reader) => {
            info!(session_id = %session.id, ?end, "Client left before upstream opened.");
            return Termination::InboundClosed;
        }
    };
    let upstream = match dialed {
        Ok(upstream) => upstream,
        Err(e) => {
            error!(session_id = %session.id, error = %e, "Failed to open upstream connection.");
            return Termination::from(e);
        }
    };
    info!(session_id = %session.id, "Connected to upstream.");
    session.transition(SessionState::Configuring);

    let (mut upstream_leg, mut upstream_reader) = Leg::split(Side::Upstream, upstream);
    if !upstream_leg.forward(setup_frame).await {
        upstream_leg.close(None).await;
        return Termination::UpstreamFailed("failed to send setup".to_string());
    }
    *setup_sent = true;
    session.transition(SessionState::Relaying);

    let end = pump::run(
        (inbound_leg, inbound_reader),
        (&mut upstream_leg, &mut upstream_reader),
        stats,
    )
    .await;
    match &end.end {
        LegEnd::Failed(diagnostic) => {
            warn!(session_id = %session.id, side = %end.side, %diagnostic, "Connection error.")
        }
        other => info!(session_id = %session.id, side = %end.side, end = ?other, "Connection closed."),
    }
    session.transition(SessionState::Closing);
    // Sends nothing when the upstream is the side that ended.
    upstream_leg.close(None).await;
    Termination::from_pump(end.side, end.end)
}

/// Reads the caller's leg while the upstream is not open yet, dropping frames.
async fn drain_until_end(reader: &mut LegReader) -> LegEnd {
    loop {
        match reader.next_frame().await {
            Ok(frame) => {
                debug!(bytes = frame.len(), "Upstream not open; dropping client frame.")
            }
            Err(end) => return end,
        }
    }
}
