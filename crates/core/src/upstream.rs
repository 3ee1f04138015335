//! The seam between a relay session and whatever dials the upstream service.

use crate::{
    frame::{Duplex, Frame},
    session_config::SetupDescriptor,
};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The dial could not even begin, e.g. a malformed address.
    #[error("upstream configuration error: {0}")]
    Configuration(String),
    /// The dial began but the network or handshake failed.
    #[error("upstream transport error: {0}")]
    Transport(String),
}

/// Opens the outbound leg of a session.
///
/// Implementations own the upstream wire contract: the address, the
/// credential and the envelope the setup descriptor travels in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    /// Serializes the setup descriptor into the frame sent first after open.
    fn setup_frame(&self, setup: &SetupDescriptor) -> Result<Frame, ConnectError>;

    /// Dials the upstream. Resolves once the connection is open.
    async fn connect(&self) -> Result<Duplex, ConnectError>;
}
