//! Transport-agnostic core of the live relay.
//!
//! A relay session pairs one caller connection with one upstream connection,
//! sends a one-time setup frame to the upstream and then forwards frames both
//! ways, untouched, until either side goes away.

pub mod close;
pub mod frame;
pub mod leg;
pub mod persona;
pub mod pump;
pub mod session;
pub mod session_config;
pub mod upstream;

pub use frame::{CloseSignal, Duplex, Frame, LegCommand, LegError, LegEvent};
pub use session::{SessionReport, SessionState, Termination, run_session};
pub use session_config::{CallerParams, ResponseModality, SessionConfigBuilder, SetupDescriptor};
pub use upstream::{ConnectError, UpstreamConnector};
