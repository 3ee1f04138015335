//! Live Relay Library Crate
//!
//! Everything the relay service needs apart from process startup: configuration,
//! shared application state, routing and the WebSocket session handler. The
//! `relay` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
