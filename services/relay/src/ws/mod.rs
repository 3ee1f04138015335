//! WebSocket Relay Sessions
//!
//! - `session`: accepts the caller's WebSocket, reads the caller parameters from
//!   the query string and runs one relay session per connection.
//! - `adapter`: converts axum's WebSocket into the relay's leg vocabulary.

mod adapter;
pub mod session;

pub use session::{CallerQuery, root_handler, ws_handler};
