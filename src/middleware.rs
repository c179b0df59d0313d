//! `tower` layers: status recording (with the access-log flavor) and the cookie token gate.
//!
//! Both layers wrap concrete `axum` request/response types so they drop straight into
//! `Router::layer` / `Router::route_layer`, and both compose with any other `tower` layer.

pub mod record;
pub mod require_token;

pub use record::*;
pub use require_token::*;
