//! Plain-text error responses and cookie helpers.

pub mod cookie;
pub mod response;

pub use cookie::*;
pub use response::*;
