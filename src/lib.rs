//! Small helpers for `axum`/`tower` HTTP servers: a status-recording log layer, plain-text error
//! responses, cookie helpers, cookie-borne token gates, and retry with exponential backoff.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod http;
pub mod middleware;
pub mod obs;
pub mod retry;

pub use auth::{Audience, AuthGate, HmacAudience, Token};
pub use error::{Error, Result};
pub use retry::{RetryPolicy, retry, retry_async};

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use {color_eyre as _, httpmock as _, reqwest as _};
