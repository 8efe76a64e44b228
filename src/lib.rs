//! Bearer-token REST client core for a single JSON backend: request de-duplication, fail-fast
//! token expiry checks, and envelope-aware response normalization.
//!
//! Every call flows through the same pipeline: [`pending`] rejects concurrent duplicates,
//! [`interceptor`] attaches (or refuses to attach) the stored bearer token, the [`http`]
//! transport executes the call, and [`normalize`] folds the heterogeneous reply shapes into
//! one success-or-failure result. [`session`] builds the login/logout/profile lifecycle on top.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod normalize;
pub mod obs;
pub mod pending;
pub mod request;
pub mod session;
pub mod store;
pub mod token;


mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
