//! Client-level error types shared across the pipeline, stores, and session.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received; the transport's own error is kept untouched.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The backend answered and the reply was classified as a failure.
	#[error(transparent)]
	Api(#[from] ApiFailure),

	/// An identical request is already in flight; safe to ignore.
	#[error("{message}")]
	Duplicate {
		/// Fingerprint of the rejected request.
		fingerprint: String,
		/// Human-readable rejection message.
		message: String,
	},
	/// The stored access token is expired or unreadable; the request was never sent.
	#[error("{message}")]
	SessionExpired {
		/// Human-readable rejection message.
		message: String,
	},
	/// A success payload did not match the expected shape.
	#[error("Response payload could not be decoded at `{path}`: {message}.")]
	Decode {
		/// JSON path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}
impl Error {
	/// Returns `true` for the duplicate-request rejection callers should silently ignore.
	pub fn is_duplicate(&self) -> bool {
		matches!(self, Self::Duplicate { .. })
	}

	/// Returns `true` when the failure means the credential is no longer usable.
	pub fn is_auth_expired(&self) -> bool {
		matches!(self.category(), Some(FailureCategory::AuthExpired))
	}

	/// Failure category for classified and pre-flight auth failures.
	pub fn category(&self) -> Option<FailureCategory> {
		match self {
			Self::Api(failure) => Some(failure.category),
			Self::SessionExpired { .. } => Some(FailureCategory::AuthExpired),
			_ => None,
		}
	}

	pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { path: err.path().to_string(), message: err.inner().to_string() }
	}
}

/// Categories assigned to failures that carried a backend reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
	/// Credential invalid or expired.
	AuthExpired,
	/// Authenticated but not allowed.
	Forbidden,
	/// Resource does not exist.
	NotFound,
	/// Request conflicts with server state.
	Conflict,
	/// Backend-side failure, including empty replies.
	ServerError,
	/// Anything else, including body-encoded failures.
	Generic,
}
impl FailureCategory {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AuthExpired => "auth_expired",
			Self::Forbidden => "forbidden",
			Self::NotFound => "not_found",
			Self::Conflict => "conflict",
			Self::ServerError => "server_error",
			Self::Generic => "generic",
		}
	}
}
impl Display for FailureCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure classified from a backend reply.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ApiFailure {
	/// Failure category.
	pub category: FailureCategory,
	/// Message suitable for display.
	pub message: String,
	/// HTTP status, when the failure came from the status line rather than the body.
	pub status: Option<u16>,
}
impl ApiFailure {
	/// Builds a failure for the provided category and message.
	pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
		Self { category, message: message.into(), status: None }
	}

	/// Attaches the HTTP status that produced the failure.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures where no response was received (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a failure before any response arrived.
	#[error(transparent)]
	Network {
		/// Transport-specific error, passed through as produced.
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the transport's original error.
	pub fn into_source(self) -> BoxError {
		match self {
			Self::Network { source } => source,
			Self::Io(e) => Box::new(e),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
