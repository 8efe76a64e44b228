//! Optional observability helpers for the request pipeline and session lifecycle.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `bearer_client.request` (fields `method` and
//!   `fingerprint`, the latter a digest only) and `bearer_client.session` (field `operation`),
//!   plus debug/warn events for rejections and non-fatal session failures.
//! - Enable `metrics` to increment the `bearer_client_request_total` counter for every
//!   attempt and outcome, labeled by `method` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the pipeline.
	Attempt,
	/// Normalized success.
	Success,
	/// Classified or transport failure.
	Failure,
	/// Rejected because an identical request was in flight.
	Duplicate,
	/// Rejected before sending because the stored token was unusable.
	Expired,
}
impl RequestOutcome {
	/// Maps a pipeline result onto its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(Error::Duplicate { .. }) => Self::Duplicate,
			Err(Error::SessionExpired { .. }) => Self::Expired,
			Err(_) => Self::Failure,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
			RequestOutcome::Duplicate => "duplicate",
			RequestOutcome::Expired => "expired",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
