// self
use crate::{_prelude::*, pending::Fingerprint, request::Method};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// Span wrapping one pipeline call or one session operation.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Span for a single request; only the fingerprint digest is recorded.
	pub fn request(method: Method, fingerprint: &Fingerprint) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_client.request",
				method = method.as_str(),
				fingerprint = %fingerprint,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, fingerprint);

			Self {}
		}
	}

	/// Span for a session operation such as `login` or `refresh_tokens`.
	pub fn session(operation: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_client.session", operation);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = operation;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a request the pipeline refused to send.
pub fn trace_rejection(err: &Error) {
	#[cfg(feature = "tracing")]
	{
		match err {
			Error::Duplicate { fingerprint, .. } =>
				tracing::debug!(fingerprint = %fingerprint, "duplicate request rejected"),
			Error::SessionExpired { .. } =>
				tracing::debug!("stored access token unusable; request not sent"),
			_ => {},
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Emits a warning for a session step that failed without aborting the operation.
pub fn trace_nonfatal(operation: &'static str, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			operation,
			category = err.category().map(|c| c.as_str()),
			error = %err,
			"session step failed",
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, err);
	}
}
