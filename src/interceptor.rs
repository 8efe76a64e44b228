//! Pre-flight credential check run before any request leaves the process.

// self
use crate::{
	_prelude::*, normalize::policy::SESSION_EXPIRED_MESSAGE, store::TokenStore, token::TokenSecret,
};

/// Attaches the stored access token, or refuses the call when that token is no longer usable.
///
/// No stored token means the call proceeds unauthenticated. A token that fails to decode, lacks
/// `exp`, or whose `exp` has passed rejects the call with [`Error::SessionExpired`] before any
/// network activity. The interceptor never touches the store; clearing is the session's job.
#[derive(Clone)]
pub struct AuthInterceptor {
	store: Arc<dyn TokenStore>,
	expired_message: String,
}
impl AuthInterceptor {
	/// Wraps the token store consulted on every call.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store, expired_message: SESSION_EXPIRED_MESSAGE.into() }
	}

	/// Overrides the rejection message.
	pub fn with_expired_message(mut self, message: impl Into<String>) -> Self {
		self.expired_message = message.into();

		self
	}

	/// Store backing this interceptor.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Returns the bearer credential to attach, checked against the current instant.
	pub fn authorize(&self) -> Result<Option<TokenSecret>> {
		self.authorize_at(OffsetDateTime::now_utc())
	}

	/// Same as [`authorize`](Self::authorize) with an explicit clock reading.
	pub fn authorize_at(&self, instant: OffsetDateTime) -> Result<Option<TokenSecret>> {
		let Some(token) = self.store.get() else {
			return Ok(None);
		};

		if token.is_expired_at(instant) {
			return Err(Error::SessionExpired { message: self.expired_message.clone() });
		}

		Ok(Some(token))
	}
}
impl Debug for AuthInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthInterceptor")
			.field("expired_message", &self.expired_message)
			.finish_non_exhaustive()
	}
}
