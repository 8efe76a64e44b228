//! Storage contracts and built-in backends for the access and refresh tokens.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, token::TokenSecret};

/// The two fixed keys a token store manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSlot {
	/// Short-lived token sent on every authenticated call.
	#[serde(rename = "token")]
	Access,
	/// Longer-lived token used only to mint a new access token.
	#[serde(rename = "refreshToken")]
	Refresh,
}
impl TokenSlot {
	/// Storage key for the slot.
	pub const fn key(self) -> &'static str {
		match self {
			Self::Access => "token",
			Self::Refresh => "refreshToken",
		}
	}
}
impl Display for TokenSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.key())
	}
}

/// Durable key-value contract for the two bearer tokens.
///
/// Reads come from an in-process view and never fail; writes may hit the backend and surface
/// [`StoreError`]. Validity is always derived from the stored token at call time because a
/// token can expire between two checks.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Reads the token held in `slot`.
	fn load(&self, slot: TokenSlot) -> Option<TokenSecret>;

	/// Writes `token` into `slot`, replacing any previous value.
	fn persist(&self, slot: TokenSlot, token: TokenSecret) -> Result<(), StoreError>;

	/// Drops both tokens.
	fn clear(&self) -> Result<(), StoreError>;

	/// Current access token.
	fn get(&self) -> Option<TokenSecret> {
		self.load(TokenSlot::Access)
	}

	/// Current refresh token.
	fn get_refresh(&self) -> Option<TokenSecret> {
		self.load(TokenSlot::Refresh)
	}

	/// Stores a new access token.
	fn save(&self, token: &str) -> Result<(), StoreError> {
		self.persist(TokenSlot::Access, TokenSecret::new(token))
	}

	/// Stores a new refresh token.
	fn save_refresh(&self, token: &str) -> Result<(), StoreError> {
		self.persist(TokenSlot::Refresh, TokenSecret::new(token))
	}

	/// Removes every stored token (logout or detected expiry).
	fn remove(&self) -> Result<(), StoreError> {
		self.clear()
	}

	/// `true` iff an access token is present and not expired right now.
	fn is_logged_in(&self) -> bool {
		self.get().is_some_and(|token| !token.is_expired())
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{expired_token, live_token};

	#[test]
	fn slot_keys_are_fixed() {
		assert_eq!(TokenSlot::Access.key(), "token");
		assert_eq!(TokenSlot::Refresh.key(), "refreshToken");
		assert_eq!(
			serde_json::to_string(&TokenSlot::Refresh).expect("Slot should serialize."),
			"\"refreshToken\""
		);
	}

	#[test]
	fn logged_in_is_derived_from_the_access_token() {
		let store = MemoryTokenStore::default();

		assert!(!store.is_logged_in());

		store.save(&expired_token("1")).expect("Saving into memory should succeed.");

		assert!(!store.is_logged_in());

		store.save(&live_token("1")).expect("Saving into memory should succeed.");

		assert!(store.is_logged_in());

		store.save("garbage").expect("Saving into memory should succeed.");

		assert!(!store.is_logged_in());
	}

	#[test]
	fn refresh_token_alone_does_not_log_in() {
		let store = MemoryTokenStore::default();

		store.save_refresh(&live_token("1")).expect("Saving into memory should succeed.");

		assert!(!store.is_logged_in());
		assert!(store.get_refresh().is_some());
	}
}
