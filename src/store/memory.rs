//! Thread-safe in-memory [`TokenStore`] implementation for tests and short-lived processes.

// std
use std::collections::HashMap;
// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenSlot, TokenStore},
	token::TokenSecret,
};

type SlotMap = Arc<RwLock<HashMap<TokenSlot, TokenSecret>>>;

/// Storage backend that keeps tokens in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(SlotMap);
impl MemoryTokenStore {
	/// Builds a store seeded with an access token (and optionally a refresh token).
	pub fn seeded(access: impl Into<String>, refresh: Option<&str>) -> Self {
		let store = Self::default();

		{
			let mut guard = store.0.write();

			guard.insert(TokenSlot::Access, TokenSecret::new(access));

			if let Some(refresh) = refresh {
				guard.insert(TokenSlot::Refresh, TokenSecret::new(refresh));
			}
		}

		store
	}
}
impl TokenStore for MemoryTokenStore {
	fn load(&self, slot: TokenSlot) -> Option<TokenSecret> {
		self.0.read().get(&slot).cloned()
	}

	fn persist(&self, slot: TokenSlot, token: TokenSecret) -> Result<(), StoreError> {
		self.0.write().insert(slot, token);

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.0.write().clear();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn save_get_remove_round_trip() {
		let store = MemoryTokenStore::default();

		store.save("access-1").expect("Saving access token should succeed.");
		store.save_refresh("refresh-1").expect("Saving refresh token should succeed.");

		assert_eq!(store.get().as_ref().map(TokenSecret::expose), Some("access-1"));
		assert_eq!(store.get_refresh().as_ref().map(TokenSecret::expose), Some("refresh-1"));

		store.remove().expect("Removing tokens should succeed.");

		assert!(store.get().is_none());
		assert!(store.get_refresh().is_none());

		store.remove().expect("Removing twice should stay harmless.");
	}

	#[test]
	fn clones_share_state() {
		let store = MemoryTokenStore::seeded("a", Some("r"));
		let view = store.clone();

		store.save("b").expect("Saving access token should succeed.");

		assert_eq!(view.get().as_ref().map(TokenSecret::expose), Some("b"));
		assert_eq!(view.get_refresh().as_ref().map(TokenSecret::expose), Some("r"));
	}
}
