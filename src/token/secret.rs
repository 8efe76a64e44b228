//! Redacted wrapper for bearer token strings.

// self
use crate::{_prelude::*, token::claims::Claims};

/// Redacted token wrapper keeping credentials out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Decodes the claims carried by this token, if it is well formed.
	pub fn claims(&self) -> Option<Claims> {
		Claims::decode(&self.0)
	}

	/// Returns `true` when the token is unreadable, lacks `exp`, or `exp` lies in the past.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.claims().is_none_or(|claims| claims.is_expired_at(instant))
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{expired_token, live_token};

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn expiry_follows_the_exp_claim() {
		assert!(!TokenSecret::new(live_token("7")).is_expired());
		assert!(TokenSecret::new(expired_token("7")).is_expired());
		assert!(TokenSecret::new("not-a-token").is_expired());
	}
}
