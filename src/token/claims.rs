//! Signature-less decoding of the claims segment.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Claims payload read from a token's middle segment.
///
/// Derived on demand and never persisted; a value only describes the token it was decoded from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);
impl Claims {
	/// Decodes the payload segment of a compact token.
	///
	/// Any malformed input (wrong segment count, bad base64url, non-object JSON) yields `None`
	/// so a corrupted token degrades to "unauthenticated" instead of failing the caller.
	pub fn decode(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return None;
		};
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		match serde_json::from_slice(&bytes).ok()? {
			Value::Object(map) => Some(Self(map)),
			_ => None,
		}
	}

	/// Expiry as Unix seconds, when present and numeric.
	pub fn exp(&self) -> Option<f64> {
		self.0.get("exp").and_then(Value::as_f64)
	}

	/// Subject identifier; numeric subjects are rendered as strings.
	pub fn sub(&self) -> Option<String> {
		match self.0.get("sub")? {
			Value::String(s) if !s.is_empty() => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			_ => None,
		}
	}

	/// Raw claim lookup.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Expiry as an instant, when present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let millis = (self.exp()? * 1_000.) as i128;

		OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
	}

	/// Fail-closed expiry check: a missing `exp` counts as expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		let Some(exp) = self.exp() else {
			return true;
		};
		let now_millis = (instant.unix_timestamp_nanos() / 1_000_000) as f64;

		exp * 1_000. < now_millis
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
