//! Request de-duplication: stable fingerprints and the in-flight registry.
//!
//! A request enters the registry before anything else happens to it. A second request with the
//! same fingerprint is rejected on the spot; results are never shared or queued. The
//! [`PendingGuard`] returned on entry removes the fingerprint when it is dropped, so every exit
//! path (success, failure, pre-flight abort, cancelled future) releases it exactly once.

// std
use std::collections::HashSet;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde_json::Value;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	request::{ApiRequest, RequestBody},
};

const SEPARATOR: &str = "&";

/// Canonical key identifying logically identical requests.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);
impl Fingerprint {
	/// Derives the fingerprint from method, path, query, and body.
	///
	/// Parts are joined with `&`; absent query/body parts render as empty strings and JSON is
	/// serialized with object keys sorted so field order never matters.
	pub fn of(request: &ApiRequest) -> Self {
		let query = request.query.as_ref().map(canonical_json).unwrap_or_default();
		let body = match &request.body {
			RequestBody::Empty => String::new(),
			RequestBody::Json(value) => canonical_json(value),
			RequestBody::Multipart(form) => canonical_json(&form.describe()),
		};
		let parts = [request.method.as_str(), request.path.as_str(), query.as_str(), body.as_str()];

		Self(parts.join(SEPARATOR))
	}

	/// Raw fingerprint string. May contain request bodies; do not log it.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Base64 (no padding) SHA-256 digest, safe to log.
	pub fn digest(&self) -> String {
		STANDARD_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
	}
}
impl Display for Fingerprint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.digest())
	}
}

/// Set of fingerprints whose requests have not settled yet.
#[derive(Clone, Debug, Default)]
pub struct PendingRequests(Arc<Mutex<HashSet<Fingerprint>>>);
impl PendingRequests {
	/// Marks `fingerprint` as pending; returns `false` without side effects if it already is.
	pub fn begin(&self, fingerprint: &Fingerprint) -> bool {
		let mut guard = self.0.lock();

		if guard.contains(fingerprint) {
			return false;
		}

		guard.insert(fingerprint.clone())
	}

	/// Removes `fingerprint`; calling it again is harmless.
	pub fn end(&self, fingerprint: &Fingerprint) {
		self.0.lock().remove(fingerprint);
	}

	/// [`begin`](Self::begin) wrapped in a guard that calls [`end`](Self::end) on drop.
	pub fn acquire(&self, fingerprint: Fingerprint) -> Option<PendingGuard> {
		if !self.begin(&fingerprint) {
			return None;
		}

		Some(PendingGuard { registry: self.clone(), fingerprint })
	}

	/// Returns `true` while a request with this fingerprint is in flight.
	pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
		self.0.lock().contains(fingerprint)
	}

	/// Number of in-flight requests.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns `true` when nothing is in flight.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}
}

/// RAII handle for one pending fingerprint.
pub struct PendingGuard {
	registry: PendingRequests,
	fingerprint: Fingerprint,
}
impl PendingGuard {
	/// Fingerprint held by this guard.
	pub fn fingerprint(&self) -> &Fingerprint {
		&self.fingerprint
	}
}
impl Debug for PendingGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PendingGuard").field(&self.fingerprint.digest()).finish()
	}
}
impl Drop for PendingGuard {
	fn drop(&mut self) {
		self.registry.end(&self.fingerprint);
	}
}

fn canonical_json(value: &Value) -> String {
	let mut buf = String::new();

	write_canonical(value, &mut buf);

	buf
}

fn write_canonical(value: &Value, buf: &mut String) {
	match value {
		Value::Array(items) => {
			buf.push('[');

			for (idx, item) in items.iter().enumerate() {
				if idx > 0 {
					buf.push(',');
				}

				write_canonical(item, buf);
			}

			buf.push(']');
		},
		Value::Object(map) => {
			let mut entries: Vec<_> = map.iter().collect();

			entries.sort_by(|a, b| a.0.cmp(b.0));
			buf.push('{');

			for (idx, (key, item)) in entries.into_iter().enumerate() {
				if idx > 0 {
					buf.push(',');
				}

				buf.push_str(&Value::String(key.clone()).to_string());
				buf.push(':');
				write_canonical(item, buf);
			}

			buf.push('}');
		},
		scalar => buf.push_str(&scalar.to_string()),
	}
}
