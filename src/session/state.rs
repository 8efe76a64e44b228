//! Session snapshot types and the typed payloads decoded from auth replies.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

const BYTES_PER_GB: f64 = 1024. * 1024. * 1024.;

/// Process-wide view of who is signed in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
	/// Current user profile.
	pub user: Option<UserProfile>,
	/// Whether a usable session is established.
	pub is_authenticated: bool,
	/// Set while a login, registration, or profile operation is running.
	pub loading: bool,
	/// Storage quota summary.
	pub storage_info: StorageSummary,
}
impl SessionState {
	/// Installs `user` and marks the session authenticated.
	///
	/// A storage summary embedded in the profile replaces the current one.
	pub fn set_user(&mut self, user: UserProfile) {
		if let Some(storage) = &user.storage_info {
			self.storage_info = storage.clone();
		}

		self.user = Some(user);
		self.is_authenticated = true;
	}

	/// Resets everything to the signed-out defaults.
	pub fn clear(&mut self) {
		*self = Self::default();
	}
}

/// User profile as returned by the backend.
///
/// Only the fields the session reads are typed; everything else is kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Backend identifier (number or string).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,
	/// Storage summary embedded in the profile.
	#[serde(default, rename = "storageInfo", skip_serializing_if = "Option::is_none")]
	pub storage_info: Option<StorageSummary>,
	/// Remaining profile fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl UserProfile {
	/// Raw field lookup across typed and untyped fields.
	pub fn field(&self, name: &str) -> Option<&Value> {
		match name {
			"id" => self.id.as_ref(),
			_ => self.extra.get(name),
		}
	}
}

/// Storage quota in gigabytes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSummary {
	/// Total quota.
	#[serde(rename = "totalStorageGB")]
	pub total_storage_gb: f64,
	/// Space in use.
	#[serde(rename = "usedStorageGB")]
	pub used_storage_gb: f64,
	/// Space left.
	#[serde(rename = "availableStorageGB")]
	pub available_storage_gb: f64,
	/// Usage in percent.
	#[serde(rename = "usagePercentage")]
	pub usage_percentage: f64,
}

/// Storage usage in bytes, as reported by the storage endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageUsage {
	/// Total quota in bytes.
	pub storage_quota: f64,
	/// Bytes in use.
	pub used_storage: f64,
	/// Bytes left.
	pub available_storage: f64,
	/// Usage in percent.
	pub usage_percentage: f64,
}
impl From<StorageUsage> for StorageSummary {
	fn from(usage: StorageUsage) -> Self {
		Self {
			total_storage_gb: usage.storage_quota / BYTES_PER_GB,
			used_storage_gb: usage.used_storage / BYTES_PER_GB,
			available_storage_gb: usage.available_storage / BYTES_PER_GB,
			usage_percentage: usage.usage_percentage,
		}
	}
}

/// Token pair and optional profile carried by login, registration, and refresh replies.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenGrant {
	/// New access token.
	pub access_token: Option<String>,
	/// New refresh token.
	pub refresh_token: Option<String>,
	/// Signed-in user.
	pub user: Option<UserProfile>,
}

/// Structured result handed to UI code instead of a propagated error.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthOutcome {
	/// Whether the operation succeeded.
	pub success: bool,
	/// Message suitable for display.
	pub message: String,
	/// User profile, when the operation produced one.
	pub user: Option<UserProfile>,
	/// `true` when the call was dropped as a duplicate and can be ignored.
	pub duplicate: bool,
}
impl AuthOutcome {
	/// Successful outcome.
	pub fn succeeded(message: impl Into<String>, user: Option<UserProfile>) -> Self {
		Self { success: true, message: message.into(), user, duplicate: false }
	}

	/// Failed outcome.
	pub fn failed(message: impl Into<String>) -> Self {
		Self { success: false, message: message.into(), user: None, duplicate: false }
	}

	/// Failed outcome for `err`.
	///
	/// Classified failures keep their own message; transport and local errors use `fallback`.
	pub fn from_error(err: &Error, fallback: &str) -> Self {
		match err {
			Error::Api(_) | Error::SessionExpired { .. } | Error::Duplicate { .. } => Self {
				duplicate: err.is_duplicate(),
				..Self::failed(err.to_string())
			},
			_ => Self::failed(fallback),
		}
	}
}
