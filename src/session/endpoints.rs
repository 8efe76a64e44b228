//! Backend paths the session operations call.

// self
use crate::_prelude::*;

/// Backend paths used by [`Session`](crate::session::Session) operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEndpoints {
	/// `POST` credentials, returns the token pair and (optionally) the user.
	pub login: String,
	/// `POST` registration form.
	pub register: String,
	/// `POST {refreshToken}`, returns a rotated token pair.
	pub refresh: String,
	/// `GET` the signed-in user's profile.
	pub current_user: String,
	/// `PUT` profile changes.
	pub profile: String,
	/// `PUT` password change.
	pub password: String,
	/// `GET` storage quota and usage in bytes.
	pub storage: String,
}
impl Default for SessionEndpoints {
	fn default() -> Self {
		Self {
			login: "/api/auth/login".into(),
			register: "/api/auth/register".into(),
			refresh: "/api/auth/refresh-token".into(),
			current_user: "/api/users/me".into(),
			profile: "/api/users/me".into(),
			password: "/api/users/me/password".into(),
			storage: "/api/users/me/storage".into(),
		}
	}
}
