//! Session lifecycle on top of the request pipeline: login, registration, profile, and the
//! guard-facing validity probe.
//!
//! A [`Session`] owns its [`SessionState`] instead of sharing an ambient global, so every
//! consumer receives it explicitly. Operations that report to UI code return an
//! [`AuthOutcome`] rather than an error. An auth-expired failure anywhere clears both the state
//! and the stored tokens; every other failure leaves the session alone.

pub mod endpoints;
pub mod state;

pub use endpoints::*;
pub use state::*;

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::HttpTransport,
	normalize::Payload,
	obs::{self, CallSpan},
	request::ApiRequest,
};

const LOGIN_SUCCEEDED: &str = "登录成功";
const LOGIN_FAILED: &str = "登录失败";
const LOGIN_UNREACHABLE: &str = "登录失败，请检查网络连接";
const REGISTER_SUCCEEDED: &str = "注册成功";
const REGISTER_AUTO_LOGIN: &str = "注册成功并自动登录";
const REGISTER_MANUAL_LOGIN: &str = "注册成功，请手动登录";
const REGISTER_FAILED: &str = "注册失败";
const REGISTER_UNREACHABLE: &str = "注册失败，请检查网络连接";
const UPDATE_SUCCEEDED: &str = "更新成功";
const UPDATE_FAILED: &str = "更新失败";
const UPDATE_UNREACHABLE: &str = "更新失败，请重试";
const PASSWORD_SUCCEEDED: &str = "密码修改成功";
const PASSWORD_FAILED: &str = "密码修改失败";
const PASSWORD_UNREACHABLE: &str = "密码修改失败，请重试";

/// Signed-in state plus the operations that change it.
pub struct Session<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
	endpoints: SessionEndpoints,
	state: Arc<RwLock<SessionState>>,
	// Running loading operations; only written while `state` is write-locked.
	loads: Arc<AtomicUsize>,
}
impl<T> Session<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a session using the default endpoints.
	pub fn new(client: ApiClient<T>) -> Self {
		Self::with_endpoints(client, SessionEndpoints::default())
	}

	/// Creates a session with custom endpoints.
	///
	/// The authentication flag starts out as the current token validity.
	pub fn with_endpoints(client: ApiClient<T>, endpoints: SessionEndpoints) -> Self {
		let state = SessionState {
			is_authenticated: client.store().is_logged_in(),
			..Default::default()
		};

		Self {
			client,
			endpoints,
			state: Arc::new(RwLock::new(state)),
			loads: Default::default(),
		}
	}

	/// Pipeline used by every operation.
	pub fn client(&self) -> &ApiClient<T> {
		&self.client
	}

	/// Endpoints used by every operation.
	pub fn endpoints(&self) -> &SessionEndpoints {
		&self.endpoints
	}

	/// Snapshot of the current state.
	pub fn state(&self) -> SessionState {
		self.state.read().clone()
	}

	/// `true` iff a non-expired access token is stored right now.
	pub fn is_logged_in(&self) -> bool {
		self.client.store().is_logged_in()
	}

	/// Probes the stored token at startup.
	///
	/// With a valid token the user and storage summary are loaded (failures are logged, not
	/// fatal); otherwise the session is cleared. Returns whether the session is authenticated.
	pub async fn init(&self) -> bool {
		CallSpan::session("init")
			.instrument(async {
				if !self.is_logged_in() {
					self.clear_quietly("init");

					return false;
				}

				self.state.write().is_authenticated = true;

				if let Err(err) = self.fetch_current_user().await {
					obs::trace_nonfatal("init", &err);
				}

				self.fetch_storage_info().await;

				self.is_logged_in()
			})
			.await
	}

	/// Signs in with `credentials` and stores the issued tokens.
	///
	/// An expired access token left in the store is discarded first; it would otherwise make
	/// the pipeline refuse the sign-in call itself.
	pub async fn login(&self, credentials: Value) -> AuthOutcome {
		self.discard_stale_token("login");

		let _loading = self.begin_loading();

		CallSpan::session("login")
			.instrument(async {
				let body = match self.client.post(&self.endpoints.login, credentials).await {
					Ok(body) => body,
					Err(err) => return AuthOutcome::from_error(&err, LOGIN_UNREACHABLE),
				};

				match grant_of(&body) {
					Ok(Some(grant)) => match self.install(grant).await {
						Ok(user) =>
							AuthOutcome::succeeded(message_or(&body, LOGIN_SUCCEEDED), user),
						Err(err) => AuthOutcome::from_error(&err, LOGIN_FAILED),
					},
					Ok(None) => AuthOutcome::failed(message_or(&body, LOGIN_FAILED)),
					Err(err) => AuthOutcome::from_error(&err, LOGIN_FAILED),
				}
			})
			.await
	}

	/// Registers an account.
	///
	/// When the reply carries no access token, signs in with the submitted `email` and
	/// `password`; registration still succeeds if that sign-in does not.
	pub async fn register(&self, data: Value) -> AuthOutcome {
		self.discard_stale_token("register");

		let _loading = self.begin_loading();

		CallSpan::session("register")
			.instrument(async {
				let body = match self.client.post(&self.endpoints.register, data.clone()).await {
					Ok(body) => body,
					Err(err) => return AuthOutcome::from_error(&err, REGISTER_UNREACHABLE),
				};

				if !is_success(&body) {
					return AuthOutcome::failed(message_or(&body, REGISTER_FAILED));
				}

				match grant_of(&body) {
					Ok(Some(grant)) => match self.install(grant).await {
						Ok(user) =>
							AuthOutcome::succeeded(message_or(&body, REGISTER_SUCCEEDED), user),
						Err(err) => AuthOutcome::from_error(&err, REGISTER_FAILED),
					},
					Ok(None) => self.login_after_register(&data, message_of(&body)).await,
					Err(err) => {
						obs::trace_nonfatal("register", &err);

						self.login_after_register(&data, message_of(&body)).await
					},
				}
			})
			.await
	}

	/// Local sign-out: clears the state and removes both tokens.
	pub fn logout(&self) -> Result<()> {
		self.clear()
	}

	/// Loads the signed-in user's profile.
	///
	/// Returns `Ok(None)` without a network call when no valid token is stored. A failed fetch
	/// only clears the session when the backend reported an expired credential or the local
	/// token has expired meanwhile; transient failures keep the token.
	pub async fn fetch_current_user(&self) -> Result<Option<UserProfile>> {
		CallSpan::session("fetch_current_user")
			.instrument(async {
				if !self.is_logged_in() {
					self.clear()?;

					return Ok(None);
				}

				match self.client.get(&self.endpoints.current_user, None).await {
					Ok(body) => {
						let Some(data) = success_data(&body) else {
							return Ok(None);
						};
						let user = decode::<UserProfile>(data)?;

						self.state.write().set_user(user.clone());

						Ok(Some(user))
					},
					Err(err) => {
						if err.is_auth_expired() || !self.is_logged_in() {
							self.clear_quietly("fetch_current_user");
						}

						Err(err)
					},
				}
			})
			.await
	}

	/// Loads the storage quota summary, converting byte counts to gigabytes.
	///
	/// Failures are logged and yield `None`.
	pub async fn fetch_storage_info(&self) -> Option<StorageSummary> {
		if !self.is_logged_in() {
			return None;
		}

		match CallSpan::session("fetch_storage_info").instrument(self.load_storage()).await {
			Ok(Some(summary)) => {
				self.state.write().storage_info = summary.clone();

				Some(summary)
			},
			Ok(None) => None,
			Err(err) => {
				obs::trace_nonfatal("fetch_storage_info", &err);

				if err.is_auth_expired() {
					self.clear_quietly("fetch_storage_info");
				}

				None
			},
		}
	}

	/// Saves profile changes and installs the returned profile.
	pub async fn update_profile(&self, data: Value) -> AuthOutcome {
		let _loading = self.begin_loading();

		CallSpan::session("update_profile")
			.instrument(async {
				let request = ApiRequest::put(&self.endpoints.profile, data);
				let body = match self.request_json(request).await {
					Ok(body) => body,
					Err(err) => return AuthOutcome::from_error(&err, UPDATE_UNREACHABLE),
				};
				let Some(data) = success_data(&body) else {
					return AuthOutcome::failed(message_or(&body, UPDATE_FAILED));
				};

				match decode::<UserProfile>(data) {
					Ok(user) => {
						self.state.write().set_user(user.clone());

						AuthOutcome::succeeded(UPDATE_SUCCEEDED, Some(user))
					},
					Err(err) => AuthOutcome::from_error(&err, UPDATE_FAILED),
				}
			})
			.await
	}

	/// Changes the password.
	pub async fn change_password(&self, data: Value) -> AuthOutcome {
		let _loading = self.begin_loading();
		let request = ApiRequest::put(&self.endpoints.password, data);

		match CallSpan::session("change_password").instrument(self.request_json(request)).await {
			Ok(body) if is_success(&body) =>
				AuthOutcome::succeeded(message_or(&body, PASSWORD_SUCCEEDED), None),
			Ok(body) => AuthOutcome::failed(message_or(&body, PASSWORD_FAILED)),
			Err(err) => AuthOutcome::from_error(&err, PASSWORD_UNREACHABLE),
		}
	}

	/// Exchanges the stored refresh token for a new token pair.
	///
	/// Only ever called explicitly; a 401 never triggers it. A rejected refresh clears the
	/// session. Returns whether new tokens were stored.
	pub async fn refresh_tokens(&self) -> bool {
		CallSpan::session("refresh_tokens")
			.instrument(async {
				let Some(refresh) = self.client.store().get_refresh() else {
					return false;
				};
				let body = json!({ "refreshToken": refresh.expose() });
				let grant = match self.client.post(&self.endpoints.refresh, body).await {
					Ok(body) => grant_of(&body),
					Err(err) => Err(err),
				};
				let stored = match grant {
					Ok(Some(grant)) => self.store_tokens(&grant).map(|_| true),
					Ok(None) => Ok(false),
					Err(err) => Err(err),
				};

				match stored {
					Ok(stored) => stored,
					Err(err) => {
						obs::trace_nonfatal("refresh_tokens", &err);

						if !err.is_duplicate() {
							self.clear_quietly("refresh_tokens");
						}

						false
					},
				}
			})
			.await
	}

	/// Guard-facing validity probe.
	///
	/// The stored token must decode, carry a future `exp`, and name a `sub`; otherwise the
	/// session is cleared. When no user is loaded yet it is fetched, and a failed fetch does not
	/// by itself invalidate a good token.
	pub async fn check_auth_status(&self) -> bool {
		let valid = self
			.client
			.store()
			.get()
			.and_then(|token| token.claims())
			.is_some_and(|claims| !claims.is_expired() && claims.sub().is_some());

		if !valid {
			self.clear_quietly("check_auth_status");

			return false;
		}

		let has_user = self.state.read().user.is_some();

		if has_user {
			return true;
		}
		if let Err(err) = self.fetch_current_user().await {
			obs::trace_nonfatal("check_auth_status", &err);
		}

		self.is_logged_in()
	}

	/// Runs `request` through the pipeline, clearing the session on an auth-expired failure.
	pub async fn request(&self, request: ApiRequest) -> Result<Payload> {
		let result = self.client.request(request).await;

		if result.as_ref().is_err_and(Error::is_auth_expired) {
			self.clear_quietly("request");
		}

		result
	}

	async fn load_storage(&self) -> Result<Option<StorageSummary>> {
		let body = self.client.get(&self.endpoints.storage, None).await?;
		let Some(data) = success_data(&body) else {
			return Ok(None);
		};

		Ok(Some(decode::<StorageUsage>(data)?.into()))
	}

	async fn request_json(&self, request: ApiRequest) -> Result<Value> {
		Ok(self.request(request).await?.into_json().unwrap_or_default())
	}

	async fn login_after_register(&self, data: &Value, message: Option<String>) -> AuthOutcome {
		let credentials = json!({ "email": data.get("email"), "password": data.get("password") });
		let grant = match self.client.post(&self.endpoints.login, credentials).await {
			Ok(body) => grant_of(&body),
			Err(err) => Err(err),
		};
		let installed = match grant {
			Ok(Some(grant)) => self.install(grant).await.map(Some),
			Ok(None) => Ok(None),
			Err(err) => Err(err),
		};

		let (fallback, user) = match installed {
			Ok(Some(user)) => (REGISTER_AUTO_LOGIN, user),
			Ok(None) => (REGISTER_MANUAL_LOGIN, None),
			Err(err) => {
				obs::trace_nonfatal("register", &err);

				(REGISTER_MANUAL_LOGIN, None)
			},
		};

		AuthOutcome::succeeded(message.unwrap_or_else(|| fallback.into()), user)
	}

	// Stores the grant's tokens and installs (or fetches) the user.
	async fn install(&self, grant: TokenGrant) -> Result<Option<UserProfile>> {
		self.store_tokens(&grant)?;
		self.state.write().is_authenticated = true;

		match grant.user {
			Some(user) => {
				self.state.write().set_user(user.clone());

				Ok(Some(user))
			},
			None => Ok(self.fetch_current_user().await.unwrap_or_else(|err| {
				obs::trace_nonfatal("fetch_current_user", &err);

				None
			})),
		}
	}

	fn store_tokens(&self, grant: &TokenGrant) -> Result<()> {
		let store = self.client.store();

		if let Some(access) = grant.access_token.as_deref() {
			store.save(access)?;
		}
		if let Some(refresh) = grant.refresh_token.as_deref() {
			store.save_refresh(refresh)?;
		}

		Ok(())
	}

	fn clear(&self) -> Result<()> {
		self.state.write().clear();
		self.client.store().remove()?;

		Ok(())
	}

	fn discard_stale_token(&self, operation: &'static str) {
		if self.client.store().get().is_some() && !self.is_logged_in() {
			self.clear_quietly(operation);
		}
	}

	fn clear_quietly(&self, operation: &'static str) {
		if let Err(err) = self.clear() {
			obs::trace_nonfatal(operation, &err);
		}
	}

	fn begin_loading(&self) -> LoadingGuard<'_> {
		let mut state = self.state.write();

		self.loads.fetch_add(1, Ordering::Relaxed);
		state.loading = true;

		LoadingGuard { state: &self.state, loads: &self.loads }
	}
}
impl<T> Clone for Session<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			client: self.client.clone(),
			endpoints: self.endpoints.clone(),
			state: self.state.clone(),
			loads: self.loads.clone(),
		}
	}
}
impl<T> Debug for Session<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("endpoints", &self.endpoints)
			.field("state", &*self.state.read())
			.finish_non_exhaustive()
	}
}

// The flag drops only when the last overlapping operation finishes.
struct LoadingGuard<'a> {
	state: &'a RwLock<SessionState>,
	loads: &'a AtomicUsize,
}
impl Drop for LoadingGuard<'_> {
	fn drop(&mut self) {
		let mut state = self.state.write();

		if self.loads.fetch_sub(1, Ordering::Relaxed) == 1 {
			state.loading = false;
		}
	}
}

// Envelope success as the session reads it: `code == 200` or `success == true`.
fn is_success(body: &Value) -> bool {
	body.get("code").and_then(Value::as_f64) == Some(200.)
		|| body.get("success").and_then(Value::as_bool) == Some(true)
}

fn success_data(body: &Value) -> Option<Value> {
	if !is_success(body) {
		return None;
	}

	body.get("data").filter(|data| !data.is_null()).cloned()
}

fn grant_of(body: &Value) -> Result<Option<TokenGrant>> {
	let Some(data) = success_data(body) else {
		return Ok(None);
	};
	let grant = decode::<TokenGrant>(data)?;

	Ok(grant.access_token.is_some().then_some(grant))
}

fn message_of(body: &Value) -> Option<String> {
	body.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()).map(str::to_owned)
}

fn message_or(body: &Value, fallback: &str) -> String {
	message_of(body).unwrap_or_else(|| fallback.to_owned())
}

fn decode<D>(value: Value) -> Result<D>
where
	D: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(Error::decode)
}
