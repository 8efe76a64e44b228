//! Client configuration: base URL, timeout, and classification policy.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::ConfigError, http::DEFAULT_TIMEOUT, normalize::NormalizePolicy};

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the per-call timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";

/// Settings shared by every call an [`ApiClient`](crate::client::ApiClient) makes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Prefix joined with relative request paths; `None` sends paths as given.
	pub base_url: Option<Url>,
	/// Per-call timeout.
	pub timeout: StdDuration,
	/// Response classification policy.
	pub policy: NormalizePolicy,
}
impl ClientConfig {
	/// Starts a builder with the default timeout and policy.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Reads [`ENV_BASE_URL`] and [`ENV_TIMEOUT_SECS`] from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`from_env`](Self::from_env) with a caller-supplied variable lookup.
	///
	/// Unset or blank variables fall back to the defaults.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let mut builder = Self::builder();

		if let Some(raw) = read(ENV_BASE_URL) {
			let url = Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidBaseUrl { value: raw.clone(), source })?;

			builder = builder.base_url(url);
		}
		if let Some(raw) = read(ENV_TIMEOUT_SECS) {
			let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnv {
				name: ENV_TIMEOUT_SECS,
				reason: e.to_string(),
			})?;

			builder = builder.timeout(StdDuration::from_secs(secs));
		}

		builder.build()
	}

	/// Joins `path` onto the base URL.
	///
	/// Absolute URLs (`scheme://` or protocol-relative `//`) are used as given. Otherwise the
	/// base URL's trailing slashes and the path's leading slashes collapse into a single `/`.
	pub fn resolve_url(&self, path: &str) -> String {
		let Some(base) = self.base_url.as_ref().filter(|_| !is_absolute(path)) else {
			return path.to_owned();
		};
		let base = base.as_str().trim_end_matches('/');

		if path.is_empty() {
			return base.to_owned();
		}

		format!("{base}/{}", path.trim_start_matches('/'))
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self { base_url: None, timeout: DEFAULT_TIMEOUT, policy: NormalizePolicy::default() }
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL, if any.
	pub base_url: Option<Url>,
	/// Per-call timeout.
	pub timeout: StdDuration,
	/// Classification policy.
	pub policy: NormalizePolicy,
}
impl ClientConfigBuilder {
	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the per-call timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the classification policy.
	pub fn policy(mut self, policy: NormalizePolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.timeout.is_zero() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(ClientConfig { base_url: self.base_url, timeout: self.timeout, policy: self.policy })
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		let ClientConfig { base_url, timeout, policy } = ClientConfig::default();

		Self { base_url, timeout, policy }
	}
}

fn is_absolute(path: &str) -> bool {
	if path.starts_with("//") {
		return true;
	}

	let Some((scheme, rest)) = path.split_once(':') else {
		return false;
	};
	let mut chars = scheme.chars();

	rest.starts_with("//")
		&& chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
