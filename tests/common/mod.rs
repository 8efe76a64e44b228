//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use serde_json::{Value, json};
use time::OffsetDateTime;
// self
use bearer_client::{
	client::{ClientConfig, ReqwestApiClient},
	store::{MemoryTokenStore, TokenStore},
	url::Url,
};

/// Encodes an unsigned `header.payload.signature` token around the provided claims.
pub fn mint_token(claims: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.signature")
}

/// Token expiring one hour from now.
pub fn live_token(sub: &str) -> String {
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 3_600;

	mint_token(json!({ "sub": sub, "exp": exp }))
}

/// Token that expired one hour ago.
pub fn expired_token(sub: &str) -> String {
	let exp = OffsetDateTime::now_utc().unix_timestamp() - 3_600;

	mint_token(json!({ "sub": sub, "exp": exp }))
}

/// Config pointing at the mock server with the given per-call timeout.
pub fn config_for(server: &MockServer, timeout: StdDuration) -> ClientConfig {
	ClientConfig::builder()
		.base_url(Url::parse(&server.base_url()).expect("Mock server URL should parse."))
		.timeout(timeout)
		.build()
		.expect("Mock server config should build.")
}

/// Reqwest-backed client sharing `store`, with the default timeout.
pub fn build_client(server: &MockServer, store: Arc<dyn TokenStore>) -> ReqwestApiClient {
	build_client_with_timeout(server, store, StdDuration::from_secs(5))
}

/// Reqwest-backed client sharing `store`.
pub fn build_client_with_timeout(
	server: &MockServer,
	store: Arc<dyn TokenStore>,
	timeout: StdDuration,
) -> ReqwestApiClient {
	ReqwestApiClient::new(config_for(server, timeout), store)
		.expect("Reqwest client should build for the mock server.")
}

/// Store seeded with a live access token (and optionally a refresh token).
pub fn seeded_store(access: &str, refresh: Option<&str>) -> Arc<MemoryTokenStore> {
	Arc::new(MemoryTokenStore::seeded(access, refresh))
}
