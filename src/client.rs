//! The request pipeline: de-duplicate, authorize, send, normalize.

pub mod config;
pub mod metrics;

pub use config::*;
pub use metrics::*;

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	http::{HttpTransport, TransportRequest},
	interceptor::AuthInterceptor,
	normalize::{self, BinaryPayload, Payload},
	obs::{self, CallSpan, RequestOutcome},
	pending::{Fingerprint, PendingRequests},
	request::{ApiRequest, Method, MultipartForm},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Issues backend calls through the shared pipeline.
///
/// Each call is fingerprinted and rejected outright if an identical one is still in flight.
/// The stored access token is then checked and attached, the transport sends the request, the
/// fingerprint is released, and the reply is normalized. Clones share the transport, the
/// in-flight registry, and the counters.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Base URL, timeout, and classification policy.
	pub config: ClientConfig,
	/// Shared outcome counters.
	pub metrics: Arc<RequestMetrics>,
	interceptor: AuthInterceptor,
	pending: PendingRequests,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client around a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let interceptor = AuthInterceptor::new(store)
			.with_expired_message(config.policy.messages.session_expired.clone());

		Self {
			transport: transport.into(),
			config,
			metrics: Default::default(),
			interceptor,
			pending: PendingRequests::default(),
		}
	}

	/// Token store consulted before every call.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		self.interceptor.store()
	}

	/// Registry of in-flight fingerprints.
	pub fn pending(&self) -> &PendingRequests {
		&self.pending
	}

	/// Runs `request` through the full pipeline.
	pub async fn request(&self, request: ApiRequest) -> Result<Payload> {
		let method = request.method;
		let fingerprint = Fingerprint::of(&request);
		let span = CallSpan::request(method, &fingerprint);

		self.record(method, RequestOutcome::Attempt);

		let result = span.instrument(self.dispatch(request, fingerprint)).await;

		self.record(method, RequestOutcome::of(&result));

		result
	}

	/// `GET path`, returning the normalized JSON value.
	pub async fn get(&self, path: &str, query: Option<Value>) -> Result<Value> {
		self.request_json(with_query(ApiRequest::get(path), query)).await
	}

	/// `POST path` with a JSON body.
	pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
		self.request_json(ApiRequest::post(path, body)).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
		self.request_json(ApiRequest::put(path, body)).await
	}

	/// `PATCH path` with a JSON body.
	pub async fn patch(&self, path: &str, body: Value) -> Result<Value> {
		self.request_json(ApiRequest::patch(path, body)).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str, query: Option<Value>) -> Result<Value> {
		self.request_json(with_query(ApiRequest::delete(path), query)).await
	}

	/// Multipart `POST path`.
	pub async fn upload(&self, path: &str, form: MultipartForm) -> Result<Value> {
		self.request_json(ApiRequest::upload(path, form)).await
	}

	/// `GET path` with the reply handed back as raw bytes.
	pub async fn download(&self, path: &str, query: Option<Value>) -> Result<BinaryPayload> {
		match self.request(with_query(ApiRequest::download(path), query)).await? {
			Payload::Binary(binary) => Ok(binary),
			Payload::Json(value) => Ok(BinaryPayload {
				bytes: value.to_string().into_bytes(),
				content_type: Some("application/json".into()),
			}),
		}
	}

	async fn request_json(&self, request: ApiRequest) -> Result<Value> {
		Ok(match self.request(request).await? {
			Payload::Json(value) => value,
			Payload::Binary(binary) => Value::String(String::from_utf8_lossy(&binary.bytes).into()),
		})
	}

	async fn dispatch(&self, request: ApiRequest, fingerprint: Fingerprint) -> Result<Payload> {
		let Some(pending) = self.pending.acquire(fingerprint.clone()) else {
			let err = Error::Duplicate {
				fingerprint: fingerprint.digest(),
				message: self.config.policy.messages.duplicate.clone(),
			};

			obs::trace_rejection(&err);

			return Err(err);
		};
		let bearer = self.interceptor.authorize().inspect_err(obs::trace_rejection)?;
		let ApiRequest { method, path, query, body, response_type } = request;
		let outbound = TransportRequest {
			method,
			url: self.config.resolve_url(&path),
			bearer,
			query,
			body,
			timeout: self.config.timeout,
		};
		let response = self.transport.send(outbound).await;

		drop(pending);

		Ok(normalize::normalize_response(&self.config.policy, &path, response_type, response?)?)
	}

	fn record(&self, method: Method, outcome: RequestOutcome) {
		self.metrics.record(outcome);
		obs::record_request_outcome(method, outcome);
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by reqwest, honoring the configured timeout.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		let transport = ReqwestTransport::with_timeout(config.timeout)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			interceptor: self.interceptor.clone(),
			pending: self.pending.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("in_flight", &self.pending.len())
			.finish_non_exhaustive()
	}
}

fn with_query(request: ApiRequest, query: Option<Value>) -> ApiRequest {
	match query {
		Some(query) => request.with_query(query),
		None => request,
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		error::{FailureCategory, TransportError},
		http::TransportResponse,
		store::MemoryTokenStore,
	};

	#[derive(Debug, ThisError)]
	#[error("connection refused")]
	struct Refused;

	fn client(
		store: &MemoryTokenStore,
		transport: &ScriptedTransport,
	) -> ApiClient<ScriptedTransport> {
		let base = Url::parse("https://api.example.com").expect("Base URL fixture should parse.");
		let config =
			ClientConfig::builder().base_url(base).build().expect("Config fixture should build.");

		ApiClient::with_transport(config, Arc::new(store.clone()), transport.clone())
	}

	#[tokio::test]
	async fn live_token_is_attached_and_url_resolved() {
		let token = live_token("7");
		let store = MemoryTokenStore::seeded(token.clone(), None);
		let transport = ScriptedTransport::default();

		transport.push(Reply::json(200, json!({ "code": 200, "data": { "id": 7 } })));

		let body = client(&store, &transport)
			.get("/api/users/me", Some(json!({ "expand": "storage" })))
			.await
			.expect("Request should succeed.");
		let seen = transport.seen();

		assert_eq!(body["data"]["id"], 7);
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].url, "https://api.example.com/api/users/me");
		assert_eq!(seen[0].authorization(), Some(format!("Bearer {token}")));
		assert_eq!(seen[0].query, Some(json!({ "expand": "storage" })));
		assert_eq!(seen[0].timeout, StdDuration::from_secs(10));
	}

	#[tokio::test]
	async fn missing_token_sends_unauthenticated() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default();

		client(&store, &transport)
			.post("/api/auth/login", json!({ "email": "a@b.c" }))
			.await
			.expect("Request should succeed.");

		assert!(transport.seen()[0].bearer.is_none());
	}

	#[tokio::test]
	async fn expired_token_never_reaches_the_network() {
		let store = MemoryTokenStore::seeded(expired_token("7"), None);
		let transport = ScriptedTransport::default();
		let client = client(&store, &transport);
		let err = client.get("/api/users/me", None).await.expect_err("Expired token should fail.");

		assert!(matches!(err, Error::SessionExpired { .. }));
		assert_eq!(err.to_string(), "登录已过期，请重新登录");
		assert!(transport.seen().is_empty());
		assert!(client.pending().is_empty());
		assert_eq!(client.metrics.expired(), 1);
	}

	#[tokio::test]
	async fn concurrent_duplicate_is_rejected_and_fingerprint_released() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default().gated();
		let client = client(&store, &transport);
		let body = json!({ "title": "a", "tags": [1, 2] });
		let reordered = json!({ "tags": [1, 2], "title": "a" });
		let (first, second) = tokio::join!(client.post("/api/notes", body.clone()), async {
			let second = client.post("/api/notes", reordered).await;

			transport.release();

			second
		});

		assert!(first.is_ok());

		let err = second.expect_err("Duplicate request should be rejected.");

		assert!(err.is_duplicate());
		assert_eq!(err.to_string(), "请求重复");
		assert_eq!(transport.seen().len(), 1);
		assert!(client.pending().is_empty());
		assert_eq!(client.metrics.duplicates(), 1);

		let again = tokio::join!(client.post("/api/notes", body), async { transport.release() });

		assert!(again.0.is_ok());
	}

	#[tokio::test]
	async fn distinct_requests_run_concurrently() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default().gated();
		let client = client(&store, &transport);
		let (a, b, _) = tokio::join!(
			client.get("/api/files", Some(json!({ "page": 1 }))),
			client.get("/api/files", Some(json!({ "page": 2 }))),
			async {
				transport.release();
				transport.release();
			}
		);

		assert!(a.is_ok());
		assert!(b.is_ok());
		assert_eq!(transport.seen().len(), 2);
	}

	#[tokio::test]
	async fn cancelled_call_releases_its_fingerprint() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default().gated();
		let client = client(&store, &transport);
		let timed_out =
			tokio::time::timeout(StdDuration::from_millis(20), client.get("/api/slow", None)).await;

		assert!(timed_out.is_err());
		assert!(client.pending().is_empty());
	}

	#[tokio::test]
	async fn transport_failures_pass_through_untouched() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default();
		let client = client(&store, &transport);

		transport.push(Reply::Fail(TransportError::network(Refused)));

		let err = client.delete("/api/files/1", None).await.expect_err("Transport should fail.");
		let Error::Transport(inner) = err else {
			panic!("Transport failures should keep their variant.");
		};

		assert!(inner.into_source().downcast_ref::<Refused>().is_some());
		assert!(client.pending().is_empty());
		assert_eq!(client.metrics.failures(), 1);
	}

	#[tokio::test]
	async fn status_failures_are_classified_against_the_request_path() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default();
		let client = client(&store, &transport);

		transport.push(Reply::json(404, json!({ "message": "card missing" })));
		transport.push(Reply::json(401, json!({ "message": "jwt expired" })));

		let not_found = client.get("/api/card-keys/ABC", None).await.expect_err("404 should fail.");
		let unauthorized = client.get("/api/users/me", None).await.expect_err("401 should fail.");

		assert_eq!(not_found.category(), Some(FailureCategory::NotFound));
		assert_eq!(not_found.to_string(), "卡密不存在或参数错误");
		assert!(unauthorized.is_auth_expired());
		assert_eq!(unauthorized.to_string(), "jwt expired");
	}

	#[tokio::test]
	async fn downloads_return_raw_bytes() {
		let store = MemoryTokenStore::default();
		let transport = ScriptedTransport::default();
		let client = client(&store, &transport);

		transport.push(Reply::Respond(
			TransportResponse::new(200, b"%PDF".to_vec()).with_content_type("application/pdf"),
		));

		let file =
			client.download("/api/files/1/raw", None).await.expect("Download should succeed.");

		assert_eq!(file.bytes, b"%PDF".to_vec());
		assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
		assert_eq!(client.metrics.attempts(), 1);
		assert_eq!(client.metrics.successes(), 1);
	}
}
