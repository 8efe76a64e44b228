//! Transport primitives for backend calls.
//!
//! [`HttpTransport`] is the pipeline's only dependency on an HTTP stack. It receives a fully
//! decorated [`TransportRequest`] (absolute or relative URL, optional bearer credential, query,
//! body, timeout) and resolves to a [`TransportResponse`] whenever the backend answered at all,
//! whatever the status. Only failures without any response (DNS, TCP, TLS, timeout) surface as
//! [`TransportError`], and implementations must hand the underlying error through untouched.

// std
use std::time::Duration as StdDuration;
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::{
	Method as ReqwestMethod, RequestBuilder,
	header::CONTENT_TYPE,
	multipart::{Form, Part},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{Method, RequestBody},
	token::TokenSecret,
};
#[cfg(feature = "reqwest")] use crate::request::FormPart;

/// Default upper bound applied to every network call.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Executes decorated requests against the backend.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request`, resolving to the reply for any HTTP status.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Request as handed to the transport after the interceptor ran.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP verb.
	pub method: Method,
	/// Resolved URL (base URL joined with the request path).
	pub url: String,
	/// Bearer credential to send, if any.
	pub bearer: Option<TokenSecret>,
	/// Query parameters.
	pub query: Option<Value>,
	/// Request body.
	pub body: RequestBody,
	/// Per-call timeout.
	pub timeout: StdDuration,
}
impl TransportRequest {
	/// Value of the `Authorization` header, when a bearer credential is attached.
	pub fn authorization(&self) -> Option<String> {
		self.bearer.as_ref().map(|token| format!("Bearer {}", token.expose()))
	}

	/// Query parameters flattened into string pairs.
	///
	/// `null` entries are dropped, arrays repeat the key, nested objects are sent as JSON text.
	pub fn query_pairs(&self) -> Vec<(String, String)> {
		let Some(Value::Object(map)) = &self.query else {
			return Vec::new();
		};
		let mut pairs = Vec::with_capacity(map.len());

		for (key, value) in map {
			match value {
				Value::Null => {},
				Value::Array(items) =>
					for item in items.iter().filter(|item| !item.is_null()) {
						pairs.push((key.clone(), query_scalar(item)));
					},
				other => pairs.push((key.clone(), query_scalar(other))),
			}
		}

		pairs
	}
}

fn query_scalar(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Raw reply captured from the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header, when present.
	pub content_type: Option<String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Builds a response without a content type.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, content_type: None, body: body.into() }
	}

	/// Attaches a content type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose calls give up after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}

	fn prepare(&self, request: TransportRequest) -> Result<RequestBuilder, TransportError> {
		let method = match request.method {
			Method::Get => ReqwestMethod::GET,
			Method::Post => ReqwestMethod::POST,
			Method::Put => ReqwestMethod::PUT,
			Method::Patch => ReqwestMethod::PATCH,
			Method::Delete => ReqwestMethod::DELETE,
		};
		let pairs = request.query_pairs();
		let mut builder = self.0.request(method, &request.url).timeout(request.timeout);

		if !pairs.is_empty() {
			builder = builder.query(&pairs);
		}
		if let Some(token) = &request.bearer {
			builder = builder.bearer_auth(token.expose());
		}

		builder = match request.body {
			RequestBody::Empty => builder,
			RequestBody::Json(value) => builder.json(&value),
			RequestBody::Multipart(form) => {
				let mut multipart = Form::new();

				for (name, part) in form.parts() {
					let part = match part {
						FormPart::Text(value) => Part::text(value.clone()),
						FormPart::File { file_name, mime, bytes } => {
							let file = Part::bytes(bytes.clone()).file_name(file_name.clone());

							match mime {
								Some(mime) => file.mime_str(mime)?,
								None => file,
							}
						},
					};

					multipart = multipart.part(name.to_owned(), part);
				}

				builder.multipart(multipart)
			},
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.prepare(request)?.send().await?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, content_type, body })
		})
	}
}
