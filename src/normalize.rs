//! Response normalization: one success value or one classified failure per reply.
//!
//! The backend answers in several shapes. A `success` flag envelope, a numeric `code` envelope,
//! a bare body, a binary download, or an error status carrying `{message}`. Everything here is a
//! pure function of the reply plus the [`NormalizePolicy`]; transport failures never reach this
//! module.

pub mod policy;

pub use policy::*;

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{ApiFailure, FailureCategory},
	http::TransportResponse,
	request::ResponseType,
};

/// Successful reply after normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	/// JSON reply; envelopes are kept whole so callers can read `data`, `message`, or `code`.
	Json(Value),
	/// Binary reply requested with [`ResponseType::Blob`].
	Binary(BinaryPayload),
}
impl Payload {
	/// JSON value, if this is a JSON payload.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			Self::Binary(_) => None,
		}
	}

	/// Consumes the payload and returns the JSON value, if any.
	pub fn into_json(self) -> Option<Value> {
		match self {
			Self::Json(value) => Some(value),
			Self::Binary(_) => None,
		}
	}
}

/// Raw bytes of a binary download.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryPayload {
	/// Body bytes.
	pub bytes: Vec<u8>,
	/// `Content-Type` reported by the backend.
	pub content_type: Option<String>,
}
impl Debug for BinaryPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BinaryPayload")
			.field("len", &self.bytes.len())
			.field("content_type", &self.content_type)
			.finish()
	}
}

/// Turns a raw reply into a payload or a classified failure.
///
/// `path` is the request path as issued; it drives the 404 overrides.
pub fn normalize_response(
	policy: &NormalizePolicy,
	path: &str,
	response_type: ResponseType,
	response: TransportResponse,
) -> Result<Payload, ApiFailure> {
	if !response.is_success() {
		return Err(classify_status(policy, path, response.status, &response.body));
	}
	if response_type == ResponseType::Blob {
		return Ok(Payload::Binary(BinaryPayload {
			bytes: response.body,
			content_type: response.content_type,
		}));
	}

	let status = response.status;
	let body = parse_body(&response.body);

	if body.is_null() {
		return Err(ApiFailure::new(
			FailureCategory::ServerError,
			policy.messages.empty_response.clone(),
		)
		.with_status(status));
	}

	normalize_body(policy, body).map(Payload::Json)
}

/// Interprets a 2xx JSON body.
///
/// A `success` field wins over a `code` field; with neither, the body itself is the success
/// value. Applying this to its own output returns the same value.
pub fn normalize_body(policy: &NormalizePolicy, body: Value) -> Result<Value, ApiFailure> {
	let succeeded = if let Some(flag) = body.get("success") {
		flag.as_bool() == Some(true)
	} else if let Some(code) = body.get("code") {
		code.as_f64() == Some(200.)
	} else {
		return Ok(body);
	};

	if succeeded { Ok(body) } else { Err(envelope_failure(policy, &body)) }
}

/// Classifies a non-2xx reply by status.
///
/// A non-empty `message` from a JSON body wins over the category default, except on a 404
/// whose path matches a [`NotFoundRule`], where the rule's message wins.
pub fn classify_status(
	policy: &NormalizePolicy,
	path: &str,
	status: u16,
	body: &[u8],
) -> ApiFailure {
	let category = match status {
		401 => FailureCategory::AuthExpired,
		403 => FailureCategory::Forbidden,
		404 => FailureCategory::NotFound,
		409 => FailureCategory::Conflict,
		500 => FailureCategory::ServerError,
		_ => FailureCategory::Generic,
	};
	let path_override = match category {
		FailureCategory::NotFound => policy.not_found_override(path).map(str::to_owned),
		_ => None,
	};
	let message = path_override
		.or_else(|| serde_json::from_slice::<Value>(body).ok().and_then(|v| message_of(&v)))
		.unwrap_or_else(|| policy.messages.for_category(category).to_owned());

	ApiFailure::new(category, message).with_status(status)
}

fn envelope_failure(policy: &NormalizePolicy, body: &Value) -> ApiFailure {
	match message_of(body) {
		Some(message) if policy.is_credential_failure(&message) =>
			ApiFailure::new(FailureCategory::AuthExpired, policy.messages.session_expired.clone()),
		Some(message) => ApiFailure::new(FailureCategory::Generic, message),
		None => ApiFailure::new(FailureCategory::Generic, policy.messages.request_failed.clone()),
	}
}

fn message_of(body: &Value) -> Option<String> {
	body.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()).map(str::to_owned)
}

// Anything that is not JSON is kept as text, so a zero-length body reads as `""`.
fn parse_body(bytes: &[u8]) -> Value {
	serde_json::from_slice(bytes)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn json_reply(status: u16, body: Value) -> TransportResponse {
		TransportResponse::new(status, body.to_string())
	}

	fn normalize(status: u16, body: Value) -> Result<Payload, ApiFailure> {
		let policy = NormalizePolicy::default();

		normalize_response(&policy, "/api/x", ResponseType::Json, json_reply(status, body))
	}

	#[test]
	fn success_envelopes_are_returned_whole() {
		let flag = json!({ "success": true, "data": { "id": 1 }, "message": "ok" });
		let code = json!({ "code": 200, "data": [1, 2] });
		let bare = json!({ "id": 1, "name": "n" });

		assert_eq!(normalize(200, flag.clone()), Ok(Payload::Json(flag)));
		assert_eq!(normalize(200, code.clone()), Ok(Payload::Json(code)));
		assert_eq!(normalize(201, bare.clone()), Ok(Payload::Json(bare)));
	}

	#[test]
	fn success_flag_takes_precedence_over_code() {
		let err = normalize(200, json!({ "success": false, "code": 200, "message": "余额不足" }))
			.expect_err("A false success flag should fail.");

		assert_eq!(err, ApiFailure::new(FailureCategory::Generic, "余额不足"));
		assert!(normalize(200, json!({ "success": true, "code": 500 })).is_ok());
	}

	#[test]
	fn body_failures_use_message_or_fallback() {
		let coded = normalize(200, json!({ "code": 400 })).expect_err("Code 400 should fail.");
		let blank = normalize(200, json!({ "success": false, "message": "" }))
			.expect_err("A false success flag should fail.");

		assert_eq!(coded.message, "请求失败");
		assert_eq!(coded.status, None);
		assert_eq!(blank.message, "请求失败");
	}

	#[test]
	fn credential_phrases_become_auth_expired() {
		for message in ["Token无效", "Token过期，请刷新", "未授权访问"] {
			let err = normalize(200, json!({ "code": 401, "message": message }))
				.expect_err("Credential failures should fail.");

			assert_eq!(err.category, FailureCategory::AuthExpired);
			assert_eq!(err.message, SESSION_EXPIRED_MESSAGE);
		}
	}

	#[test]
	fn null_bodies_are_server_errors() {
		let policy = NormalizePolicy::default();

		for body in [b"null".to_vec(), b" null\n".to_vec()] {
			let err = normalize_response(
				&policy,
				"/api/x",
				ResponseType::Json,
				TransportResponse::new(200, body),
			)
			.expect_err("Null replies should fail.");

			assert_eq!(err.category, FailureCategory::ServerError);
			assert_eq!(err.message, "响应数据为空");
			assert_eq!(err.status, Some(200));
		}
	}

	#[test]
	fn zero_length_bodies_succeed_as_empty_text() {
		let policy = NormalizePolicy::default();
		let deleted = normalize_response(
			&policy,
			"/api/complaints/1",
			ResponseType::Json,
			TransportResponse::new(200, Vec::new()),
		)
		.expect("Bodiless 200 replies should pass.");
		let blank = normalize_response(
			&policy,
			"/api/x",
			ResponseType::Json,
			TransportResponse::new(204, "  \n"),
		)
		.expect("Whitespace replies should pass.");

		assert_eq!(deleted, Payload::Json(json!("")));
		assert_eq!(blank, Payload::Json(json!("  \n")));
	}

	#[test]
	fn non_json_success_bodies_are_text() {
		let payload = normalize_response(
			&NormalizePolicy::default(),
			"/api/x",
			ResponseType::Json,
			TransportResponse::new(200, "pong"),
		)
		.expect("Text replies should pass.");

		assert_eq!(payload, Payload::Json(json!("pong")));
	}

	#[test]
	fn binary_replies_pass_through_unexamined() {
		let response = TransportResponse::new(200, br#"{"code":500}"#.to_vec())
			.with_content_type("application/octet-stream");
		let policy = NormalizePolicy::default();
		let payload = normalize_response(&policy, "/f", ResponseType::Blob, response)
			.expect("Blob replies should pass.");
		let Payload::Binary(binary) = payload else {
			panic!("Blob replies should stay binary.");
		};

		assert_eq!(binary.bytes, br#"{"code":500}"#.to_vec());
		assert_eq!(binary.content_type.as_deref(), Some("application/octet-stream"));

		let failed = normalize_response(
			&policy,
			"/f",
			ResponseType::Blob,
			TransportResponse::new(403, Vec::new()),
		);

		assert_eq!(failed.map_err(|e| e.category), Err(FailureCategory::Forbidden));
	}

	#[test]
	fn status_table_maps_categories_and_default_messages() {
		let policy = NormalizePolicy::default();
		let cases = [
			(401, FailureCategory::AuthExpired, "登录已过期，请重新登录"),
			(403, FailureCategory::Forbidden, "权限不足，无法访问该资源"),
			(404, FailureCategory::NotFound, "请求的资源不存在"),
			(409, FailureCategory::Conflict, "资源冲突，请检查数据"),
			(500, FailureCategory::ServerError, "服务器内部错误，请联系管理员"),
			(502, FailureCategory::Generic, "请求失败，请稍后重试"),
			(400, FailureCategory::Generic, "请求失败，请稍后重试"),
		];

		for (status, category, message) in cases {
			let failure = classify_status(&policy, "/api/users/1", status, b"");

			assert_eq!(failure, ApiFailure::new(category, message).with_status(status));
		}
	}

	#[test]
	fn backend_messages_win_over_defaults() {
		let policy = NormalizePolicy::default();
		let body = json!({ "message": "邮箱已被注册" }).to_string();

		for status in [401, 403, 404, 409, 500, 422] {
			let failure = classify_status(&policy, "/api/x", status, body.as_bytes());

			assert_eq!(failure.message, "邮箱已被注册");
		}

		let blank = json!({ "message": "" }).to_string();

		assert_eq!(
			classify_status(&policy, "/api/x", 409, blank.as_bytes()).message,
			"资源冲突，请检查数据"
		);
	}

	#[test]
	fn not_found_prefers_path_override_then_backend_then_default() {
		let policy = NormalizePolicy::default();
		let body = json!({ "message": "no such key" }).to_string();

		assert_eq!(
			classify_status(&policy, "/api/card-keys/XYZ", 404, body.as_bytes()).message,
			"卡密不存在或参数错误"
		);
		assert_eq!(
			classify_status(&policy, "/api/users/9", 404, body.as_bytes()).message,
			"no such key"
		);
		assert_eq!(
			classify_status(&policy, "/api/users/9", 404, b"<html>").message,
			"请求的资源不存在"
		);
	}

	#[test]
	fn normalizing_a_success_value_again_is_stable() {
		let policy = NormalizePolicy::default();

		for body in [
			json!({ "success": true, "data": 1 }),
			json!({ "code": 200, "data": null }),
			json!([1, 2, 3]),
			json!("text"),
		] {
			let once = normalize_body(&policy, body).expect("Success bodies should pass.");
			let twice = normalize_body(&policy, once.clone()).expect("Success bodies should pass.");

			assert_eq!(once, twice);
		}
	}
}
