//! Data-driven knobs for response classification: credential phrases, path overrides, messages.

// self
use crate::{_prelude::*, error::FailureCategory};

/// Message surfaced whenever the credential is no longer usable.
pub const SESSION_EXPIRED_MESSAGE: &str = "登录已过期，请重新登录";
/// Message carried by the duplicate-request rejection.
pub const DUPLICATE_MESSAGE: &str = "请求重复";

/// Classification policy consulted by the response normalizer.
///
/// Every field has a default matching the backend's conventions, so a partial JSON document
/// only needs to name what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizePolicy {
	/// Substrings that mark a body-encoded failure as a credential problem.
	pub credential_phrases: Vec<String>,
	/// Path-specific overrides for 404 replies, checked in order.
	pub not_found_rules: Vec<NotFoundRule>,
	/// Fallback messages.
	pub messages: FallbackMessages,
}
impl NormalizePolicy {
	/// Returns `true` when `message` contains any configured credential phrase.
	pub fn is_credential_failure(&self, message: &str) -> bool {
		self.credential_phrases.iter().any(|phrase| message.contains(phrase.as_str()))
	}

	/// Override message for a 404 on `path`, if a rule matches.
	pub fn not_found_override(&self, path: &str) -> Option<&str> {
		self.not_found_rules
			.iter()
			.find(|rule| path.contains(rule.path_fragment.as_str()))
			.map(|rule| rule.message.as_str())
	}
}
impl Default for NormalizePolicy {
	fn default() -> Self {
		Self {
			credential_phrases: ["Token无效", "Token过期", "未授权访问"]
				.into_iter()
				.map(str::to_owned)
				.collect(),
			not_found_rules: vec![NotFoundRule {
				path_fragment: "/api/card-keys/".into(),
				message: "卡密不存在或参数错误".into(),
			}],
			messages: FallbackMessages::default(),
		}
	}
}

/// Replaces the 404 message for paths containing `path_fragment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundRule {
	/// Substring matched against the request path.
	pub path_fragment: String,
	/// Message used instead of the backend's.
	pub message: String,
}

/// Messages used when the backend supplies none (or when the category mandates a fixed one).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackMessages {
	/// Duplicate-request rejection.
	pub duplicate: String,
	/// Session expired (401, credential phrase, or pre-flight rejection).
	pub session_expired: String,
	/// 2xx reply with no body.
	pub empty_response: String,
	/// Body-encoded failure without a message.
	pub request_failed: String,
	/// 403.
	pub forbidden: String,
	/// 404 without a backend message.
	pub not_found: String,
	/// 409.
	pub conflict: String,
	/// 500.
	pub server_error: String,
	/// Any other non-2xx status.
	pub generic: String,
}
impl FallbackMessages {
	/// Fixed message for a status-derived category.
	pub fn for_category(&self, category: FailureCategory) -> &str {
		match category {
			FailureCategory::AuthExpired => &self.session_expired,
			FailureCategory::Forbidden => &self.forbidden,
			FailureCategory::NotFound => &self.not_found,
			FailureCategory::Conflict => &self.conflict,
			FailureCategory::ServerError => &self.server_error,
			FailureCategory::Generic => &self.generic,
		}
	}
}
impl Default for FallbackMessages {
	fn default() -> Self {
		Self {
			duplicate: DUPLICATE_MESSAGE.into(),
			session_expired: SESSION_EXPIRED_MESSAGE.into(),
			empty_response: "响应数据为空".into(),
			request_failed: "请求失败".into(),
			forbidden: "权限不足，无法访问该资源".into(),
			not_found: "请求的资源不存在".into(),
			conflict: "资源冲突，请检查数据".into(),
			server_error: "服务器内部错误，请联系管理员".into(),
			generic: "请求失败，请稍后重试".into(),
		}
	}
}
