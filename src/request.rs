//! Request model passed through the pipeline untouched: method, path, query, body, reply typing.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// HTTP verbs the backend exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Lowercase label used in fingerprints, spans, and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "get",
			Self::Post => "post",
			Self::Put => "put",
			Self::Patch => "patch",
			Self::Delete => "delete",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the reply body should be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
	/// JSON envelope (or bare JSON) reply.
	#[default]
	Json,
	/// Binary download handed back unexamined.
	Blob,
}

/// Outgoing request body.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(Value),
	/// Multipart form upload.
	Multipart(MultipartForm),
}

/// One field of a multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub enum FormPart {
	/// Plain text field.
	Text(String),
	/// File field.
	File {
		/// File name reported to the backend.
		file_name: String,
		/// Optional MIME type; the transport picks a default when absent.
		mime: Option<String>,
		/// File contents.
		bytes: Vec<u8>,
	},
}
impl Debug for FormPart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
			Self::File { file_name, mime, bytes } => f
				.debug_struct("File")
				.field("file_name", file_name)
				.field("mime", mime)
				.field("len", &bytes.len())
				.finish(),
		}
	}
}

/// Ordered multipart form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	parts: Vec<(String, FormPart)>,
}
impl MultipartForm {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push((name.into(), FormPart::Text(value.into())));

		self
	}

	/// Appends a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		mime: Option<&str>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push((
			name.into(),
			FormPart::File {
				file_name: file_name.into(),
				mime: mime.map(str::to_owned),
				bytes: bytes.into(),
			},
		));

		self
	}

	/// Iterator over `(field, part)` pairs in insertion order.
	pub fn parts(&self) -> impl Iterator<Item = (&str, &FormPart)> {
		self.parts.iter().map(|(name, part)| (name.as_str(), part))
	}

	/// Returns `true` when the form carries no fields.
	pub fn is_empty(&self) -> bool {
		self.parts.is_empty()
	}

	/// JSON summary used for fingerprints: text values verbatim, files by name and size.
	pub fn describe(&self) -> Value {
		let parts = self
			.parts
			.iter()
			.map(|(name, part)| {
				let value = match part {
					FormPart::Text(value) => Value::String(value.clone()),
					FormPart::File { file_name, bytes, .. } =>
						serde_json::json!({ "file": file_name, "len": bytes.len() }),
				};

				serde_json::json!([name, value])
			})
			.collect();

		Value::Array(parts)
	}
}

/// A backend call, described independently of any HTTP client.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the base URL, or an absolute URL.
	pub path: String,
	/// Query parameters (a JSON object), if any.
	pub query: Option<Value>,
	/// Request body.
	pub body: RequestBody,
	/// Expected reply typing.
	pub response_type: ResponseType,
}
impl ApiRequest {
	/// Creates a request with no query, no body, and JSON reply typing.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: None,
			body: RequestBody::Empty,
			response_type: ResponseType::Json,
		}
	}

	/// `GET path` with optional query parameters.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// `POST path` with a JSON body.
	pub fn post(path: impl Into<String>, body: Value) -> Self {
		Self::new(Method::Post, path).with_json(body)
	}

	/// `PUT path` with a JSON body.
	pub fn put(path: impl Into<String>, body: Value) -> Self {
		Self::new(Method::Put, path).with_json(body)
	}

	/// `PATCH path` with a JSON body.
	pub fn patch(path: impl Into<String>, body: Value) -> Self {
		Self::new(Method::Patch, path).with_json(body)
	}

	/// `DELETE path`.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Multipart `POST path`.
	pub fn upload(path: impl Into<String>, form: MultipartForm) -> Self {
		let mut request = Self::new(Method::Post, path);

		request.body = RequestBody::Multipart(form);

		request
	}

	/// `GET path` whose reply is handed back as raw bytes.
	pub fn download(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path).with_response_type(ResponseType::Blob)
	}

	/// Sets query parameters.
	pub fn with_query(mut self, query: Value) -> Self {
		self.query = Some(query);

		self
	}

	/// Sets a JSON body.
	pub fn with_json(mut self, body: Value) -> Self {
		self.body = RequestBody::Json(body);

		self
	}

	/// Overrides the reply typing.
	pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
		self.response_type = response_type;

		self
	}
}
