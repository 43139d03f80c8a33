//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain, owned data. `RequestClient` builds an
//! `HttpRequest` per call and a `Transport` executes it; no request ever
//! reads configuration that another request could change in flight. The
//! content mode (JSON vs. multipart) travels inside the descriptor's body,
//! so it is fixed at build time.

use serde::Serialize;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// How a request body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    Json,
    Multipart,
}

/// A single field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

/// Ordered multipart form description. The transport turns it into a real
/// `multipart/form-data` body and picks the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<Part>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                mime_type: mime_type.into(),
                bytes,
            },
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&PartValue> {
        self.parts.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Sum of the payload sizes, used for logging only.
    pub fn payload_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match &p.value {
                PartValue::Text(t) => t.len(),
                PartValue::File { bytes, .. } => bytes.len(),
            })
            .sum()
    }
}

/// Request body, already encoded for JSON or described for multipart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn content_mode(&self) -> Option<ContentMode> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some(ContentMode::Json),
            RequestBody::Multipart(_) => Some(ContentMode::Multipart),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Json(s) => s.len(),
            RequestBody::Multipart(form) => form.payload_len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An HTTP request described as plain data.
///
/// Built by `RequestClient::build_*` methods and handed to a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// A bare GET against an absolute URL, used for downloads outside the API.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Case-insensitive header lookup over the explicitly set headers.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_mode(&self) -> Option<ContentMode> {
        self.body.content_mode()
    }

    /// The URL with the query string appended.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let encoded = encode_query(&self.query);
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{encoded}", self.url)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Convenience constructor for text bodies.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lossy UTF-8 view of the body.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn encode_query(pairs: &[(String, String)]) -> String {
    let encoded = serde_urlencoded::to_string(pairs);
    debug_assert!(encoded.is_ok(), "string pairs always encode: {encoded:?}");
    encoded.unwrap_or_default()
}

/// Flatten a serializable value into ordered query pairs.
///
/// Accepts a struct or map (fields in declaration/insertion order) or a
/// sequence of `(key, value)` pairs. Scalars are stringified and `null`
/// values dropped. An array value repeats its key as `key[]`, one pair per
/// element. Nested objects are rejected.
pub fn query_pairs<Q: Serialize + ?Sized>(
    params: &Q,
) -> Result<Vec<(String, String)>, crate::ApiError> {
    use serde_json::Value;

    let value =
        serde_json::to_value(params).map_err(|e| crate::ApiError::Serialization(e.to_string()))?;
    let entries: Vec<(String, Value)> = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .map(pair_entry)
            .collect::<Result<_, _>>()?,
        other => {
            return Err(crate::ApiError::Serialization(format!(
                "query parameters must be a map or a list of pairs, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match value {
            Value::Array(items) => {
                let array_key = format!("{key}[]");
                for item in items {
                    if let Some(rendered) = scalar(&key, item)? {
                        pairs.push((array_key.clone(), rendered));
                    }
                }
            }
            other => {
                if let Some(rendered) = scalar(&key, other)? {
                    pairs.push((key, rendered));
                }
            }
        }
    }
    Ok(pairs)
}

/// One `(key, value)` element of a pair sequence.
fn pair_entry(item: serde_json::Value) -> Result<(String, serde_json::Value), crate::ApiError> {
    use serde_json::Value;

    match item {
        Value::Array(mut pair) if pair.len() == 2 => {
            let value = pair.pop().unwrap_or(Value::Null);
            match pair.pop() {
                Some(Value::String(key)) => Ok((key, value)),
                Some(other) => Err(crate::ApiError::Serialization(format!(
                    "query key must be a string, got {other}"
                ))),
                None => Err(crate::ApiError::Serialization("empty query pair".to_string())),
            }
        }
        other => Err(crate::ApiError::Serialization(format!(
            "query list entries must be (key, value) pairs, got {other}"
        ))),
    }
}

fn scalar(key: &str, value: serde_json::Value) -> Result<Option<String>, crate::ApiError> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        nested => Err(crate::ApiError::Serialization(format!(
            "query parameter `{key}` is not a scalar: {nested}"
        ))),
    }
}
