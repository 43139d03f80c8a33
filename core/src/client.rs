//! Stateless HTTP request builder and response parser for the marketplace API.
//!
//! # Design
//! `RequestClient` holds only a `base_url` and carries no mutable state
//! between calls. Every operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The content type is decided by the payload passed to
//! `build_post`, so two requests built back to back can never see each
//! other's headers.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{query_pairs, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
use crate::types::{Classification, ImageUpload, TranslateRequest, TranslateResponse};

pub const TRANSLATE_PATH: &str = "/translate";
pub const TRIAL_CLASSIFY_PATH: &str = "/classifier/trial_classify";
pub const CLASSIFY_PATH: &str = "/classifier/classify";

/// Body of a POST: structured JSON or a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

impl Payload {
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        serde_json::to_value(body)
            .map(Payload::Json)
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Payload::Multipart(_))
    }
}

impl From<MultipartForm> for Payload {
    fn from(form: MultipartForm) -> Self {
        Payload::Multipart(form)
    }
}

/// Synchronous, stateless client for the marketplace API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct RequestClient {
    base_url: String,
}

impl RequestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn build_get<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.url_for(path),
            query: query_pairs(query)?,
            headers: Vec::new(),
            body: RequestBody::Empty,
        })
    }

    /// JSON payloads get `content-type: application/json`. Multipart payloads
    /// get no explicit content type: the transport writes it together with
    /// the boundary.
    pub fn build_post(&self, path: &str, payload: Payload) -> Result<HttpRequest, ApiError> {
        let (headers, body) = match payload {
            Payload::Json(value) => {
                let body = serde_json::to_string(&value)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                (
                    vec![("content-type".to_string(), "application/json".to_string())],
                    RequestBody::Json(body),
                )
            }
            Payload::Multipart(form) => (Vec::new(), RequestBody::Multipart(form)),
        };
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url_for(path),
            query: Vec::new(),
            headers,
            body,
        })
    }

    pub fn build_post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.build_post(path, Payload::json(body)?)
    }

    pub fn build_delete<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: self.url_for(path),
            query: query_pairs(query)?,
            headers: Vec::new(),
            body: RequestBody::Empty,
        })
    }

    pub fn build_translate(&self, input: &TranslateRequest) -> Result<HttpRequest, ApiError> {
        self.build_post_json(TRANSLATE_PATH, input)
    }

    pub fn build_trial_classify(&self, image: ImageUpload) -> Result<HttpRequest, ApiError> {
        self.build_post(TRIAL_CLASSIFY_PATH, image_form(image).into())
    }

    /// Classify and persist under `uid`, the stored variant of trial classify.
    pub fn build_classify(&self, uid: u32, image: ImageUpload) -> Result<HttpRequest, ApiError> {
        let mut req = self.build_post(CLASSIFY_PATH, image_form(image).into())?;
        req.query.push(("uid".to_string(), uid.to_string()));
        Ok(req)
    }

    /// Decode any 2xx JSON body. An empty body decodes as `null`.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        decode_body(&response.body)
    }

    pub fn parse_translate(&self, response: HttpResponse) -> Result<TranslateResponse, ApiError> {
        self.parse(response)
    }

    pub fn parse_classification(
        &self,
        response: HttpResponse,
    ) -> Result<Classification, ApiError> {
        self.parse(response)
    }
}

fn image_form(image: ImageUpload) -> MultipartForm {
    MultipartForm::new().file(
        ImageUpload::FIELD,
        image.file_name,
        image.mime_type,
        image.bytes,
    )
}

/// Map non-2xx status codes to `ApiError::HttpStatus`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpStatus {
        status: response.status,
        body: response.text(),
    })
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(serde_json::Value::Null)
            .map_err(|e| ApiError::Decode(format!("empty response body: {e}")));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
