use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

/// Smallest valid PNG signature plus header chunk tag, enough for clients
/// that only sniff the first bytes.
pub const SAMPLE_PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, b'I', b'H', b'D', b'R',
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    pub source_language: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslateResponse {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub style: String,
    pub artist: String,
    pub medium: String,
    pub origin: String,
    pub price: String,
    pub themes: String,
    pub color: String,
}

/// Fixed classifier answer.
pub fn sample_classification() -> Classification {
    Classification {
        style: "Madhubani".to_string(),
        artist: "Unknown Mithila artisan".to_string(),
        medium: "Natural dyes on handmade paper".to_string(),
        origin: "Bihar, India".to_string(),
        price: "2400".to_string(),
        themes: "Nature, mythology".to_string(),
        color: "Red, yellow, black".to_string(),
    }
}

/// Deterministic stand-in for the translation service.
pub fn mock_translate(text: &str, target_language: &str) -> String {
    format!("[{target_language}] {text}")
}

/// What the echo endpoints saw on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct ClassifyParams {
    pub uid: u32,
}

#[derive(Deserialize)]
pub struct SlowParams {
    #[serde(default = "default_delay_ms")]
    pub ms: u64,
}

fn default_delay_ms() -> u64 {
    2_000
}

pub type Db = Arc<RwLock<HashMap<u32, Classification>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/translate", post(translate))
        .route("/classifier/trial_classify", post(trial_classify))
        .route("/classifier/classify", post(classify))
        .route("/storage/style/{uid}", get(get_style))
        .route("/storage/products/{uid}", get(get_product).delete(delete_product))
        .route("/echo", get(echo).post(echo).delete(echo))
        .route("/status/{code}", get(status))
        .route("/slow", get(slow))
        .route("/images/sample.png", get(sample_image))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

async fn translate(Json(input): Json<TranslateRequest>) -> Response {
    if input.text.trim().is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Text must not be empty");
    }
    let source_language = input.source_language.unwrap_or_else(|| "en".to_string());
    tracing::debug!(target_language = %input.target_language, "translate");
    Json(TranslateResponse {
        translated_text: mock_translate(&input.text, &input.target_language),
        original_text: input.text,
        source_language,
        target_language: input.target_language,
    })
    .into_response()
}

/// Pull the non-empty `image` field out of a multipart body.
async fn read_image(mut multipart: Multipart) -> Result<Bytes, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| detail(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| detail(StatusCode::BAD_REQUEST, e.body_text()))?;
            if bytes.is_empty() {
                return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "image is empty"));
            }
            return Ok(bytes);
        }
    }
    Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "missing field `image`"))
}

async fn trial_classify(multipart: Multipart) -> Response {
    match read_image(multipart).await {
        Ok(bytes) => {
            tracing::debug!(bytes = bytes.len(), "trial classify");
            Json(sample_classification()).into_response()
        }
        Err(resp) => resp,
    }
}

async fn classify(
    State(db): State<Db>,
    Query(params): Query<ClassifyParams>,
    multipart: Multipart,
) -> Response {
    if let Err(resp) = read_image(multipart).await {
        return resp;
    }
    let result = sample_classification();
    db.write().await.insert(params.uid, result.clone());
    Json(result).into_response()
}

async fn get_style(State(db): State<Db>, Path(uid): Path<u32>) -> Response {
    let products = db.read().await;
    match products.get(&uid) {
        Some(c) => Json(json!({ "style": c.style })).into_response(),
        None => detail(StatusCode::NOT_FOUND, format!("product {uid} not found")),
    }
}

async fn get_product(
    State(db): State<Db>,
    Path(uid): Path<u32>,
) -> Result<Json<Classification>, StatusCode> {
    let products = db.read().await;
    products.get(&uid).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_product(
    State(db): State<Db>,
    Path(uid): Path<u32>,
) -> Result<StatusCode, StatusCode> {
    let mut products = db.write().await;
    products
        .remove(&uid)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn echo(
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(Echo {
        method: method.to_string(),
        query,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16())).into_response()
}

/// Answers only after `ms` milliseconds, for exercising client timeouts.
async fn slow(Query(params): Query<SlowParams>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    Json(json!({ "delayed_ms": params.ms }))
}

async fn sample_image() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], SAMPLE_PNG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_request_source_is_optional() {
        let input: TranslateRequest =
            serde_json::from_str(r#"{"text":"Hello","target_language":"hi"}"#).unwrap();
        assert_eq!(input.text, "Hello");
        assert!(input.source_language.is_none());
    }

    #[test]
    fn translate_request_rejects_missing_target() {
        let result: Result<TranslateRequest, _> = serde_json::from_str(r#"{"text":"Hello"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn mock_translate_is_deterministic() {
        assert_eq!(mock_translate("Hello", "hi"), "[hi] Hello");
        assert_eq!(mock_translate("Hello", "hi"), mock_translate("Hello", "hi"));
    }

    #[test]
    fn classification_serializes_every_field() {
        let json = serde_json::to_value(sample_classification()).unwrap();
        for key in ["style", "artist", "medium", "origin", "price", "themes", "color"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["price"], "2400");
    }
}
