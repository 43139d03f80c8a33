use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, sample_classification, Classification, Echo, TranslateResponse};
use tower::ServiceExt;

const BOUNDARY: &str = "artisan-test-boundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

/// Hand-built multipart body with a single file field.
fn multipart_request(uri: &str, field: &str, content: &str) -> Request<String> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"image.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

// --- translate ---

#[tokio::test]
async fn translate_returns_translated_text() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/translate",
            r#"{"text":"Hello","target_language":"hi","source_language":"en"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let out: TranslateResponse = body_json(resp).await;
    assert_eq!(out.translated_text, "[hi] Hello");
    assert_eq!(out.original_text, "Hello");
    assert_eq!(out.source_language, "en");
}

#[tokio::test]
async fn translate_defaults_source_language() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/translate",
            r#"{"text":"Hello","target_language":"ta"}"#,
        ))
        .await
        .unwrap();

    let out: TranslateResponse = body_json(resp).await;
    assert_eq!(out.source_language, "en");
}

#[tokio::test]
async fn translate_empty_text_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/translate",
            r#"{"text":"   ","target_language":"hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Text must not be empty");
}

#[tokio::test]
async fn translate_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/translate", r#"{"text":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- classifier ---

#[tokio::test]
async fn trial_classify_returns_classification() {
    let resp = app()
        .oneshot(multipart_request(
            "/classifier/trial_classify",
            "image",
            "fake-jpeg-bytes",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let c: Classification = body_json(resp).await;
    assert_eq!(c, sample_classification());
}

#[tokio::test]
async fn trial_classify_without_image_returns_422() {
    let resp = app()
        .oneshot(multipart_request(
            "/classifier/trial_classify",
            "photo",
            "fake-jpeg-bytes",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn trial_classify_rejects_json_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/classifier/trial_classify",
            r#"{"image":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- echo and status ---

#[tokio::test]
async fn echo_reports_query_and_content_type() {
    let resp = app()
        .oneshot(json_request("POST", "/echo?a=1&b=two", r#"{"k":"v"}"#))
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.query.get("a").map(String::as_str), Some("1"));
    assert_eq!(echo.query.get("b").map(String::as_str), Some("two"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"k":"v"}"#);
}

#[tokio::test]
async fn status_endpoint_returns_requested_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/status/503")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_bytes(resp).await, "status 503");
}

#[tokio::test]
async fn slow_endpoint_answers_after_delay() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/slow?ms=5")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["delayed_ms"], 5);
}

#[tokio::test]
async fn sample_image_is_png() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/images/sample.png")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(&body_bytes(resp).await[..4], &[0x89, b'P', b'N', b'G']);
}

// --- classify, read, delete lifecycle ---

#[tokio::test]
async fn classify_store_read_delete_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // classify and store under uid 7
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("/classifier/classify?uid=7", "image", "pot"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // style is readable
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/storage/style/7")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["style"], "Madhubani");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/storage/products/7")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // gone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/storage/products/7")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // delete again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/storage/products/7")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
