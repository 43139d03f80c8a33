//! Async facade: one build, execute, parse round trip per call.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{Payload, RequestClient};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Classification, ImageUpload, TranslateRequest, TranslateResponse};

/// The request client bound to a transport.
///
/// Cloning is cheap when the transport is; every call builds its own
/// descriptor, so concurrent calls never share headers or content types.
#[derive(Debug, Clone)]
pub struct Api<T> {
    client: RequestClient,
    transport: T,
}

impl Api<ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(RequestClient::new(&config.base_url), transport))
    }

    /// Configuration from `ARTISAN_API_URL` / `ARTISAN_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> Api<T> {
    pub fn new(client: RequestClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn get<R, Q>(&self, path: &str, query: &Q) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let req = self.client.build_get(path, query)?;
        let resp = self.send(req).await?;
        self.client.parse(resp)
    }

    #[tracing::instrument(skip(self, payload), fields(multipart = payload.is_multipart()))]
    pub async fn post<R: DeserializeOwned>(
        &self,
        path: &str,
        payload: Payload,
    ) -> Result<R, ApiError> {
        let req = self.client.build_post(path, payload)?;
        let resp = self.send(req).await?;
        self.client.parse(resp)
    }

    pub async fn post_json<R, B>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post(path, Payload::json(body)?).await
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn delete<R, Q>(&self, path: &str, query: &Q) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let req = self.client.build_delete(path, query)?;
        let resp = self.send(req).await?;
        self.client.parse(resp)
    }

    #[tracing::instrument(skip(self, input), fields(target = %input.target_language))]
    pub async fn translate(&self, input: &TranslateRequest) -> Result<TranslateResponse, ApiError> {
        let req = self.client.build_translate(input)?;
        let resp = self.send(req).await?;
        self.client.parse_translate(resp)
    }

    #[tracing::instrument(skip(self, image), fields(bytes = image.bytes.len()))]
    pub async fn trial_classify(&self, image: ImageUpload) -> Result<Classification, ApiError> {
        let req = self.client.build_trial_classify(image)?;
        let resp = self.send(req).await?;
        self.client.parse_classification(resp)
    }

    #[tracing::instrument(skip(self, image), fields(bytes = image.bytes.len()))]
    pub async fn classify(&self, uid: u32, image: ImageUpload) -> Result<Classification, ApiError> {
        let req = self.client.build_classify(uid, image)?;
        let resp = self.send(req).await?;
        self.client.parse_classification(resp)
    }

    /// Download raw bytes from an absolute URL, e.g. an image on a web page.
    /// Returns the body and the response content type, if any.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>), ApiError> {
        let resp = self.send(HttpRequest::get(url)).await?;
        if !resp.is_success() {
            return Err(ApiError::HttpStatus {
                status: resp.status,
                body: resp.text(),
            });
        }
        let content_type = resp.header("content-type").map(str::to_string);
        Ok((resp.body, content_type))
    }

    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request_id = Uuid::new_v4();
        let method = req.method.as_str();
        let url = req.full_url();
        debug!(
            %request_id,
            method,
            %url,
            content_mode = ?req.content_mode(),
            body_len = req.body.len(),
            "sending request"
        );

        match self.transport.execute(req).await {
            Ok(resp) => {
                if resp.is_success() {
                    debug!(%request_id, status = resp.status, body_len = resp.body.len(), "response received");
                } else {
                    warn!(
                        %request_id,
                        status = resp.status,
                        body_len = resp.body.len(),
                        body = %body_preview(&resp.body),
                        "request rejected"
                    );
                }
                Ok(resp)
            }
            Err(err) => {
                warn!(%request_id, method, %url, error = %err, "request failed");
                Err(err)
            }
        }
    }
}

/// Longest body excerpt written to the log for a rejected request.
const LOG_BODY_LIMIT: usize = 256;

fn body_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(LOG_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}
