//! Typed message channel for the image-analyzer extension.
//!
//! # Design
//! The context menu, the background worker and the content script talk
//! through `ExtensionMessage`, a tagged enum whose JSON form is
//! `{"action": "analyzeImage", "imageUrl": "..."}`. Each hop is a bounded
//! tokio channel; `relay` forwards between hops and `ImageAnalyzer` is the
//! final consumer that calls the classifier.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::Api;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{Classification, ImageUpload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExtensionMessage {
    #[serde(rename_all = "camelCase")]
    AnalyzeImage { image_url: String },
}

impl ExtensionMessage {
    pub fn analyze_image(image_url: impl Into<String>) -> Self {
        ExtensionMessage::AnalyzeImage {
            image_url: image_url.into(),
        }
    }

    /// Decode a raw runtime message. Unknown actions are rejected.
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        serde_json::from_str(raw).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

/// What the analyzer reports back for each `AnalyzeImage` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    #[serde(rename_all = "camelCase")]
    Completed {
        image_url: String,
        classification: Classification,
    },
    #[serde(rename_all = "camelCase")]
    Failed { image_url: String, message: String },
}

impl AnalysisOutcome {
    pub fn image_url(&self) -> &str {
        match self {
            AnalysisOutcome::Completed { image_url, .. } => image_url,
            AnalysisOutcome::Failed { image_url, .. } => image_url,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("message channel closed")]
pub struct ChannelClosed;

#[derive(Debug)]
pub struct MessageSender<M> {
    inner: mpsc::Sender<M>,
}

impl<M> Clone for MessageSender<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M> MessageSender<M> {
    pub async fn send(&self, message: M) -> Result<(), ChannelClosed> {
        self.inner.send(message).await.map_err(|_| ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[derive(Debug)]
pub struct MessageReceiver<M> {
    inner: mpsc::Receiver<M>,
}

impl<M> MessageReceiver<M> {
    /// `None` once every sender is dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<M> {
        self.inner.recv().await
    }
}

/// Bounded channel for one hop. `capacity` is clamped to at least 1.
pub fn message_channel<M>(capacity: usize) -> (MessageSender<M>, MessageReceiver<M>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MessageSender { inner: tx }, MessageReceiver { inner: rx })
}

/// Forward every message from `from` to `to` until either side closes.
/// Returns the number of messages forwarded.
pub async fn relay<M>(mut from: MessageReceiver<M>, to: MessageSender<M>) -> usize {
    let mut forwarded = 0;
    while let Some(message) = from.recv().await {
        if to.send(message).await.is_err() {
            debug!(forwarded, "relay downstream closed");
            break;
        }
        forwarded += 1;
    }
    forwarded
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Inline { mime_type: String, bytes: Vec<u8> },
    Remote(Url),
}

impl ImageSource {
    /// `data:` URLs are decoded locally, absolute http(s) URLs are fetched,
    /// and anything else is resolved against `page_url`.
    pub fn parse(image_url: &str, page_url: Option<&str>) -> Result<Self, ApiError> {
        let trimmed = image_url.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidImageSource("empty image URL".to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix("data:") {
            return parse_data_url(rest);
        }

        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(_) => {
                let page = page_url.ok_or_else(|| {
                    ApiError::InvalidImageSource(format!(
                        "relative image URL `{trimmed}` without a page URL"
                    ))
                })?;
                Url::parse(page)
                    .and_then(|base| base.join(trimmed))
                    .map_err(|e| ApiError::InvalidImageSource(format!("`{trimmed}`: {e}")))?
            }
        };
        match url.scheme() {
            "http" | "https" => Ok(ImageSource::Remote(url)),
            other => Err(ApiError::InvalidImageSource(format!(
                "unsupported scheme `{other}`"
            ))),
        }
    }
}

fn parse_data_url(rest: &str) -> Result<ImageSource, ApiError> {
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| ApiError::InvalidImageSource("data URL without payload".to_string()))?;
    let mut params = meta.split(';');
    let mime_type = match params.next() {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => "text/plain".to_string(),
    };
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ApiError::InvalidImageSource(
            "only base64 data URLs are supported".to_string(),
        ));
    }
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| ApiError::InvalidImageSource(format!("bad base64 payload: {e}")))?;
    Ok(ImageSource::Inline { mime_type, bytes })
}

fn upload_for(mime_type: Option<&str>, bytes: Vec<u8>) -> ImageUpload {
    // Strip parameters such as `; charset=binary`.
    let mime = mime_type
        .and_then(|m| m.split(';').next())
        .map(str::trim)
        .filter(|m| m.starts_with("image/"))
        .unwrap_or("image/jpeg");
    let ext = match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "img",
    };
    ImageUpload::new(format!("image.{ext}"), mime, bytes)
}

/// Consumes `AnalyzeImage` messages one at a time and reports outcomes.
pub struct ImageAnalyzer<T> {
    api: Api<T>,
    page_url: Option<String>,
}

impl<T: Transport> ImageAnalyzer<T> {
    pub fn new(api: Api<T>) -> Self {
        Self {
            api,
            page_url: None,
        }
    }

    /// Base for resolving relative image URLs.
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn analyze(&self, image_url: &str) -> Result<Classification, ApiError> {
        let upload = match ImageSource::parse(image_url, self.page_url.as_deref())? {
            ImageSource::Inline { mime_type, bytes } => upload_for(Some(mime_type.as_str()), bytes),
            ImageSource::Remote(url) => {
                let (bytes, content_type) = self.api.fetch_bytes(url.as_str()).await?;
                upload_for(content_type.as_deref(), bytes)
            }
        };
        if upload.bytes.is_empty() {
            return Err(ApiError::InvalidImageSource("image has no content".to_string()));
        }
        self.api.trial_classify(upload).await
    }

    /// Process messages in arrival order until the inbox closes or nobody is
    /// listening for outcomes. Returns the number of outcomes delivered.
    pub async fn run(
        self,
        mut inbox: MessageReceiver<ExtensionMessage>,
        outcomes: MessageSender<AnalysisOutcome>,
    ) -> usize {
        let mut delivered = 0;
        while let Some(message) = inbox.recv().await {
            let ExtensionMessage::AnalyzeImage { image_url } = message;
            let outcome = match self.analyze(&image_url).await {
                Ok(classification) => {
                    info!(%image_url, "image analyzed");
                    AnalysisOutcome::Completed {
                        image_url,
                        classification,
                    }
                }
                Err(err) => {
                    warn!(%image_url, error = %err, "image analysis failed");
                    AnalysisOutcome::Failed {
                        image_url,
                        message: err.to_string(),
                    }
                }
            };
            if outcomes.send(outcome).await.is_err() {
                break;
            }
            delivered += 1;
        }
        delivered
    }
}
