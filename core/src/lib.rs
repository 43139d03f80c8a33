//! Request client core for the artisan marketplace backend.
//!
//! # Overview
//! `RequestClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. A `Transport` executes the round
//! trip, and `Api` ties the two together behind async `get` / `post` /
//! `delete` calls plus the typed translation and classifier endpoints.
//!
//! # Design
//! - `RequestClient` is stateless: it holds only `base_url`.
//! - Content negotiation is part of each request value. JSON posts carry
//!   `content-type: application/json`; multipart posts carry no explicit
//!   content type and the transport writes one with the boundary.
//! - Errors separate transport failures from non-2xx statuses and from
//!   undecodable bodies; nothing retries.
//! - The extension's image-analysis flow lives in `message` as a typed
//!   channel feeding an `ImageAnalyzer`.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod message;
pub mod transport;
pub mod types;

pub use api::Api;
pub use client::{Payload, RequestClient};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{
    ContentMode, HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue, RequestBody,
};
pub use message::{
    message_channel, relay, AnalysisOutcome, ExtensionMessage, ImageAnalyzer, ImageSource,
    MessageReceiver, MessageSender,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Classification, ImageUpload, Price, TranslateRequest, TranslateResponse};
