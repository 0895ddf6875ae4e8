mod config;
mod openai;
mod reply;

use std::future::Future;

use labelscan_core::ImageRef;
use serde_json::{Map, Value};
use thiserror::Error;

pub use config::ProviderRuntimeConfig;
pub use openai::OpenAiProvider;
pub use reply::parse_reply_content;

/// Untyped provider answer. Every field is untrusted until normalized.
pub type ProviderReply = Map<String, Value>;

#[derive(Debug, Clone)]
pub enum ProviderRequest {
    Text(String),
    Image(ImageRef),
}

impl ProviderRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("provider reply is JSON but not an object")]
    NotAnObject,
}

pub trait LabelProvider: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(
        &self,
        request: &ProviderRequest,
    ) -> impl Future<Output = Result<ProviderReply, ProviderError>> + Send;
}
