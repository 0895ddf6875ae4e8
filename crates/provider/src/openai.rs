use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::reply::{extract_message_content, parse_reply_content};
use crate::{LabelProvider, ProviderError, ProviderReply, ProviderRequest, ProviderRuntimeConfig};

const SYSTEM_PROMPT: &str = "Sos un analista alimentario. Dado el texto de ingredientes o una foto de etiqueta, \
extraé ingredientes y alérgenos (gluten, lácteos) y devolvé un único objeto JSON con la forma: \
{ \"hasGluten\": boolean, \"glutenOrigin\": string | null, \"hasLactose\": boolean, \"crossContam\": boolean, \
\"pros\": string[], \"cons\": string[], \"score\": entero 1-10, \"summary\": string }. \
Marcá contaminación cruzada si hay frases tipo \"puede contener\" o \"trazas\". El score es orientativo.";

/// Upstream error bodies are echoed to API clients, so only a prefix is kept.
const MAX_ERROR_BODY_CHARS: usize = 512;

const IMAGE_INSTRUCTION: &str =
    "Extraé el texto y analizá alérgenos (gluten, lactosa). Devolvé SOLO el JSON pedido.";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: Client,
    config: ProviderRuntimeConfig,
}

impl OpenAiProvider {
    pub fn new(config: ProviderRuntimeConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .context("failed to build provider HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Option<Self>> {
        ProviderRuntimeConfig::from_env().map(Self::new).transpose()
    }

    pub fn config(&self) -> &ProviderRuntimeConfig {
        &self.config
    }

    pub fn build_payload(&self, request: &ProviderRequest) -> Value {
        let user_content = match request {
            ProviderRequest::Image(image) => json!([
                { "type": "text", "text": IMAGE_INSTRUCTION },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]),
            ProviderRequest::Text(text) => json!([
                {
                    "type": "text",
                    "text": format!("Texto de etiqueta:\n{text}\n\nDevolvé SOLO el JSON pedido.")
                }
            ]),
        };

        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_content }
            ]
        })
    }
}

impl LabelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn analyze(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
        let payload = self.build_payload(request);

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        let body: Value = response.json().await?;
        // A reply without message content is an empty object, not a failure.
        let content = extract_message_content(&body).unwrap_or_else(|| "{}".to_string());
        debug!(
            model = %self.config.model,
            kind = request.kind(),
            content_len = content.len(),
            "provider reply received"
        );
        parse_reply_content(&content)
    }
}

fn truncate_error_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
