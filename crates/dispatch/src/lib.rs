mod normalize;

use std::sync::Arc;
use std::time::Instant;

use labelscan_core::{classify, ClassificationResult, ScanRequest};
use labelscan_observability::AppMetrics;
use labelscan_provider::{LabelProvider, ProviderRequest};
use serde::Serialize;
use tracing::{info, instrument, warn};

pub use normalize::{normalize_provider_reply, DEFAULT_PROVIDER_SCORE, DEFAULT_PROVIDER_SUMMARY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Provider,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    #[serde(flatten)]
    pub result: ClassificationResult,
    #[serde(skip)]
    pub source: ResultSource,
    /// Why the provider path was abandoned, when it was.
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

pub struct HybridDispatcher<P> {
    provider: Option<Arc<P>>,
    metrics: Arc<AppMetrics>,
}

impl<P> Clone for HybridDispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<P> HybridDispatcher<P>
where
    P: LabelProvider,
{
    pub fn new(provider: Option<P>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            provider: provider.map(Arc::new),
            metrics,
        }
    }

    pub fn heuristic_only(metrics: Arc<AppMetrics>) -> Self {
        Self::new(None, metrics)
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_deref()
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    #[instrument(
        skip(self, request),
        fields(
            has_text = request.text().is_some(),
            has_image = request.image().is_some(),
            provider = self.provider.is_some()
        )
    )]
    pub async fn resolve(&self, request: ScanRequest) -> Resolution {
        let started = Instant::now();
        self.metrics.inc_request();

        let resolution = match (self.provider.as_deref(), provider_request(&request)) {
            (Some(provider), Some(provider_request)) => {
                self.resolve_with_provider(provider, &provider_request, &request)
                    .await
            }
            _ => self.heuristic(&request, None),
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            source = ?resolution.source,
            has_gluten = resolution.result.has_gluten,
            has_lactose = resolution.result.has_lactose,
            score = resolution.result.score,
            fallback = resolution.diagnostic.is_some(),
            "label resolved"
        );

        resolution
    }

    async fn resolve_with_provider(
        &self,
        provider: &P,
        provider_request: &ProviderRequest,
        request: &ScanRequest,
    ) -> Resolution {
        self.metrics.inc_provider_call();

        match provider.analyze(provider_request).await {
            Ok(reply) => Resolution {
                result: normalize_provider_reply(&reply),
                source: ResultSource::Provider,
                diagnostic: None,
            },
            Err(err) => {
                self.metrics.inc_provider_failure();
                warn!(
                    provider = provider.name(),
                    kind = provider_request.kind(),
                    error = %err,
                    "provider failed, falling back to heuristic"
                );
                self.heuristic(request, Some(err.to_string()))
            }
        }
    }

    fn heuristic(&self, request: &ScanRequest, diagnostic: Option<String>) -> Resolution {
        self.metrics.inc_heuristic();
        Resolution {
            result: classify(request.fallback_text()),
            source: ResultSource::Heuristic,
            diagnostic,
        }
    }
}

/// Image wins over text when both arrive; nothing to send means no provider call.
fn provider_request(request: &ScanRequest) -> Option<ProviderRequest> {
    if let Some(image) = request.image() {
        return Some(ProviderRequest::Image(image.clone()));
    }
    request
        .text()
        .map(|text| ProviderRequest::Text(text.to_string()))
}
