use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::Json;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use labelscan_api::{build_app_with_provider, ApiConfig};
use labelscan_core::{classify, ImageRef, ScanRequest};
use labelscan_dispatch::{HybridDispatcher, ResultSource};
use labelscan_observability::AppMetrics;
use labelscan_provider::{OpenAiProvider, ProviderRuntimeConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Debug, Clone)]
struct SeenRequest {
    authorization: Option<String>,
    payload: Value,
}

type Seen = Arc<Mutex<Vec<SeenRequest>>>;

/// Minimal chat-completions endpoint answering every call with `content`.
async fn spawn_mock_provider(status: StatusCode, content: Option<&'static str>) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(payload): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().push(SeenRequest {
                    authorization: headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .map(ToString::to_string),
                    payload,
                });
                (
                    status,
                    Json(json!({
                        "choices": [
                            { "message": { "role": "assistant", "content": content } }
                        ]
                    })),
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), seen)
}

fn provider_for(base_url: String) -> OpenAiProvider {
    let mut config = ProviderRuntimeConfig::new("sk-test");
    config.base_url = base_url;
    OpenAiProvider::new(config).unwrap()
}

#[tokio::test]
async fn image_request_reaches_provider_and_reply_is_normalized() {
    let (base_url, seen) = spawn_mock_provider(
        StatusCode::OK,
        Some("```json\n{ \"hasGluten\": true, \"glutenOrigin\": \"cebada\", \"hasLactose\": \"no\", \"score\": 3.4, \"pros\": [], \"cons\": [\"Contiene gluten\"], \"summary\": \"Contiene malta de cebada.\" }\n```"),
    )
    .await;
    let dispatcher = HybridDispatcher::new(Some(provider_for(base_url)), AppMetrics::shared());

    let resolution = dispatcher
        .resolve(ScanRequest::from_image(ImageRef::from_base64("/9j/4AAQ")))
        .await;

    assert_eq!(resolution.source, ResultSource::Provider);
    assert!(resolution.diagnostic.is_none());
    assert!(resolution.result.has_gluten);
    assert!(!resolution.result.has_lactose);
    assert_eq!(resolution.result.gluten_origin.as_deref(), Some("cebada"));
    assert_eq!(resolution.result.score, 3);
    assert_eq!(resolution.result.summary, "Contiene malta de cebada.");

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(seen[0].payload["model"], "gpt-4o");
    assert_eq!(
        seen[0].payload["messages"][1]["content"][1]["image_url"]["url"],
        "data:image/jpeg;base64,/9j/4AAQ"
    );
}

#[tokio::test]
async fn missing_message_content_becomes_defaulted_result() {
    let (base_url, _) = spawn_mock_provider(StatusCode::OK, None).await;
    let dispatcher = HybridDispatcher::new(Some(provider_for(base_url)), AppMetrics::shared());

    let resolution = dispatcher.resolve(ScanRequest::from_text("trigo")).await;

    assert_eq!(resolution.source, ResultSource::Provider);
    assert!(!resolution.result.has_gluten);
    assert_eq!(resolution.result.score, 5);
    assert_eq!(resolution.result.summary, "Análisis generado.");
}

#[tokio::test]
async fn provider_error_status_falls_back_through_the_api() {
    let (base_url, seen) = spawn_mock_provider(StatusCode::INTERNAL_SERVER_ERROR, None).await;
    let app = build_app_with_provider(Some(provider_for(base_url)), &ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/analyze")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "text": "Puede contener trazas de trigo" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();

    let expected = serde_json::to_value(classify("Puede contener trazas de trigo")).unwrap();
    for key in ["hasGluten", "glutenOrigin", "crossContam", "cons", "score", "summary"] {
        assert_eq!(parsed[key], expected[key], "{key}");
    }
    assert!(parsed["error"].as_str().unwrap().contains("500"));
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn prose_reply_falls_back_to_local_rules() {
    let (base_url, _) =
        spawn_mock_provider(StatusCode::OK, Some("El producto parece contener gluten.")).await;
    let dispatcher = HybridDispatcher::new(Some(provider_for(base_url)), AppMetrics::shared());

    let resolution = dispatcher
        .resolve(ScanRequest::from_text("Leche, queso"))
        .await;

    assert_eq!(resolution.source, ResultSource::Heuristic);
    assert_eq!(resolution.result, classify("Leche, queso"));
    assert!(resolution.diagnostic.unwrap().contains("not valid JSON"));
}

#[tokio::test]
async fn oversized_error_body_is_cut_before_reaching_clients() {
    let noisy: &'static str = Box::leak("x".repeat(10_000).into_boxed_str());
    let (base_url, _) = spawn_mock_provider(StatusCode::BAD_GATEWAY, Some(noisy)).await;
    let dispatcher = HybridDispatcher::new(Some(provider_for(base_url)), AppMetrics::shared());

    let resolution = dispatcher.resolve(ScanRequest::from_text("Avena")).await;

    assert_eq!(resolution.source, ResultSource::Heuristic);
    let diagnostic = resolution.diagnostic.unwrap();
    assert!(diagnostic.starts_with("provider returned status 502: "));
    assert!(diagnostic.chars().count() < 600, "{} chars", diagnostic.chars().count());
}
