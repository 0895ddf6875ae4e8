use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use labelscan_api::{build_app_with_provider, ApiConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn offline_app() -> Router {
    build_app_with_provider(None, &ApiConfig::default())
}

fn analyze_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/analyze")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_offline_mode() {
    let response = offline_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["capabilities"]["provider"], false);
    assert!(parsed["capabilities"]["model"].is_null());
}

#[tokio::test]
async fn analyze_text_without_provider_uses_local_rules() {
    let response = offline_app()
        .oneshot(analyze_request(
            json!({ "text": "Harina de trigo, azúcar, sal" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["hasGluten"], true);
    assert_eq!(parsed["glutenOrigin"], "trigo/wheat");
    assert_eq!(parsed["hasLactose"], false);
    assert_eq!(parsed["crossContam"], false);
    assert_eq!(parsed["score"], 4);
    assert_eq!(
        parsed["cons"],
        json!(["Azúcares añadidos", "Puede ser alto en sodio", "Contiene gluten"])
    );
    assert!(parsed.get("error").is_none());
}

#[tokio::test]
async fn analyze_image_without_provider_returns_no_data() {
    let response = offline_app()
        .oneshot(analyze_request(json!({ "imageBase64": "/9j/4AAQ" }).to_string()))
        .await
        .unwrap();

    let parsed = json_body(response).await;
    assert_eq!(
        parsed["summary"],
        "Escaneá un producto o pegá el texto de la etiqueta"
    );
    assert_eq!(parsed["score"], 10);
    assert_eq!(parsed["pros"], json!([]));
}

#[tokio::test]
async fn malformed_body_is_treated_as_empty_request() {
    let response = offline_app()
        .oneshot(analyze_request("{ not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["hasGluten"], false);
    assert_eq!(parsed["score"], 10);
}

#[tokio::test]
async fn response_has_exactly_the_result_fields() {
    let response = offline_app()
        .oneshot(analyze_request(
            json!({ "text": "Leche pasteurizada. Sin gluten." }).to_string(),
        ))
        .await
        .unwrap();

    let parsed = json_body(response).await;
    let mut keys = parsed
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect::<Vec<_>>();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "cons",
            "crossContam",
            "glutenOrigin",
            "hasGluten",
            "hasLactose",
            "pros",
            "score",
            "summary"
        ]
    );
}

#[tokio::test]
async fn request_id_is_propagated() {
    let response = offline_app()
        .oneshot(analyze_request(json!({ "text": "avena" }).to_string()))
        .await
        .unwrap();

    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let app = build_app_with_provider(
        None,
        &ApiConfig {
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 1,
            ..ApiConfig::default()
        },
    );

    let request = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/v1/analyze")
            .header("x-forwarded-for", ip)
            .body(Body::from(json!({ "text": "sal" }).to_string()))
            .unwrap()
    };

    let first = app.clone().oneshot(request("198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.clone().oneshot(request("198.51.100.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let other = app.clone().oneshot(request("198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = build_app_with_provider(
        None,
        &ApiConfig {
            body_limit_bytes: 64,
            ..ApiConfig::default()
        },
    );

    let text = "trigo ".repeat(100);
    let response = app
        .oneshot(analyze_request(json!({ "text": text }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
