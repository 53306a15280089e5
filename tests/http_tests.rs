// HTTP surface tests: run the real router on an ephemeral port and drive it
// the way the UI would, including the no-API-key analysis fallback.

mod common;

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use callscribe::config::AnalysisConfig;
use callscribe::coordinator::{Coordinator, CoordinatorConfig};
use callscribe::{create_router, AnalysisRequestor, AppState, Settings};
use common::{fast_capture_config, silence_factory, ScriptedTranscriber};

async fn serve(settings: Settings, dir: &TempDir) -> String {
    let transcriber = ScriptedTranscriber::repeating("We agreed to ship on Friday");
    let coordinator = Coordinator::spawn(
        CoordinatorConfig {
            capture: fast_capture_config(),
            settings: settings.clone(),
            state_path: dir.path().join("state.json"),
            export_dir: dir.path().join("exports"),
            export_delay: Duration::from_millis(100),
        },
        silence_factory(),
        transcriber,
    )
    .await;

    let state = AppState {
        coordinator,
        requestor: Arc::new(AnalysisRequestor::new(AnalysisConfig::default())),
        settings,
        export_dir: dir.path().join("exports"),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, create_router(state)).await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_check() {
    let dir = TempDir::new().unwrap();
    let base = serve(Settings::default(), &dir).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_recording_lifecycle_over_http() {
    let dir = TempDir::new().unwrap();
    let base = serve(Settings::default(), &dir).await;
    let client = reqwest::Client::new();

    // Stop before any start is a state conflict, not a server fault
    let response = client
        .post(format!("{}/recording/stop", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/recording/start", base))
        .json(&serde_json::json!({ "tab_id": 11 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let status: serde_json::Value = client
        .get(format!("{}/recording/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["is_recording"], true);
    assert_eq!(status["tab_id"], 11);

    // Second start while recording is rejected
    let response = client
        .post(format!("{}/recording/start", base))
        .json(&serde_json::json!({ "tab_id": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/recording/stop", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_analysis_falls_back_without_api_key() {
    let dir = TempDir::new().unwrap();
    let base = serve(Settings::default(), &dir).await;
    let client = reqwest::Client::new();

    // Record long enough to accumulate transcript entries
    client
        .post(format!("{}/recording/start", base))
        .json(&serde_json::json!({ "tab_id": 1 }))
        .send()
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;
    client
        .post(format!("{}/recording/stop", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = client
        .post(format!("{}/analysis", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fallback"], true);
    let text = body["text"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(text.contains("ship on Friday"));
}

#[tokio::test]
async fn test_templates_listing() {
    let dir = TempDir::new().unwrap();
    let base = serve(Settings::default(), &dir).await;

    let templates: serde_json::Value = reqwest::get(format!("{}/analysis/templates", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let list = templates.as_array().unwrap();
    assert!(list.iter().any(|t| t["id"] == "summary"));
    assert!(list.iter().any(|t| t["id"] == "action-items"));
}

#[tokio::test]
async fn test_transcript_get_and_clear() {
    let dir = TempDir::new().unwrap();
    let base = serve(Settings::default(), &dir).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/recording/start", base))
        .json(&serde_json::json!({ "tab_id": 2 }))
        .send()
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(450)).await;
    client
        .post(format!("{}/recording/stop", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let transcript = client
        .get(format!("{}/transcript", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(transcript.contains("ship on Friday"));

    let response = client
        .delete(format!("{}/transcript", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let transcript = client
        .get(format!("{}/transcript", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(transcript.is_empty());
}
