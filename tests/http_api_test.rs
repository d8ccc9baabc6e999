//! HTTP API tests driving the router with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use common::{test_app, test_config, wait_for_completion, ScriptedJudge, SilentJudge};
use fickle_ferrets::adapters::http::build_router;
use fickle_ferrets::domain::models::{Trial, TrialStatus, DEFAULT_CHAMPION_PHRASE};
use fickle_ferrets::domain::ports::TrialRepository;
use fickle_ferrets::services::{CoinFlip, FixedVariant};
use fickle_ferrets::{App, Variant};

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn router_for(app: &App) -> Router {
    build_router(app.http_state(), true)
}

#[tokio::test]
async fn test_root_and_health() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let (status, body) = call(&router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Fickle Ferrets"));

    let (status, body) = call(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_affirmation_uses_champion_and_settles() {
    let judge = Arc::new(ScriptedJudge::new(&[(DEFAULT_CHAMPION_PHRASE, true)]));
    let app = test_app(test_config(), judge, Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let (status, body) = call(&router, post_json("/affirmation", &json!({}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["phrase"], DEFAULT_CHAMPION_PHRASE);
    let trial_id: Uuid = serde_json::from_value(body["trial_id"].clone()).unwrap();

    let mut settled = None;
    for _ in 0..100 {
        let (status, body) = call(&router, get(&format!("/trials/{trial_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let trial: Trial = serde_json::from_value(body).unwrap();
        if trial.status.is_terminal() {
            settled = Some(trial);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let trial = settled.expect("trial should settle");
    assert_eq!(trial.status, TrialStatus::Resolved);
    assert_eq!(trial.verdict, Some(true));

    let (status, body) = call(&router, get("/trials/history?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], trial_id.to_string());
}

#[tokio::test]
async fn test_webhook_accepts_legacy_and_current_fields() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let current = Trial::new("You are wonderful");
    let legacy = Trial::new("You are marvellous");
    app.trials.create(&current).await.unwrap();
    app.trials.create(&legacy).await.unwrap();

    let (status, body) = call(
        &router,
        post_json("/webhook/verdict", &json!({"trial_id": current.id, "verdict": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");
    assert_eq!(body["trial_id"], current.id.to_string());

    let (status, _) = call(
        &router,
        post_json(
            "/webhook/ferret-reaction",
            &json!({"affirmation_id": legacy.id, "joy_sparked": false, "timestamp": "2024-05-01T12:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A duplicate does not overwrite the first verdict
    call(
        &router,
        post_json("/webhook/verdict", &json!({"trial_id": current.id, "verdict": false})),
    )
    .await;

    let stored = app.trials.get(current.id).await.unwrap().unwrap();
    assert_eq!(stored.verdict, Some(true));
    let stored = app.trials.get(legacy.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TrialStatus::Resolved);
    assert_eq!(stored.verdict, Some(false));
}

#[tokio::test]
async fn test_webhook_for_unknown_trial_is_acknowledged() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);
    let id = Uuid::new_v4();

    let (status, body) = call(
        &router,
        post_json("/webhook/verdict", &json!({"trial_id": id, "verdict": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial_id"], id.to_string());
}

#[tokio::test]
async fn test_webhook_acknowledges_non_uuid_trial_id() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);
    let pending = Trial::new("You are wonderful");
    app.trials.create(&pending).await.unwrap();

    for uri in ["/webhook/verdict", "/webhook/ferret-reaction"] {
        let (status, body) = call(
            &router,
            post_json(uri, &json!({"trial_id": "stale-trial-42", "verdict": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["status"], "received");
        assert_eq!(body["trial_id"], "stale-trial-42");
    }

    let (status, body) = call(
        &router,
        post_json("/webhook/verdict", &json!({"affirmation_id": "", "joy_sparked": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial_id"], "");

    let stored = app.trials.get(pending.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TrialStatus::Pending);
}

#[tokio::test]
async fn test_champion_endpoint() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let (status, body) = call(&router, get("/champion")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phrase"], DEFAULT_CHAMPION_PHRASE);
    assert!(body["updated_at"].is_string());
}

#[tokio::test]
async fn test_experiment_lifecycle_over_http() {
    let challenger = "You have the glossiest coat";
    let judge = Arc::new(ScriptedJudge::new(&[(challenger, true)]));
    let app = test_app(test_config(), judge, Arc::new(FixedVariant(Variant::B))).await;
    let router = router_for(&app);

    let (status, body) = call(
        &router,
        post_json(
            "/experiments",
            &json!({"name": "glossy", "variant_b_phrase": challenger, "target_runs": 4}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");
    assert_eq!(body["variant_a_phrase"], DEFAULT_CHAMPION_PHRASE);
    assert!(body["results"].is_null());
    let id: Uuid = serde_json::from_value(body["id"].clone()).unwrap();

    wait_for_completion(&app, id, Duration::from_secs(10)).await;

    let (status, body) = call(&router, get(&format!("/experiments/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["results"]["winner"], "B");
    assert_eq!(body["results"]["variant_b_total"], 4);
    assert_eq!(body["results"]["variant_b_rate"], 1.0);
    assert_eq!(body["results"]["variant_a_rate"], 0.0);

    let (_, body) = call(&router, get("/champion")).await;
    assert_eq!(body["phrase"], challenger);

    let (status, body) = call(&router, get("/experiments?status=completed")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = call(&router, get("/experiments?status=active")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_experiment_errors() {
    let app = test_app(test_config(), Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let (status, body) = call(
        &router,
        post_json("/experiments", &json!({"name": "zero", "variant_b_phrase": "Hello", "target_runs": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = call(
        &router,
        post_json("/experiments", &json!({"name": "first", "variant_b_phrase": "Hello", "target_runs": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &router,
        post_json("/experiments", &json!({"name": "second", "variant_b_phrase": "Hi", "target_runs": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = call(&router, get(&format!("/experiments/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = call(&router, get(&format!("/trials/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = call(&router, get("/experiments?status=paused")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_default_target_runs_applied() {
    let mut config = test_config();
    config.experiment.default_target_runs = 3;
    let app = test_app(config, Arc::new(SilentJudge), Arc::new(CoinFlip)).await;
    let router = router_for(&app);

    let (status, body) = call(
        &router,
        post_json("/experiments", &json!({"name": "defaults", "variant_b_phrase": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["target_runs"], 3);
}
