//! Client tests against a loopback axum server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cadence_client::ScheduleClient;
use cadence_core::{
    CadenceError, Dashboard, DueBucket, ErrorCode, Performance, ScheduleService, TopicId, TopicRef,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

type Captured = Arc<Mutex<Vec<Value>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn reply(status: StatusCode, body: Value) -> Router {
    Router::new().fallback(move || {
        let body = body.clone();
        async move { (status, Json(body)) }
    })
}

async fn capture(State(captured): State<Captured>, Json(body): Json<Value>) -> impl IntoResponse {
    captured.lock().unwrap().push(body);
    Json(json!({"next_review": "2026-10-20", "halflife": 3.25}))
}

#[tokio::test]
async fn test_fetch_subjects_keeps_server_order() {
    // Raw text so the wire keeps Physics before Art
    let body = r#"{
        "Physics": {"Mechanics": [{"id": 1, "name": "Kinematics", "performance": 0.4}]},
        "Art": {"Drawing": [{"topicId": "art-7", "name": "Perspective"}]}
    }"#;
    let url = serve(Router::new().route(
        "/api/subjects",
        get(move || async move { ([(header::CONTENT_TYPE, "application/json")], body) }),
    ))
    .await;

    let tree = ScheduleClient::new(&url).unwrap().fetch_subjects().await.unwrap();
    let names: Vec<&str> = tree.subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Physics", "Art"]);
    assert_eq!(tree.topic_count(), 2);
}

#[tokio::test]
async fn test_fetch_recommendations_camel_case() {
    let body = json!([{
        "topicId": 12,
        "subject": "Math",
        "subskill": "Algebra",
        "topic": "Quadratics",
        "lastReviewed": "2026-10-10",
        "nextReview": "2026-10-16T08:00:00Z"
    }]);
    let url = serve(Router::new().route(
        "/api/recommendations",
        get(move || async move { Json(body) }),
    ))
    .await;

    let recs = ScheduleClient::new(&url)
        .unwrap()
        .fetch_recommendations()
        .await
        .unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].topic_id.as_str(), "12");
    assert_eq!(recs[0].topic, "Quadratics");
    assert_eq!(
        recs[0].next_review,
        Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_recommendation_without_id_is_skipped() {
    let body = json!([
        {"topic": "Orphan", "subject": "Math", "subskill": "Algebra"},
        {"topicId": 4, "topic": "Groups", "subject": "Math", "subskill": "Algebra"}
    ]);
    let url = serve(reply(StatusCode::OK, body)).await;

    let recs = assert_ok!(ScheduleClient::new(&url).unwrap().fetch_recommendations().await);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].topic_id.as_str(), "4");
}

#[tokio::test]
async fn test_schedule_posts_topic_id_and_performance() {
    let captured: Captured = Arc::default();
    let url = serve(
        Router::new()
            .route("/api/schedule", post(capture))
            .with_state(captured.clone()),
    )
    .await;

    let update = ScheduleClient::new(&url)
        .unwrap()
        .schedule(&TopicId::from(7), Performance::clamped(0.8))
        .await
        .unwrap();

    assert_eq!(update.next_review, Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap());
    assert_eq!(update.halflife, 3.25);
    assert_eq!(
        captured.lock().unwrap().as_slice(),
        [json!({"topicId": 7, "performance": 0.8})]
    );
}

#[tokio::test]
async fn test_service_error_text_is_verbatim() {
    let url = serve(reply(StatusCode::NOT_FOUND, json!({"error": "Topic 7 does not exist"}))).await;
    let err = ScheduleClient::new(&url)
        .unwrap()
        .schedule(&TopicId::from(7), Performance::clamped(0.5))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Topic 7 does not exist");
    assert_eq!(err.code(), ErrorCode::SvcNotFound);
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_detail_field_is_used_when_error_is_absent() {
    let url = serve(reply(StatusCode::BAD_REQUEST, json!({"detail": "Path must include subject"}))).await;
    let err = assert_err!(
        ScheduleClient::new(&url)
            .unwrap()
            .create_topic("Math", "Algebra", "x")
            .await
    );
    assert_eq!(err.user_message(), "Path must include subject");
}

#[tokio::test]
async fn test_fallback_message_per_endpoint() {
    let url = serve(reply(StatusCode::BAD_REQUEST, json!({"status": "No user data available"}))).await;
    let client = ScheduleClient::new(&url).unwrap();

    let err = client.retrain().await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to retrain model");

    let err = client
        .schedule(&TopicId::from(1), Performance::clamped(0.1))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Failed to update performance");
}

#[tokio::test]
async fn test_incomplete_schedule_response_is_malformed() {
    let url = serve(reply(StatusCode::OK, json!({"next_review": "2026-10-20"}))).await;
    let err = ScheduleClient::new(&url)
        .unwrap()
        .schedule(&TopicId::from(1), Performance::clamped(0.5))
        .await
        .unwrap_err();

    assert!(matches!(err, CadenceError::MalformedResponse { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_created_topic_without_name_uses_requested_name() {
    let url = serve(reply(StatusCode::OK, json!({"topic_id": "math:algebra:vectors", "status": "created"}))).await;
    let topic = ScheduleClient::new(&url)
        .unwrap()
        .create_topic("Math", "Algebra", "Vectors")
        .await
        .unwrap();

    assert_eq!(topic.id.as_str(), "math:algebra:vectors");
    assert_eq!(topic.name, "Vectors");
}

#[tokio::test]
async fn test_created_topic_without_id_is_malformed() {
    let url = serve(reply(StatusCode::OK, json!({"status": "created"}))).await;
    let err = ScheduleClient::new(&url)
        .unwrap()
        .create_topic("Math", "Algebra", "Vectors")
        .await
        .unwrap_err();
    assert!(matches!(err, CadenceError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_timeout_is_reported_as_network_timeout() {
    let router = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({}))
    });
    let url = serve(router).await;

    let client = ScheduleClient::with_options(&url, Some(Duration::from_millis(100))).unwrap();
    let err = client.fetch_subjects().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NetTimeout);
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ScheduleClient::new(&format!("http://{}", addr))
        .unwrap()
        .fetch_recommendations()
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NetConnectionFailed);
    assert!(err.user_message().starts_with("Failed to load recommendations"));
}

#[tokio::test]
async fn test_dashboard_over_http() {
    let captured: Captured = Arc::default();
    let subjects = json!({
        "Math": {"Algebra": [
            {"id": 1, "name": "Quadratics", "performance": 0.6},
            {"id": 2, "name": "Matrices"}
        ]}
    });
    let recs = json!([
        {"topicId": 1, "subject": "Math", "subskill": "Algebra", "topic": "Quadratics"},
        {"topicId": 2, "subject": "Math", "subskill": "Algebra", "topic": "Matrices"},
        {"topicId": 3, "subject": "Math", "subskill": "Algebra", "topic": "Vectors"},
        {"topicId": 4, "subject": "Math", "subskill": "Algebra", "topic": "Groups"}
    ]);
    let router = Router::new()
        .route("/api/subjects", get(move || async move { Json(subjects) }))
        .route("/api/recommendations", get(move || async move { Json(recs) }))
        .route("/api/schedule", post(capture))
        .with_state(captured.clone());
    let url = serve(router).await;

    let dashboard = Dashboard::new(Arc::new(ScheduleClient::new(&url).unwrap()));
    assert_ok!(dashboard.load().await);

    let outcome = assert_ok!(
        dashboard
            .update_performance(&TopicRef::legacy(TopicId::from(1)), Performance::clamped(0.9))
            .await
    );
    assert!(outcome.merged);
    assert!(outcome.dropped_from_cache);
    assert!(!outcome.refill_triggered());
    assert_eq!(dashboard.recommendations().await.len(), 3);

    let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
    let buckets = dashboard.overview(now).await;
    assert_eq!(buckets.count(DueBucket::ThisWeek), 1);
    assert_eq!(buckets.count(DueBucket::Unscheduled), 1);
    assert_eq!(captured.lock().unwrap().len(), 1);
}
