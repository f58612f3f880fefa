use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use fitness_tracker::models::{DeviceType, SummaryReport, TrainingSession};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{
    bearer_for, init_test_logging, jpeg_bytes, png_bytes, utc, CannedRecognizer,
    MockDataGenerator, TestApp,
};

const BOUNDARY: &str = "console-photo-boundary";

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"console.jpg\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(user_id: Uuid, field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/trainings/upload-image")
        .header(header::AUTHORIZATION, bearer_for(user_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, bytes)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, user_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer_for(user_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer_for(user_id))
        .body(Body::empty())
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new(CannedRecognizer::text(""));

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_training_routes_require_a_token() {
    let app = TestApp::new(CannedRecognizer::text(""));

    let response = app
        .router
        .oneshot(Request::builder().uri("/api/trainings").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_creates_session() {
    init_test_logging();
    let app = TestApp::new(CannedRecognizer::text(
        "Dauer: 26:41 Kalorien: 300 kcal Entfernung: 4.23 km",
    ));
    let user_id = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(user_id, "image", &jpeg_bytes(80, 60)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let session: TrainingSession = json_body(response).await;
    assert_eq!(session.user_id, user_id);
    assert_eq!(session.duration_seconds, 1601);
    assert_eq!(session.avg_speed_kmh, 9.51);
    assert_eq!(session.device, DeviceType::Treadmill);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_upload_error_codes() {
    let app = TestApp::new(CannedRecognizer::text("no readouts at all"));
    let user_id = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(user_id, "image", b"plain text, not an image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = json_body(response).await;
    assert_eq!(body["error_code"], "UNSUPPORTED_FORMAT");

    let response = app
        .router
        .clone()
        .oneshot(upload_request(user_id, "image", &png_bytes(20, 20)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = json_body(response).await;
    assert_eq!(body["error_code"], "NO_TRAINING_DATA_EXTRACTED");

    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_upload_without_image_field() {
    let app = TestApp::new(CannedRecognizer::text("Kalorien 100"));

    let response = app
        .router
        .oneshot(upload_request(Uuid::new_v4(), "file", &png_bytes(10, 10)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_create_and_list_newest_first() {
    let app = TestApp::new(CannedRecognizer::text(""));
    let user_id = Uuid::new_v4();

    for (date, duration) in [("2024-03-01T08:00:00Z", 1800), ("2024-03-05T08:00:00Z", 2400)] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/trainings",
                user_id,
                json!({
                    "date": date,
                    "duration_seconds": duration,
                    "distance_km": 5.0,
                    "device": "treadmill"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/trainings?limit=10", user_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sessions: Vec<TrainingSession> = json_body(response).await;
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].duration_seconds, 2400);
    assert_eq!(sessions[1].avg_speed_kmh, 10.0);
}

#[tokio::test]
async fn test_manual_create_validation() {
    let app = TestApp::new(CannedRecognizer::text(""));
    let user_id = Uuid::new_v4();

    let negative = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trainings",
            user_id,
            json!({"date": "2024-03-01T08:00:00Z", "duration_seconds": -5, "device": "bike"}),
        ))
        .await
        .unwrap();
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let unknown_device = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trainings",
            user_id,
            json!({"date": "2024-03-01T08:00:00Z", "duration_seconds": 60, "device": "rower"}),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_device.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_sessions_are_scoped_to_their_owner() {
    let app = TestApp::new(CannedRecognizer::text(""));
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let session = MockDataGenerator::session(owner, utc(2024, 3, 10, 9, 0, 0));
    let uri = format!("/api/trainings/{}", session.id);
    app.store.insert(session.clone());

    let response = app.router.clone().oneshot(get_request(&uri, stranger)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header(header::AUTHORIZATION, bearer_for(stranger))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.len(), 1);

    let response = app.router.clone().oneshot(get_request(&uri, owner)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: TrainingSession = json_body(response).await;
    assert_eq!(fetched.id, session.id);

    let missing = format!("/api/trainings/{}", Uuid::new_v4());
    let response = app.router.clone().oneshot(get_request(&missing, owner)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_recomputes_speed_and_delete_removes() {
    let app = TestApp::new(CannedRecognizer::text(""));
    let owner = Uuid::new_v4();
    let session = MockDataGenerator::session_with(owner, utc(2024, 3, 10, 9, 0, 0), 3600, 400, 8.0);
    let uri = format!("/api/trainings/{}", session.id);
    app.store.insert(session);

    let response = app
        .router
        .clone()
        .oneshot(json_request("PUT", &uri, owner, json!({"distance_km": 12.0})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated: TrainingSession = json_body(response).await;
    assert_eq!(updated.distance_km, 12.0);
    assert_eq!(updated.avg_speed_kmh, 12.0);
    assert_eq!(updated.calories_burned, 400);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header(header::AUTHORIZATION, bearer_for(owner))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_monthly_summary_route() {
    let app = TestApp::new(CannedRecognizer::text(""));
    let user_id = Uuid::new_v4();
    app.store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 1, 0, 0, 0), 3600, 500, 8.0));
    app.store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 20, 12, 0, 0), 1800, 300, 4.5));
    app.store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 31, 23, 59, 59), 61, 0, 0.0));
    app.store.insert(MockDataGenerator::session_with(user_id, utc(2024, 4, 1, 0, 0, 0), 999, 999, 9.0));

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/trainings/summary/3/2024", user_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: SummaryReport = json_body(response).await;
    assert_eq!(report.total_duration_seconds, 5461);
    assert_eq!(report.total_calories, 800);
    assert_eq!(report.formatted_duration, "1 Std, 31 Min, 1 Sek");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/trainings/summary/13/2024", user_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
