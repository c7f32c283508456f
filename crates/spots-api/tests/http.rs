use std::sync::Arc;
use std::time::{Duration, Instant};

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use spots_api::authorizer::Authorizer;
use spots_api::passwords::Passwords;
use spots_api::{AppStateInner, router};
use spots_db::Database;
use tower::ServiceExt;

fn app() -> Router {
    let state = AppStateInner {
        store: Arc::new(Database::open_in_memory().unwrap()),
        authorizer: Authorizer::new("integration-secret", Duration::from_secs(600)),
        passwords: Passwords::with_params(Params::new(8, 1, 1, None).unwrap()),
        request_timeout: Duration::from_secs(5),
        started_at: Instant::now(),
    };
    router::build(Arc::new(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/user/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn spot_body(lat: f64, lon: f64) -> Value {
    json!({
        "name": "Cliff walk",
        "description": "Windy",
        "latitude": lat,
        "longitude": lon,
        "category": "Coast",
    })
}

#[tokio::test]
async fn partial_geo_query_is_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/spot?latitude=10", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY_PARAMETERS");
}

#[tokio::test]
async fn undecodable_query_strings_use_the_error_body() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/spot?latitude=1&latitude=2&longitude=1&radius=1",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY_PARAMETERS");
    assert!(body["message"].as_str().unwrap().contains("latitude"));

    let uri = "/spot/x/review?limit=1&limit=2";
    let (status, body) = send(&app, Method::GET, uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY_PARAMETERS");
}

#[tokio::test]
async fn path_segments_that_are_not_utf8_use_the_error_body() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/spot/%FF", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY_PARAMETERS");
}

#[tokio::test]
async fn writes_require_a_token() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/spot", None, Some(spot_body(1.0, 1.0))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = send(
        &app,
        Method::POST,
        "/spot",
        Some("not.a.token"),
        Some(spot_body(1.0, 1.0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reads_with_a_body_are_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/spot", None, Some(json!({"x": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn spot_lifecycle() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, spot) = send(
        &app,
        Method::POST,
        "/spot",
        Some(alice.as_str()),
        Some(spot_body(10.0, 10.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{spot}");
    assert_eq!(spot["addedBy"], "alice");
    assert_eq!(spot["category"], "coast");
    let id = spot["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/spot",
        Some(bob.as_str()),
        Some(spot_body(10.0005, 10.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, found) = send(&app, Method::GET, "/spot?name=CLIFF%20WALK", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let uri = format!("/spot/{id}");
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(bob.as_str()),
        Some(json!({"name": "Bob's"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(alice.as_str()),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(alice.as_str()),
        Some(json!({"description": "Calm today"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Calm today");
    assert_eq!(updated["name"], "Cliff walk");

    let reviews = format!("/spot/{id}/review");
    let (status, review) = send(
        &app,
        Method::POST,
        &reviews,
        Some(bob.as_str()),
        Some(json!({"rating": 4, "content": "Great"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    assert_eq!(review["spotId"], id.as_str());

    let (status, listed) = send(&app, Method::GET, &reviews, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &reviews, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn login_and_account_deletion() {
    let app = app();
    register(&app, "carol").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/user/login",
        None,
        Some(json!({"email": "carol@example.com", "password": "wrong-pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, login) = send(
        &app,
        Method::POST,
        "/user/login",
        None,
        Some(json!({"email": "carol@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap();
    let id = login["localId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/user/register",
        None,
        Some(json!({
            "name": "carol",
            "email": "carol2@example.com",
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = send(&app, Method::DELETE, &format!("/user/{id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn status_endpoints() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
