//! Integration tests for the board game night status service.
//!
//! These drive the public router end to end with a fixed clock.
//! Run with: cargo test --test integration

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;
use game_night::api::{create_router, AppState};
use game_night::config::Config;
use game_night::schedule::{EventZone, FixedClock};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

const SECRET: &str = "let-me-in";

/// Build app state the way `serve` does, from environment-style variables.
fn test_state(now: DateTime<Utc>) -> AppState {
    let config = Config::from_vars(vec![
        ("AUTHORIZATION".to_string(), SECRET.to_string()),
        ("LOCATION".to_string(), "Europe/Amsterdam".to_string()),
    ])
    .unwrap();
    config.validate().unwrap();

    AppState::new(config.authorization.as_str(), config.event_zone().unwrap())
        .with_clock(Arc::new(FixedClock(now)))
}

async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: &str) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Monday 10:00 in Amsterdam.
fn monday_morning() -> DateTime<Utc> {
    Amsterdam
        .with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn state_uses_configured_zone() {
    let state = test_state(monday_morning());
    assert_eq!(state.zone, EventZone::Named(Amsterdam));
}

#[tokio::test]
async fn monday_morning_counts_down_to_tuesday() {
    let app = create_router(test_state(monday_morning()));

    let (status, body) = send(&app, Method::GET, "/", None, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "The next board game night is on Tuesday, 02-Jan-24 18:45:00 CET\n\
         That is in 1 days, 8 hours, 45 minutes, and 0 seconds\n"
    );
}

#[tokio::test]
async fn tuesday_evening_is_game_night() {
    let now = Amsterdam
        .with_ymd_and_hms(2024, 1, 2, 19, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let app = create_router(test_state(now));

    let (status, body) = send(&app, Method::GET, "/", None, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "It is board game night!");
}

#[tokio::test]
async fn cancel_then_resume() {
    let state = test_state(monday_morning());
    let app = create_router(state.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/update/status",
        Some(SECRET),
        r#"{"cancelled": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Board game night has been cancelled.");

    let (_, body) = send(&app, Method::GET, "/", None, "").await;
    assert_eq!(body, "Board game night has been cancelled :(");

    let (status, body) = send(
        &app,
        Method::POST,
        "/update/status",
        Some(SECRET),
        r#"{"cancelled": false}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Board game night has been resumed.");

    let (_, body) = send(&app, Method::GET, "/", None, "").await;
    assert!(body.starts_with("The next board game night is on"), "{body}");
}

#[tokio::test]
async fn unauthorized_update_leaves_flag_alone() {
    let state = test_state(monday_morning());
    let app = create_router(state.clone());

    for auth in [None, Some("let-me-in-please"), Some("")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/update/status",
            auth,
            r#"{"cancelled": true}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized.");

        let (status, _) = send(&app, Method::POST, "/update", auth, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    assert!(!state.flag.get());
    let (_, body) = send(&app, Method::GET, "/", None, "").await;
    assert!(!body.contains("cancelled"), "{body}");
}

#[tokio::test]
async fn malformed_and_misrouted_updates() {
    let state = test_state(monday_morning());
    let app = create_router(state.clone());

    let (status, body) = send(&app, Method::POST, "/update/status", Some(SECRET), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid request body.");

    let (status, body) = send(
        &app,
        Method::GET,
        "/update/status",
        Some(SECRET),
        r#"{"cancelled": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Invalid request method.");

    assert!(!state.flag.get());
}

#[tokio::test]
async fn toggle_round_trip() {
    let state = test_state(monday_morning());
    let app = create_router(state.clone());

    let (_, body) = send(&app, Method::POST, "/update", Some(SECRET), "").await;
    assert_eq!(body, "Board game night has been cancelled.");
    assert!(state.flag.get());

    let (_, body) = send(&app, Method::POST, "/update", Some(SECRET), "").await;
    assert_eq!(body, "Board game night has been resumed.");
    assert!(!state.flag.get());
}

#[tokio::test]
async fn health_is_always_ok() {
    let tuesday_evening = Amsterdam
        .with_ymd_and_hms(2024, 1, 2, 20, 0, 0)
        .unwrap()
        .with_timezone(&Utc);

    for now in [monday_morning(), tuesday_evening] {
        for cancelled in [false, true] {
            let state = test_state(now);
            state.flag.set(cancelled);
            let app = create_router(state);

            let (status, body) = send(&app, Method::GET, "/health", None, "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }
    }
}
