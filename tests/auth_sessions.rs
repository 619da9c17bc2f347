use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt; // for `oneshot`

use taskdesk::create_app;

async fn setup(dir: &tempfile::TempDir) -> Result<Router> {
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    Ok(create_app(pool).await?)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn multi_device_logout_and_logout_all() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let app = setup(&dir).await?;

    let register_body = json!({
        "name": "Two Devices",
        "email": "devices@example.com",
        "password": "password123"
    });
    let (status, registered) = send(&app, "POST", "/auth/register", None, Some(register_body)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let device_one = registered["token"].as_str().context("missing token")?.to_string();

    // second device login
    let login_body = json!({ "email": "devices@example.com", "password": "password123" });
    let (status, logged_in) = send(&app, "POST", "/auth/login", None, Some(login_body.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    let device_two = logged_in["token"].as_str().context("missing token")?.to_string();
    assert_ne!(device_one, device_two);

    // both sessions live
    let (status, _) = send(&app, "GET", "/auth/me", Some(&device_one), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&device_two), None).await?;
    assert_eq!(status, StatusCode::OK);

    // logging out device one revokes exactly that session
    let (status, _) = send(&app, "POST", "/auth/logout", Some(&device_one), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&device_one), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&device_two), None).await?;
    assert_eq!(status, StatusCode::OK);

    // a third login plus logout-all kills everything
    let (status, logged_in) = send(&app, "POST", "/auth/login", None, Some(login_body)).await?;
    assert_eq!(status, StatusCode::OK);
    let device_three = logged_in["token"].as_str().context("missing token")?.to_string();

    let (status, _) = send(&app, "POST", "/auth/logout-all", Some(&device_two), None).await?;
    assert_eq!(status, StatusCode::OK);
    for token in [&device_two, &device_three] {
        let (status, _) = send(&app, "GET", "/auth/me", Some(token), None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    Ok(())
}

#[tokio::test]
async fn authentication_failures_are_generic() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let app = setup(&dir).await?;

    // no header
    let (status, no_header) = send(&app, "GET", "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // garbage token
    let (status, garbage) = send(&app, "GET", "/auth/me", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // same message either way; nothing leaks about which check failed
    assert_eq!(no_header["message"], garbage["message"]);
    assert!(no_header["message"]
        .as_str()
        .context("missing message")?
        .contains("please authenticate"));

    Ok(())
}

#[tokio::test]
async fn register_and_login_edge_cases() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let app = setup(&dir).await?;

    // short password
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Shorty", "email": "short@example.com", "password": "short" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // malformed email
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "No At", "email": "not-an-email", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // valid registration defaults to the employee role
    let (status, registered) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Valid", "email": "valid@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["user"]["role"], "employee");

    // duplicate email
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Valid Again", "email": "valid@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // wrong password and unknown email produce the same status
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "valid@example.com", "password": "wrongpassword" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
