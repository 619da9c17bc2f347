use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt;

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

async fn register(app: &Router, name: &str, email: &str, role: &str) -> Result<(String, String)> {
    let (status, registered) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "password123", "role": role })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "register failed: {registered}");

    let token = registered["token"].as_str().context("missing token")?.to_string();
    let id = registered["user"]["id"].as_str().context("missing id")?.to_string();
    Ok((token, id))
}

#[tokio::test]
async fn mean_priority_per_assignee_in_both_directions() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let app = setup(&dir).await?;

    let (manager, _) = register(&app, "Mona", "mona@example.com", "manager").await?;
    let (employee_a, a_id) = register(&app, "Ana", "ana@example.com", "employee").await?;
    let (_, b_id) = register(&app, "Ben", "ben@example.com", "employee").await?;

    for priority in [1, 3, 5] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/tasks/{}", a_id),
            Some(&manager),
            Some(json!({ "description": "for A", "priority": priority })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }
    for priority in [2, 2] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/tasks/{}", b_id),
            Some(&manager),
            Some(json!({ "description": "for B", "priority": priority })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    // ascending: B (2.0) before A (3.0)
    let (status, report) = send(&app, "GET", "/reports/load?direction=asc", Some(&manager), None).await?;
    assert_eq!(status, StatusCode::OK, "report failed: {report}");
    let rows = report.as_array().context("expected array")?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["assignee"], b_id.as_str());
    assert_eq!(rows[0]["avg_priority"], 2.0);
    assert_eq!(rows[1]["assignee"], a_id.as_str());
    assert_eq!(rows[1]["avg_priority"], 3.0);

    // default direction is descending
    let (status, report) = send(&app, "GET", "/reports/load", Some(&manager), None).await?;
    assert_eq!(status, StatusCode::OK);
    let rows = report.as_array().context("expected array")?;
    assert_eq!(rows[0]["assignee"], a_id.as_str());
    assert_eq!(rows[1]["assignee"], b_id.as_str());

    // managers only
    let (status, _) = send(&app, "GET", "/reports/load", Some(&employee_a), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}
