mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::expect_error;

#[tokio::test]
async fn register_returns_public_projection() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.register("a@x.com", "a", "p1").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let user: Value = res.json().await?;
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["username"], "a");
    assert_eq!(user["role"], "user");
    assert_eq!(user["is_active"], true);
    assert!(user["id"].is_i64());
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts() -> Result<()> {
    let server = common::spawn_server().await?;
    assert_eq!(server.register("a@x.com", "a", "p1").await?.status(), StatusCode::OK);

    let res = server.register("a@x.com", "other", "p1").await?;
    let message = expect_error(res, StatusCode::BAD_REQUEST, "CONFLICT").await?;
    assert_eq!(message, "Email already registered");

    let res = server.register("b@x.com", "a", "p1").await?;
    let message = expect_error(res, StatusCode::BAD_REQUEST, "CONFLICT").await?;
    assert_eq!(message, "Username already taken");
    Ok(())
}

#[tokio::test]
async fn register_rejects_malformed_input() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.register("not-an-email", "a", "p1").await?;
    expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    let res = server.register("a@x.com", "bad name", "p1").await?;
    expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    let res = server.register("a@x.com", "a", "").await?;
    expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    Ok(())
}

#[tokio::test]
async fn login_issues_bearer_token() -> Result<()> {
    let server = common::spawn_server().await?;
    server.register("a@x.com", "a", "p1").await?;

    let res = server.login("a@x.com", "p1").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap_or_default().is_empty());
    assert_eq!(body["expires_in"], json!(8 * 24 * 60 * 60));
    Ok(())
}

#[tokio::test]
async fn wrong_password_or_unknown_email_is_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    server.register("a@x.com", "a", "p1").await?;

    let res = server.login("a@x.com", "wrong").await?;
    let wrong_password = expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    let res = server.login("nobody@x.com", "p1").await?;
    let unknown_email = expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    // Same message either way
    assert_eq!(wrong_password, unknown_email);
    Ok(())
}

#[tokio::test]
async fn me_requires_valid_token() -> Result<()> {
    let server = common::spawn_server().await?;
    let (id, token) = server.signup("alice").await?;

    let res = server.client.get(server.url("/api/me")).send().await?;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    let res = server
        .client
        .get(server.url("/api/me"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    let res = server.client.get(server.url("/api/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await?;
    assert_eq!(me["id"], json!(id));
    assert_eq!(me["username"], "alice");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let (id, _) = server.signup("alice").await?;

    let expired = server.credentials.issue_token(id, chrono::Duration::seconds(-60))?;
    let res = server.client.get(server.url("/api/me")).bearer_auth(expired).send().await?;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn update_me_changes_only_present_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.signup("alice").await?;

    let res = server
        .client
        .put(server.url("/api/me"))
        .bearer_auth(&token)
        .json(&json!({ "username": "alice2", "email": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await?;
    assert_eq!(me["username"], "alice2");
    assert_eq!(me["email"], "alice@example.com");

    // New password works, old one does not
    let res = server
        .client
        .put(server.url("/api/me"))
        .bearer_auth(&token)
        .json(&json!({ "password": "fresh-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(server.login("alice@example.com", "fresh-password").await?.status(), StatusCode::OK);
    assert_eq!(
        server.login("alice@example.com", "alice-password").await?.status(),
        StatusCode::UNAUTHORIZED
    );
    Ok(())
}

#[tokio::test]
async fn update_me_to_taken_username_conflicts() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.signup("alice").await?;
    server.signup("bob").await?;

    let res = server
        .client
        .put(server.url("/api/me"))
        .bearer_auth(&token)
        .json(&json!({ "username": "bob" }))
        .send()
        .await?;
    expect_error(res, StatusCode::BAD_REQUEST, "CONFLICT").await?;
    Ok(())
}

#[tokio::test]
async fn activity_records_audited_actions() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.signup("alice").await?;

    let res = server
        .client
        .get(server.url("/api/me/activity"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let entries: Vec<Value> = res.json().await?;
    let actions: Vec<&str> = entries.iter().filter_map(|e| e["action"].as_str()).collect();
    assert_eq!(actions, vec!["login", "register"]);
    Ok(())
}

#[tokio::test]
async fn non_ascii_username_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;

    for username in ["用户", "éclair"] {
        let res = server.register("u@x.com", username, "p1").await?;
        expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    }
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_keep_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;

    // Missing field
    let res = server
        .client
        .post(server.url("/api/register"))
        .json(&json!({ "email": "a@x.com", "password": "p1" }))
        .send()
        .await?;
    expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;

    // Broken JSON
    let res = server
        .client
        .post(server.url("/api/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;

    // No JSON content type
    let res = server
        .client
        .post(server.url("/api/login"))
        .body(r#"{"email":"a@x.com","password":"p1"}"#)
        .send()
        .await?;
    expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;
    Ok(())
}
