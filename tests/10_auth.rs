mod common;

use anyhow::Result;
use common::Api;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let api = Api::anonymous().await?;
    let (status, body) = api.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let api = Api::anonymous().await?;
    let (status, body) = api.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["students"].is_string());
    Ok(())
}

#[tokio::test]
async fn seeded_superadmin_can_log_in() -> Result<()> {
    let root = Api::superadmin().await?;
    let (status, body) = root.get("/api/auth/whoami").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], common::SUPER_EMAIL);
    assert_eq!(body["data"]["role"], "superadmin");
    assert!(body["data"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_unauthorized() -> Result<()> {
    let api = Api::anonymous().await?;
    for payload in [
        json!({ "email": common::SUPER_EMAIL, "password": "Wrong@1234" }),
        json!({ "email": "nobody@example.edu", "password": "Admin@1234" }),
    ] {
        let (status, body) = api.post("/auth/login", payload).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn login_requires_fields_and_json() -> Result<()> {
    let api = Api::anonymous().await?;
    let (status, body) = api.post("/auth/login", json!({ "email": "not-an-email" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() -> Result<()> {
    let api = Api::anonymous().await?;
    let (status, body) = api.get("/api/schools").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let forged = Api::anonymous().await?.with_token("not.a.jwt");
    let (status, _) = forged.get("/api/auth/whoami").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
