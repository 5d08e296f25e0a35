//! Integration tests for registration, login, logout and password reset.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (sk-cli migrate)
//! - The web server running against it (cargo run -p storekeep-web)
//!
//! Run with: cargo test -p storekeep-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use reqwest::StatusCode;

use storekeep_core::Email;
use storekeep_web::services::{AuthError, AuthService, PasswordResetService};

use storekeep_integration_tests::{
    TEST_PASSWORD, TestContext, client, location, login, register, unique_name,
};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_register_then_login_lands_on_user_page() {
    let ctx = TestContext::new().await;
    let client = client();
    let username = unique_name("cust");

    let resp = register(&ctx, &client, &username, &format!("{username}@example.com")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/");

    // The success flash shows once on the next page
    let page = client.get(ctx.url("/login/")).send().await.unwrap();
    let body = page.text().await.unwrap();
    assert!(body.contains(&format!("Account was created for {username}")));

    let resp = login(&ctx, &client, &username, TEST_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/user/");

    let resp = client.get(ctx.url("/user/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Customers cannot reach admin pages
    let resp = client.get(ctx.url("/")).send().await.unwrap();
    assert_eq!(location(&resp), "/user/");

    ctx.cleanup_customer(&username).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_username_is_rejected() {
    let ctx = TestContext::new().await;
    let username = unique_name("dup");

    let first = register(&ctx, &client(), &username, "").await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = register(&ctx, &client(), &username.to_uppercase(), "").await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = second.text().await.unwrap();
    assert!(body.contains("A user with that username already exists."));

    ctx.cleanup_customer(&username).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_bad_password_rerenders_login_with_message() {
    let ctx = TestContext::new().await;
    let client = client();
    let username = ctx.create_admin().await;

    let resp = login(&ctx, &client, &username, "not-the-password").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Username or Password is incorrect"));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_logout_ends_session() {
    let ctx = TestContext::new().await;
    let client = client();
    let username = ctx.create_admin().await;

    let resp = login(&ctx, &client, &username, TEST_PASSWORD).await;
    assert_eq!(location(&resp), "/");

    let resp = client.post(ctx.url("/logout/")).send().await.unwrap();
    assert_eq!(location(&resp), "/login/");

    let resp = client.get(ctx.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_reset_request_always_reports_sent() {
    let ctx = TestContext::new().await;
    let client = client();

    let resp = client
        .post(ctx.url("/reset_password/"))
        .form(&[("email", "nobody-here@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/reset_password_sent/");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_forged_reset_link_is_reported_invalid() {
    let ctx = TestContext::new().await;
    let resp = client()
        .get(ctx.url("/reset/MQ/not-a-real-token/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("invalid"));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_reset_token_is_single_use_and_expires() {
    let ctx = TestContext::new().await;
    let username = unique_name("reset");
    let email = Email::parse(&format!("{username}@example.com")).unwrap();
    let user = AuthService::new(&ctx.pool)
        .create_admin(&username, Some(&email), TEST_PASSWORD)
        .await
        .unwrap();

    let resets = PasswordResetService::new(&ctx.pool);
    let now = Utc::now();
    let issued = resets.issue(&email, now).await.unwrap();
    assert_eq!(issued.len(), 1);
    let path = &issued.first().unwrap().path;

    // Path is /reset/{uidb64}/{token}/
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let &[_, uidb64, token] = segments.as_slice() else {
        panic!("unexpected reset path {path}");
    };

    let linked = resets.check(uidb64, token, now).await.unwrap();
    assert_eq!(linked.id, user.id);

    let after_expiry = now + Duration::days(4);
    assert!(matches!(
        resets.check(uidb64, token, after_expiry).await,
        Err(AuthError::InvalidResetLink)
    ));
    assert!(matches!(
        resets
            .complete(&linked, token, "fresh-Lemon-Kite-77", after_expiry)
            .await,
        Err(AuthError::InvalidResetLink)
    ));

    resets
        .complete(&linked, token, "fresh-Lemon-Kite-77", now)
        .await
        .unwrap();

    assert!(matches!(
        resets
            .complete(&linked, token, "other-Lemon-Kite-78", now)
            .await,
        Err(AuthError::InvalidResetLink)
    ));
    assert!(matches!(
        resets.check(uidb64, token, now).await,
        Err(AuthError::InvalidResetLink)
    ));

    // The first completion changed the password
    let client = client();
    let resp = login(&ctx, &client, &username, "fresh-Lemon-Kite-77").await;
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_login_username_is_case_insensitive() {
    let ctx = TestContext::new().await;
    let username = ctx.create_admin().await;

    let resp = login(&ctx, &client(), &username.to_uppercase(), TEST_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}
