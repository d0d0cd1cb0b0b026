//! 用户 API 集成测试

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

mod common;
use common::{
    create_offline_app, create_test_app, get, json_request, login_request, register,
    register_and_login, send, TEST_PASSWORD,
};

#[tokio::test]
async fn test_register_rejects_invalid_email_before_storage() {
    let (app, _) = create_offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/users",
            None,
            json!({ "username": "alice", "email": "not-an-email", "password": TEST_PASSWORD }),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "BAD_REQUEST");
}

/// 语法合法、但超过 `users.email` 列宽的地址
fn overlong_email() -> String {
    let label = "a".repeat(63);
    format!("{}@{}.{}.{}.com", "b".repeat(64), label, label, label)
}

#[tokio::test]
async fn test_register_rejects_email_wider_than_column() {
    let (app, _) = create_offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/users",
            None,
            json!({ "username": "alice", "email": overlong_email(), "password": TEST_PASSWORD }),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_register_rejects_malformed_json() {
    let (app, _) = create_offline_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"username\":"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_register_and_read_me() {
    let (app, _) = create_test_app().await;

    let registered = register(&app, "alice").await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.json["username"], "alice");
    assert_eq!(registered.json["is_active"], true);
    assert!(registered.json.get("hashed_password").is_none());

    let login = send(&app, login_request("alice", TEST_PASSWORD)).await;
    let token = login.json["access_token"].as_str().unwrap();

    let me = send(&app, get("/users/me", Some(token))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json["email"], "alice@example.com");
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_register_duplicates_conflict() {
    let (app, _) = create_test_app().await;
    register(&app, "alice").await;

    let same_username = send(
        &app,
        json_request(
            "POST",
            "/users",
            None,
            json!({ "username": "alice", "email": "other@example.com", "password": TEST_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(same_username.status, StatusCode::BAD_REQUEST);
    assert_eq!(same_username.error_code(), "USERNAME_TAKEN");

    let same_email = send(
        &app,
        json_request(
            "POST",
            "/users",
            None,
            json!({ "username": "alice2", "email": "alice@example.com", "password": TEST_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(same_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(same_email.error_code(), "EMAIL_TAKEN");
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_register_enforces_password_policy() {
    let (app, _) = create_test_app().await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/users",
            None,
            json!({ "username": "alice", "email": "alice@example.com", "password": "short" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_self_update() {
    let (app, _) = create_test_app().await;
    register(&app, "bob").await;
    let token = register_and_login(&app, "alice").await;

    // 用户名被他人占用
    let taken = send(
        &app,
        json_request("PUT", "/users/update", Some(&token), json!({ "username": "bob" })),
    )
    .await;
    assert_eq!(taken.error_code(), "USERNAME_TAKEN");

    // 保持自己的邮箱不算冲突，空字符串被忽略
    let updated = send(
        &app,
        json_request(
            "PUT",
            "/users/update",
            Some(&token),
            json!({
                "username": "",
                "full_name": "Alice A.",
                "email": "alice@example.com",
                "password": "NewPass456"
            }),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.json);
    assert_eq!(updated.json["username"], "alice");
    assert_eq!(updated.json["full_name"], "Alice A.");

    // 新密码生效
    let login = send(&app, login_request("alice", "NewPass456")).await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_self_update_rejects_email_wider_than_column() {
    let (app, _) = create_test_app().await;
    let token = register_and_login(&app, "alice").await;

    let response = send(
        &app,
        json_request(
            "PUT",
            "/users/update",
            Some(&token),
            json!({ "email": overlong_email() }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "BAD_REQUEST");

    let me = send(&app, get("/users/me", Some(&token))).await;
    assert_eq!(me.json["email"], "alice@example.com");
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_login_unknown_user_is_unauthorized() {
    let (app, _) = create_test_app().await;
    register(&app, "alice").await;

    let unknown = send(&app, login_request("nobody", TEST_PASSWORD)).await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    // 已知用户的错误密码返回同样的错误
    let wrong = send(&app, login_request("alice", "WrongPass999")).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json["error"]["message"], wrong.json["error"]["message"]);
}
