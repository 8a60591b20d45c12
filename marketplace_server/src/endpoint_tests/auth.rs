use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Duration;
use marketplace_engine::{
    db_types::{Role, User},
    helpers::hash_password,
    traits::AuthApiError,
};
use serde_json::json;

use super::{
    helpers::{active_accounts, api_request, issue_token, json_body, public_request, user_fixture, user_token},
    mocks::MockAuthManager,
};
use crate::{
    auth::ACCESS_TOKEN_HEADER,
    routes::{ChangePasswordRoute, CheckTokenRoute, LoginRoute, RegisterRoute},
};

fn account_with_password(id: i64, password: &str) -> User {
    User { password_hash: hash_password(password).expect("Failed to hash password"), ..user_fixture(id) }
}

fn login_backend(user: User, roles: Vec<Role>) -> MockAuthManager {
    let mut auth = MockAuthManager::new();
    let login_user = user.clone();
    auth.expect_fetch_user_for_login()
        .returning(move |login| Ok((login == login_user.username).then(|| login_user.clone())));
    auth.expect_record_login().returning(|_| Ok(()));
    auth.expect_fetch_roles_for_user().returning(move |_| Ok(roles.clone()));
    auth
}

async fn login(auth: MockAuthManager, body: serde_json::Value) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/auth/login").set_json(body);
    public_request(req, |cfg| {
        cfg.app_data(actix_web::web::Data::new(marketplace_engine::AuthApi::new(auth)))
            .service(LoginRoute::<MockAuthManager>::new());
    })
    .await
}

#[actix_web::test]
async fn register_creates_user() {
    let _ = env_logger::try_init().ok();
    let mut auth = MockAuthManager::new();
    auth.expect_create_user().returning(|new_user| {
        assert_ne!(new_user.password_hash, "correct horse battery");
        assert!(new_user.password_hash.starts_with("$argon2"));
        Ok(User { username: new_user.username, email: new_user.email, ..user_fixture(7) })
    });
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "correct horse battery"
    }));
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(actix_web::web::Data::new(marketplace_engine::AuthApi::new(auth)))
            .service(RegisterRoute::<MockAuthManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json_body(&body);
    assert_eq!(body["id"], 7);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["user"]));
    assert!(body.get("password_hash").is_none());
}

#[actix_web::test]
async fn register_rejects_short_password() {
    let _ = env_logger::try_init().ok();
    let mut auth = MockAuthManager::new();
    auth.expect_create_user().never();
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "short"
    }));
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(actix_web::web::Data::new(marketplace_engine::AuthApi::new(auth)))
            .service(RegisterRoute::<MockAuthManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("password"), "{body}");
}

#[actix_web::test]
async fn register_reports_taken_username() {
    let _ = env_logger::try_init().ok();
    let mut auth = MockAuthManager::new();
    auth.expect_create_user().returning(|_| Err(AuthApiError::UsernameTaken));
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "correct horse battery"
    }));
    let (status, _) = public_request(req, |cfg| {
        cfg.app_data(actix_web::web::Data::new(marketplace_engine::AuthApi::new(auth)))
            .service(RegisterRoute::<MockAuthManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn login_issues_token() {
    let _ = env_logger::try_init().ok();
    let user = account_with_password(3, "correct horse battery");
    let auth = login_backend(user, vec![Role::User, Role::Admin]);
    let (status, body) = login(auth, json!({"login": "user3", "password": "correct horse battery"})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["roles"], json!(["user", "admin"]));
    let token = body["access_token"].as_str().expect("access_token missing");
    let claims = super::helpers::issuer().verify_token(token).expect("token did not verify");
    assert_eq!(claims.sub, 3);
    assert!(claims.is_admin());
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let user = account_with_password(3, "correct horse battery");
    let auth = login_backend(user, vec![Role::User]);
    let (status, body) = login(auth, json!({"login": "user3", "password": "incorrect horse"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown) = login(
        login_backend(account_with_password(3, "correct horse battery"), vec![Role::User]),
        json!({"login": "nobody", "password": "incorrect horse"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Unknown accounts and bad passwords are indistinguishable
    assert_eq!(body, unknown);
}

#[actix_web::test]
async fn disabled_account_cannot_log_in() {
    let _ = env_logger::try_init().ok();
    let user = User { disabled: true, ..account_with_password(4, "correct horse battery") };
    let mut auth = MockAuthManager::new();
    auth.expect_fetch_user_for_login().returning(move |_| Ok(Some(user.clone())));
    auth.expect_record_login().never();
    let (status, _) = login(auth, json!({"login": "user4", "password": "correct horse battery"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn check_token_returns_claims() {
    let _ = env_logger::try_init().ok();
    let token = user_token(12);
    let req = TestRequest::get().uri("/api/check_token");
    let (status, body) = api_request(req, Some(&token), active_accounts(), |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["sub"], "12");
    assert_eq!(body["roles"], json!(["user"]));
}

#[actix_web::test]
async fn token_in_custom_header_is_accepted() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/check_token").insert_header((ACCESS_TOKEN_HEADER, user_token(12)));
    let (status, _) = api_request(req, None, active_accounts(), |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/check_token");
    let (status, body) = api_request(req, None, active_accounts(), |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json_body(&body)["error"].is_string());
}

#[actix_web::test]
async fn expired_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(12, vec![Role::User], Duration::minutes(-10));
    let req = TestRequest::get().uri("/api/check_token");
    let (status, _) = api_request(req, Some(&token), active_accounts(), |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn tampered_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let token = user_token(12);
    let mut parts = token.split('.').map(String::from).collect::<Vec<_>>();
    // Swap in the payload of another user's token
    parts[1] = user_token(1).split('.').nth(1).unwrap_or_default().to_string();
    let token = parts.join(".");
    let req = TestRequest::get().uri("/api/check_token");
    let (status, _) = api_request(req, Some(&token), active_accounts(), |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn disabled_account_token_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut auth = MockAuthManager::new();
    auth.expect_fetch_login_record().returning(|id| Ok(Some(User { disabled: true, ..user_fixture(id) })));
    let req = TestRequest::get().uri("/api/check_token");
    let (status, _) = api_request(req, Some(&user_token(12)), auth, |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn deleted_account_token_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut auth = MockAuthManager::new();
    auth.expect_fetch_login_record().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/check_token");
    let (status, _) = api_request(req, Some(&user_token(12)), auth, |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn change_password_checks_current_password() {
    let _ = env_logger::try_init().ok();
    let user = account_with_password(12, "correct horse battery");
    let mut auth = MockAuthManager::new();
    auth.expect_fetch_login_record().returning(move |_| Ok(Some(user.clone())));
    auth.expect_update_password_hash().never();
    let req = TestRequest::post()
        .uri("/api/me/password")
        .set_json(json!({"current_password": "wrong password", "new_password": "a brand new secret"}));
    let (status, _) = api_request(req, Some(&user_token(12)), auth, |cfg| {
        cfg.service(ChangePasswordRoute::<MockAuthManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
