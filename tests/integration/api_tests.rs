//! API integration tests
//!
//! Drive the full router in-process against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lendings_server::{
    api,
    config::{AppConfig, StoreBackend},
    models::user::Role,
    repository::Repository,
    services::Services,
    AppState,
};

const API_KEY: &str = "integration-key";

struct TestApp {
    router: Router,
    repository: Repository,
}

fn test_app() -> TestApp {
    let mut config = AppConfig::default();
    config.auth.api_key = API_KEY.to_string();
    config.auth.jwt_secret = "integration-secret".to_string();
    config.store.backend = StoreBackend::Memory;

    let repository = Repository::in_memory(Duration::from_secs(2));
    let services = Services::new(repository.clone(), config.auth.clone());
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    TestApp {
        router: api::create_router(state),
        repository,
    }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.call_with_key(method, uri, Some(API_KEY), token, body).await
    }

    async fn call_with_key(
        &self,
        method: Method,
        uri: &str,
        api_key: Option<&str>,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "secret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Register, promote directly in the store, then log in
    async fn admin_token(&self) -> String {
        let id = self.register("Admin", "admin@campus.edu").await;
        self.repository
            .users
            .update_role(id.parse().unwrap(), Role::Admin)
            .await
            .unwrap();
        self.login("admin@campus.edu").await
    }

    async fn create_item(&self, admin: &str, total: i32) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/admin/items",
                Some(admin),
                Some(json!({ "name": "Projector", "category": "AV", "stock_total": total })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_outside_the_key_gate() {
    let app = test_app();
    let (status, body) = app.call_with_key(Method::GET, "/health", None, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_reaches_the_store() {
    let app = test_app();
    let (status, body) = app.call_with_key(Method::GET, "/ready", None, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn missing_or_wrong_api_key_is_rejected_with_envelope() {
    let app = test_app();

    let (status, body) = app
        .call_with_key(Method::GET, "/api/items", None, None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert!(body.get("data").is_none());

    let (status, _) = app
        .call_with_key(
            Method::POST,
            "/api/auth/register",
            Some("wrong-key"),
            None,
            Some(json!({ "name": "A", "email": "a@campus.edu", "password": "secret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.repository.users.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn identity_is_required_after_admission() {
    let app = test_app();
    let (status, body) = app.call(Method::GET, "/api/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.call(Method::GET, "/api/items", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_case() {
    let app = test_app();
    app.register("Siti", "siti@campus.edu").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Siti", "email": "  SITI@Campus.edu ", "password": "secret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = test_app();
    app.register("Siti", "siti@campus.edu").await;

    let (unknown_status, unknown) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@campus.edu", "password": "secret-pass" })),
        )
        .await;
    let (wrong_status, wrong) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "siti@campus.edu", "password": "nope-nope" })),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["message"], wrong["message"]);
}

#[tokio::test]
async fn borrow_and_return_flow() {
    let app = test_app();
    let admin = app.admin_token().await;
    let item_id = app.create_item(&admin, 5).await;

    app.register("Budi", "budi@campus.edu").await;
    let member = app.login("budi@campus.edu").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/lendings",
            Some(&member),
            Some(json!({ "item_id": item_id, "quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "borrowed");
    let lending_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/lendings",
            Some(&member),
            Some(json!({ "item_id": item_id, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (_, body) = app.call(Method::GET, &format!("/api/items/{item_id}"), Some(&member), None).await;
    assert_eq!(body["data"]["stock_available"], 0);

    let (status, body) = app
        .call(Method::POST, &format!("/api/returns/{lending_id}"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "returned");

    let (status, _) = app
        .call(Method::POST, &format!("/api/returns/{lending_id}"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.call(Method::GET, &format!("/api/items/{item_id}"), Some(&member), None).await;
    assert_eq!(body["data"]["stock_available"], 5);

    let (status, body) = app.call(Method::GET, "/api/history", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["item_name"], "Projector");

    let (status, body) = app.call(Method::GET, "/api/admin/reconciliation", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discrepancies"], json!([]));
}

#[tokio::test]
async fn member_cannot_delete_items_but_admin_can() {
    let app = test_app();
    let admin = app.admin_token().await;
    let item_id = app.create_item(&admin, 1).await;

    app.register("Budi", "budi@campus.edu").await;
    let member = app.login("budi@campus.edu").await;

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/items/{item_id}"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/items/{item_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.call(Method::GET, &format!("/api/items/{item_id}"), Some(&member), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_promotes_member_by_role_update() {
    let app = test_app();
    let admin = app.admin_token().await;
    let member_id = app.register("Budi", "budi@campus.edu").await;

    let (status, _) = app
        .call(
            Method::PATCH,
            &format!("/api/admin/users/{member_id}/role"),
            Some(&admin),
            Some(json!({ "role": "owner" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/api/admin/users/{member_id}/role"),
            Some(&admin),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = app.call(Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn malformed_path_id_is_a_validation_error() {
    let app = test_app();
    app.register("Budi", "budi@campus.edu").await;
    let member = app.login("budi@campus.edu").await;

    let (status, body) = app.call(Method::GET, "/api/items/not-a-uuid", Some(&member), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_json_body_is_a_validation_envelope() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header("X-API-Key", API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    app.register("Budi", "budi@campus.edu").await;
    let member = app.login("budi@campus.edu").await;
    let (status, body) = app
        .call(Method::POST, "/api/lendings", Some(&member), Some(json!({ "quantity": "two" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_routes_answer_with_envelope() {
    let app = test_app();

    let (status, body) = app.call(Method::GET, "/api/no-such-route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("/api/no-such-route"));

    let (status, _) = app
        .call_with_key(Method::GET, "/api/no-such-route", None, None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call_with_key(Method::GET, "/nowhere", None, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
