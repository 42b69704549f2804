//! Router tests driving the full API against an in-memory database

use adm_api::{router, AppState};
use adm_auth::{JwtService, PasswordHasher};
use adm_core::config::AppConfig;
use adm_db::{seed_defaults, Database, SeedData};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    token: String,
    _db: Database,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        seed_defaults(
            db.pool(),
            &SeedData {
                admin_username: "admin".into(),
                admin_password_hash: PasswordHasher::new().hash("admin123").unwrap(),
            },
        )
        .await
        .unwrap();

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret-of-some-length".into();
        let app = router(AppState::new(db.pool().clone(), config));

        let mut test_app = Self {
            app,
            token: String::new(),
            _db: db,
        };
        let (_, body) = test_app
            .send(
                Method::POST,
                "/api/auth/login",
                Some(json!({"username": "admin", "password": "admin123"})),
            )
            .await;
        test_app.token = body["data"]["token"].as_str().unwrap().to_string();
        test_app
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.token.is_empty() {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        read(self.app.clone().oneshot(request).await.unwrap()).await
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        read(self.app.clone().oneshot(request).await.unwrap()).await
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_login_success_returns_token_and_user() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send_raw(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"admin","password":"admin123"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["realname"], "Administrator");
    assert!(body["data"]["user"].get("password").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let claims = JwtService::new(b"integration-test-secret-of-some-length", 60)
        .validate_token(token)
        .unwrap();
    assert_eq!(claims.username, "admin");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "admin", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (_, unknown) = app
        .send(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "ghost", "password": "wrong"})),
        )
        .await;
    assert_eq!(unknown["msg"], body["msg"]);

    let (status, body) = app
        .send(Method::POST, "/api/auth/login", Some(json!({"username": "admin"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_logout_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send_raw(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": 200, "msg": "success"}));
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_raw(Request::get("/api/users").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = app
        .send_raw(
            Request::get("/api/auth/profile")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtService::new(b"integration-test-secret-of-some-length", -120)
        .create_token(1, "admin")
        .unwrap();
    let (status, body) = app
        .send_raw(
            Request::get("/api/auth/profile")
                .header(header::AUTHORIZATION, format!("Bearer {}", expired))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token expired");
}

#[tokio::test]
async fn test_profile_lists_permissions() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/auth/profile", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["role"]["code"], "admin");
    assert_eq!(body["data"]["permissions"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_user_crud_and_duplicate_username() {
    let app = TestApp::new().await;
    let new_user = json!({
        "username": "bob",
        "password": "secret1",
        "realname": "Bob",
        "email": "bob@example.com",
        "role_id": 2
    });

    let (status, body) = app.send(Method::POST, "/api/users", Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"]["code"], "user");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app.send(Method::POST, "/api/users", Some(new_user)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{id}"),
            Some(json!({"realname": "Robert", "role_id": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["realname"], "Robert");
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["role_id"], Value::Null);

    let (status, _) = app.send(Method::DELETE, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_user_validation_and_self_delete() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users",
            Some(json!({"username": "x", "password": "1", "realname": "X", "email": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);

    let (status, _) = app.send(Method::DELETE, "/api/users/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Password length counts characters on create and update alike
    let (status, body) = app
        .send(
            Method::POST,
            "/api/users",
            Some(json!({
                "username": "yuki",
                "password": "ÿÿÿÿÿÿ",
                "realname": "Yuki",
                "email": "yuki@example.com"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{id}"),
            Some(json!({"password": "éééééé"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{id}"),
            Some(json!({"password": "ééééé"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app.send(Method::GET, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send_raw(
            Request::post("/api/users")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_user_pagination() {
    let app = TestApp::new().await;
    for i in 0..11 {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/users",
                Some(json!({
                    "username": format!("user{i}"),
                    "password": "secret1",
                    "realname": "User",
                    "email": format!("user{i}@example.com")
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app.send(Method::GET, "/api/users?page=2&pageSize=5", None).await;
    assert_eq!(body["data"]["total"], 12);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["pageSize"], 5);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 5);

    let (_, body) = app.send(Method::GET, "/api/users", None).await;
    assert_eq!(body["data"]["pageSize"], 10);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 10);

    let (_, body) = app.send(Method::GET, "/api/users?page=0&pageSize=1000", None).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["pageSize"], 100);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_pagination_extremes() {
    let app = TestApp::new().await;

    for uri in [
        "/api/users?page=9223372036854775807&pageSize=10",
        "/api/roles?page=9223372036854775807&pageSize=100",
    ] {
        let (status, body) = app.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["data"]["page"], adm_core::MAX_PAGE, "{uri}");
        assert!(body["data"]["list"].as_array().unwrap().is_empty(), "{uri}");
        assert!(body["data"]["total"].as_i64().unwrap() > 0, "{uri}");
    }

    let (status, body) = app.send(Method::GET, "/api/roles?page=abc&pageSize=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["pageSize"], 1);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_role_delete_clears_associations_only() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(Method::POST, "/api/roles", Some(json!({"name": "Auditor", "code": "auditor"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/roles/{role_id}/permissions"),
            Some(json!({"permission_ids": [1, 2, 2, 9999]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(Method::GET, &format!("/api/roles/{role_id}/permissions"), None)
        .await;
    assert_eq!(body["data"]["role_id"], role_id);
    assert_eq!(body["data"]["permission_ids"], json!([1, 2]));
    let system = &body["data"]["permission_trees"][0];
    assert_eq!(system["code"], "system");
    assert_eq!(system["checked"], true);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/roles/{role_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(Method::GET, "/api/permissions", None).await;
    assert_eq!(body["data"]["total"], 15);

    let (status, _) = app.send(Method::GET, &format!("/api/roles/{role_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_code_conflict_and_detail() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(Method::POST, "/api/roles", Some(json!({"name": "Dup", "code": "admin"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.send(Method::GET, "/api/roles/1", None).await;
    assert_eq!(body["data"]["code"], "admin");
    assert_eq!(body["data"]["permissions"].as_array().unwrap().len(), 15);

    let (_, body) = app.send(Method::GET, "/api/roles?pageSize=1", None).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permission_tree_and_crud() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/permissions/tree", None).await;
    assert_eq!(status, StatusCode::OK);
    let roots: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(roots, vec!["system", "dashboard"]);
    let menus: Vec<_> = body["data"][0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(menus, vec!["system:user", "system:role", "system:permission"]);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/permissions",
            Some(json!({"name": "Export", "code": "system:user:export", "parent_code": "system:user", "type": 3, "sort": 9})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], 3);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/permissions/{id}"),
            Some(json!({"type": 7})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(Method::POST, "/api/roles/1/permissions", Some(json!({"permission_ids": [id]})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/permissions/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(Method::GET, "/api/roles/1/permissions", None).await;
    assert_eq!(body["data"]["permission_ids"], json!([]));

    let (status, _) = app
        .send(Method::GET, &format!("/api/permissions/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
