use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Plan, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

/// Register `name` and log in, returning the bearer token.
async fn signed_in(app: &Router, name: &str) -> String {
    let body = format!(r#"{{"username":"{name}","email":"{name}@x.org","password":"pw"}}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/register", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(format!("username={name}&password=pw"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: serde_json::Value = body_json(resp).await;
    token["access_token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn me_requires_token() {
    let resp = app().oneshot(get("/api/v1/auth/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_rejects_unknown_token() {
    let resp = app()
        .oneshot(get("/api/v1/auth/me", Some("not-issued")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_me() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app.oneshot(get("/api/v1/auth/me", Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "ana");
}

#[tokio::test]
async fn login_rejects_json_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            r#"{"username":"a","password":"b"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn duplicate_registration_carries_message() {
    let app = app();
    signed_in(&app, "ana").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            r#"{"username":"ana","email":"other@x.org","password":"pw"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "El usuario ya existe");
}

// --- plans ---

#[tokio::test]
async fn create_and_list_owned() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/plans", Some(&token), r#"{"name":"Plan 2027"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let plan: Plan = body_json(resp).await;

    let resp = app.oneshot(get("/api/v1/plans/owned", Some(&token))).await.unwrap();
    let owned: Vec<Plan> = body_json(resp).await;
    assert_eq!(owned, vec![plan]);
}

#[tokio::test]
async fn static_routes_win_over_plan_id() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app
        .oneshot(get("/api/v1/plans/notifications", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "[]");
}

#[tokio::test]
async fn foreign_plan_is_forbidden() {
    let app = app();
    let ana = signed_in(&app, "ana").await;
    let bob = signed_in(&app, "bob").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/plans", Some(&ana), r#"{"name":"Privado"}"#))
        .await
        .unwrap();
    let plan: Plan = body_json(resp).await;

    let resp = app
        .oneshot(get(&format!("/api/v1/plans/{}", plan.id), Some(&bob)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_plan_is_404() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app.oneshot(get("/api/v1/plans/999", Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_plan_id_returns_400() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app.oneshot(get("/api/v1/plans/abc", Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- sections ---

#[tokio::test]
async fn quick_section_write_is_readable_as_full_section() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/plans", Some(&token), r#"{"name":"P"}"#))
        .await
        .unwrap();
    let plan: Plan = body_json(resp).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/plans/{}/swot", plan.id),
            Some(&token),
            r#"{"strengths":["equipo"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get(&format!("/api/v1/plans/{}/strategic-analysis", plan.id), Some(&token)))
        .await
        .unwrap();
    let section: serde_json::Value = body_json(resp).await;
    assert_eq!(section["strengths"][0], "equipo");
}

#[tokio::test]
async fn unknown_section_is_404() {
    let app = app();
    let token = signed_in(&app, "ana").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/plans", Some(&token), r#"{"name":"P"}"#))
        .await
        .unwrap();
    let plan: Plan = body_json(resp).await;
    let resp = app
        .oneshot(get(&format!("/api/v1/plans/{}/swot", plan.id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
