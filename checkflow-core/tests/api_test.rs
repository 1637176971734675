//! HTTP API driven through warp's test client

mod common;

use checkflow_core::server::{create_api_routes, AppState};
use common::Bank;
use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::test::request;
use warp::Filter;

struct Api<F> {
    routes: F,
}

impl<F> Api<F>
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: warp::Reply + Send,
{
    async fn call(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = request().method(method).path(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.reply(&self.routes).await;
        let value = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
        (response.status(), value)
    }

    async fn login(&self, employee_id: &str, credential: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"employee_id": employee_id, "credential": credential})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

fn api() -> (Bank, Api<impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone>) {
    let bank = Bank::new();
    let routes = create_api_routes(AppState::new(bank.app.clone()));
    (bank, Api { routes })
}

fn create_body() -> Value {
    json!({
        "type": "UPDATE_USER",
        "title": "Reset password for X",
        "description": "Locked out after travel",
        "payload": {"employee_id": "E-55"}
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let (_bank, api) = api();
    let (status, body) = api.call("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_approval_round_trip() {
    let (bank, api) = api();
    let maker = api.login("M-1", "M-1-secret").await;
    let checker = api.login("C-3", "C-3-secret").await;

    let (status, created) = api
        .call("POST", "/api/v1/approvals", Some(&maker), Some(create_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["request_type"], "UPDATE_USER");
    let id = created["id"].as_u64().unwrap();

    let (status, queue) = api
        .call("GET", "/api/v1/approvals/queue", Some(&checker), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let (status, approved) = api
        .call(
            "POST",
            &format!("/api/v1/approvals/{}/approve", id),
            Some(&checker),
            Some(json!({"remarks": "verified identity"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["reviewer"], bank.checker_3.user_id.value());

    let (status, detail) = api
        .call("GET", &format!("/api/v1/approvals/{}", id), Some(&maker), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<_> = detail["trail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, vec!["CREATE", "ASSIGN", "APPROVE"]);

    let root = api.login("ROOT", "root-secret").await;
    let (status, stats) = api
        .call("GET", "/api/v1/approvals/statistics", Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["approved"], 1);
    assert_eq!(stats["approval_rate"], 100);
}

#[tokio::test]
async fn test_error_statuses() {
    let (_bank, api) = api();

    let (status, body) = api.call("GET", "/api/v1/approvals/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_error");

    let (status, body) = api
        .call(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"employee_id": "M-1", "credential": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "action not permitted");

    let maker = api.login("M-1", "M-1-secret").await;
    let checker = api.login("C-3", "C-3-secret").await;
    let outsider = api.login("C-9", "C-9-secret").await;

    let mut blank = create_body();
    blank["title"] = json!("  ");
    let (status, body) = api
        .call("POST", "/api/v1/approvals", Some(&maker), Some(blank))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "title is required");

    let (_, created) = api
        .call("POST", "/api/v1/approvals", Some(&maker), Some(create_body()))
        .await;
    let approve = format!("/api/v1/approvals/{}/approve", created["id"]);

    let (status, body) = api
        .call("POST", &approve, Some(&outsider), Some(json!({"remarks": "ok"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "authorization_error");

    let (status, _) = api
        .call("POST", &approve, Some(&checker), Some(json!({"remarks": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api
        .call("POST", &approve, Some(&checker), Some(json!({"remarks": "ok"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api
        .call("POST", &approve, Some(&checker), Some(json!({"remarks": "again"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");

    let (status, body) = api
        .call("GET", "/api/v1/approvals/4040", Some(&checker), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let (_bank, api) = api();
    let maker = api.login("M-1", "M-1-secret").await;

    let (status, me) = api.call("GET", "/api/v1/auth/me", Some(&maker), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["employee_id"], "M-1");
    assert_eq!(me["capabilities"], json!(["create_request"]));

    let (status, _) = api
        .call("POST", "/api/v1/auth/logout", Some(&maker), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = api.call("GET", "/api/v1/auth/me", Some(&maker), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_endpoints() {
    let (bank, api) = api();
    let root = api.login("ROOT", "root-secret").await;
    let maker = api.login("M-1", "M-1-secret").await;

    let (status, _) = api
        .call("GET", "/api/v1/admin/users", Some(&maker), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = api
        .call(
            "POST",
            "/api/v1/admin/users",
            Some(&root),
            Some(json!({
                "display_name": "Nia Checker",
                "employee_id": "C-12",
                "roles": ["CHECKER"],
                "unit": bank.branch_12.value(),
                "credential": "nia-secret"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["roles"], json!(["CHECKER"]));

    let (status, users) = api
        .call("GET", "/api/v1/admin/users?search=nia", Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, units) = api
        .call("GET", "/api/v1/admin/units", Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units.as_array().unwrap().len(), 4);

    let (status, roles) = api
        .call("GET", "/api/v1/admin/roles", Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles.as_array().unwrap().len(), 4);

    let path = format!("/api/v1/admin/users/{}/deactivate", created["id"]);
    let (status, deactivated) = api.call("POST", &path, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["active"], false);
}
