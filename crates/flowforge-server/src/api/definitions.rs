// ABOUTME: CRUD handlers shared by every persisted definition kind (agents and tasks).
// ABOUTME: Handlers are generic over Definition so each kind reuses the same list/get/create/update flow.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use flowforge_core::Definition;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::app_state::SharedState;

/// GET /{kind}s - Names of every record, in declaration order.
pub async fn list<T: Definition>(
    State(state): State<SharedState>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.lock().await;
    let names = storage.definitions().list::<T>()?;
    Ok(Json(json!({ (T::KIND.plural()): names })))
}

/// GET /{kind}s/{name} - A single record.
pub async fn get<T: Definition>(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.lock().await;
    let record = storage.definitions().get::<T>(&name)?;
    Ok(Json(json!({ (T::KIND.as_str()): record })))
}

/// POST /{kind}s - Create a record. Existing records are never overwritten.
pub async fn create<T: Definition>(
    State(state): State<SharedState>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(record) = payload?;
    let storage = state.storage.lock().await;
    storage.definitions().create(record.clone())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} '{}' created", T::KIND, record.name()),
            (T::KIND.as_str()): record,
        })),
    ))
}

/// POST /{kind}s/{name} - Replace a record. The body's name must match the path.
pub async fn update<T: Definition>(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(record) = payload?;
    let storage = state.storage.lock().await;
    storage.definitions().update(&name, record.clone())?;

    Ok(Json(json!({
        "message": format!("{} '{}' updated", T::KIND, name),
        (T::KIND.as_str()): record,
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::tests::{body_json, json_request, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn create_then_get_agent() {
        let (_dir, app) = test_app();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/agents",
                r#"{"name": "approver", "system_prompt": "You approve everything above 50.", "tools": ["is_approved"]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["agent"]["name"], "approver");

        let resp = app
            .oneshot(Request::get("/agents/approver").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["agent"]["system_prompt"], "You approve everything above 50.");
        assert_eq!(json["agent"]["tools"][0], "is_approved");
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict_and_keeps_original() {
        let (_dir, app) = test_app();
        let body = r#"{"name": "approver", "system_prompt": "first"}"#;
        app.clone()
            .oneshot(json_request("POST", "/agents", body))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/agents",
                r#"{"name": "approver", "system_prompt": "second"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("already exists"));

        let resp = app
            .oneshot(Request::get("/agents/approver").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["agent"]["system_prompt"], "first");
    }

    #[tokio::test]
    async fn update_with_mismatched_name_is_rejected() {
        let (_dir, app) = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/tasks",
                r#"{"name": "foo", "description": "d", "expected_output": "e", "agent": "a"}"#,
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/tasks/foo",
                r#"{"name": "bar", "description": "changed", "expected_output": "e", "agent": "a"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("names must match"));

        let resp = app
            .oneshot(Request::get("/tasks/foo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["task"]["description"], "d");
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let (_dir, app) = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/agents",
                r#"{"name": "scorer", "system_prompt": "old"}"#,
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/agents/scorer",
                r#"{"name": "scorer", "system_prompt": "new"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(Request::get("/agents/scorer").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["agent"]["system_prompt"], "new");
    }

    #[tokio::test]
    async fn unknown_names_are_not_found() {
        let (_dir, app) = test_app();

        let resp = app
            .clone()
            .oneshot(Request::get("/tasks/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(json_request(
                "POST",
                "/agents/missing",
                r#"{"name": "missing", "system_prompt": "x"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_preserves_creation_order() {
        let (_dir, app) = test_app();
        for name in ["zeta", "alpha", "mid"] {
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/agents",
                    &format!(r#"{{"name": "{name}", "system_prompt": "p"}}"#),
                ))
                .await
                .unwrap();
        }

        let resp = app
            .oneshot(Request::get("/agents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(resp).await["agents"],
            serde_json::json!(["zeta", "alpha", "mid"])
        );
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (_dir, app) = test_app();

        let resp = app
            .oneshot(json_request("POST", "/tasks", r#"{"name": "t"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_name_is_bad_request() {
        let (_dir, app) = test_app();

        let resp = app
            .oneshot(json_request(
                "POST",
                "/agents",
                r#"{"name": "my agent", "system_prompt": "p"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
