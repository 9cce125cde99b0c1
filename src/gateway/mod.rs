pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use crate::transfer::TransferCoordinator;
use state::AppState;

/// All routes, with the Swagger UI merged in
pub fn build_router(state: Arc<AppState>) -> Router {
    let transfer_routes = Router::new()
        .route("/{id}", get(handlers::get_transfer))
        .route("/{id}/leave", get(handlers::leave_summary))
        .route("/{id}/gratuity", get(handlers::gratuity_preview))
        .route("/{id}/entries", get(handlers::gratuity_entries))
        .route("/{id}/payslip", post(handlers::generate_payslip))
        .route("/{id}/{action}", post(handlers::transfer_action));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/transfers", post(handlers::create_transfer))
        .nest("/api/v1/transfers", transfer_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(
    config: &GatewayConfig,
    coordinator: Arc<TransferCoordinator>,
) -> anyhow::Result<()> {
    let app = build_router(Arc::new(AppState::new(coordinator)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    tracing::info!(%addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::demo;
    use crate::transfer::{CoordinatorSettings, LogNotifier};

    fn app() -> Router {
        let services = demo::memory_collaborators(Arc::new(LogNotifier));
        let coordinator = TransferCoordinator::new(services, CoordinatorSettings::default());
        build_router(Arc::new(AppState::new(Arc::new(coordinator))))
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, actor: &str, roles: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-actor-id", actor)
            .header("x-actor-roles", roles)
            .header("content-type", "application/json");
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        builder.body(body).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-actor-id", "900")
            .body(Body::empty())
            .unwrap()
    }

    fn draft() -> Value {
        json!({
            "employee_id": demo::EMPLOYEE_ID,
            "kind": "inter",
            "mode": "permanent",
            "requested_date": "2024-02-15",
            "start_date": "2024-03-01",
            "destination": {
                "company_id": demo::DESTINATION_COMPANY_ID,
                "branch_id": 20,
                "department_id": 200,
                "job_id": 2000,
                "reporting_manager": demo::DESTINATION_MANAGER_ID,
                "grade": {"id": 2, "level": 2}
            },
            "structure_id": 7
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0);
        assert!(body["data"]["timestamp_ms"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_lifecycle_over_http() {
        let app = app();
        let (status, body) = call(&app, post("/api/v1/transfers", "900", "", Some(draft()))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["state"], "draft");
        assert_eq!(body["data"]["name"], "INTER/00001");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) =
            call(&app, post(&format!("/api/v1/transfers/{id}/submit"), "900", "", None)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["state"], "submit");

        let (status, body) = call(
            &app,
            post(&format!("/api/v1/transfers/{id}/approve"), "42", "", None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_ne!(body["code"], 0);

        for action in ["approve", "execute"] {
            let (status, body) = call(
                &app,
                post(&format!("/api/v1/transfers/{id}/{action}"), "7", "hr_manager", None),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{action}: {body}");
        }

        let (status, body) = call(&app, get(&format!("/api/v1/transfers/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "transfer");

        let (_, body) = call(&app, get(&format!("/api/v1/transfers/{id}/entries"))).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, body) = call(
            &app,
            post(&format!("/api/v1/transfers/{id}/payslip"), "7", "hr_user", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["data"]["payslip_id"].as_u64().is_some());

        let (status, _) = call(&app, get(&format!("/api/v1/transfers/{id}/leave"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_errors_use_envelope() {
        let app = app();
        let (status, body) = call(&app, get("/api/v1/transfers/not-a-ulid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], types::error_codes::INVALID_PARAMETER);

        let missing = crate::transfer::TransferId::new();
        let (status, body) = call(&app, get(&format!("/api/v1/transfers/{missing}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], types::error_codes::TRANSFER_NOT_FOUND);

        let (status, body) =
            call(&app, get(&format!("/api/v1/transfers/{missing}/entries"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], types::error_codes::TRANSFER_NOT_FOUND);

        for path in ["", "/leave", "/gratuity", "/entries"] {
            let anonymous = Request::builder()
                .uri(format!("/api/v1/transfers/{missing}{path}"))
                .body(Body::empty())
                .unwrap();
            let (status, body) = call(&app, anonymous).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
            assert_eq!(body["code"], types::error_codes::MISSING_ACTOR);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/transfers")
            .header("content-type", "application/json")
            .body(Body::from(draft().to_string()))
            .unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], types::error_codes::MISSING_ACTOR);

        let (_, body) = call(&app, post("/api/v1/transfers", "900", "", Some(draft()))).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        let (status, body) =
            call(&app, post(&format!("/api/v1/transfers/{id}/teleport"), "900", "", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("teleport"));

        let (status, body) = call(
            &app,
            post(&format!("/api/v1/transfers/{id}/execute"), "7", "hr_manager", None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], types::error_codes::INVALID_STATE);
    }
}
