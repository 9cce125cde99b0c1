//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::types::{HealthResponse, PayslipData};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Company Transfer API",
        version = "1.0.0",
        description = "Inter/intra-company employee transfers with gratuity postings. The caller is identified by the X-Actor-Id, X-Actor-Email and X-Actor-Roles headers."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::get_transfer,
        crate::gateway::handlers::transfer_action,
        crate::gateway::handlers::generate_payslip,
        crate::gateway::handlers::leave_summary,
        crate::gateway::handlers::gratuity_preview,
        crate::gateway::handlers::gratuity_entries,
    ),
    components(schemas(HealthResponse, PayslipData)),
    tags(
        (name = "Transfer", description = "Transfer lifecycle"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Company Transfer API");
        assert!(doc.to_json().is_ok());
    }

    #[test]
    fn test_transfer_endpoints_registered() {
        let paths = ApiDoc::openapi().paths.paths;
        assert!(paths.contains_key("/api/v1/health"));
        assert!(paths.contains_key("/api/v1/transfers"));
        assert!(paths.contains_key("/api/v1/transfers/{id}/{action}"));
        assert!(paths.contains_key("/api/v1/transfers/{id}/leave"));
    }
}
