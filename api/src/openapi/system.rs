use super::common::{ApiTags, HealthResponse};
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;

pub struct SystemApi;

#[OpenApi]
impl SystemApi {
    /// Health check endpoint
    ///
    /// Returns the health status of the API server
    #[oai(path = "/health", method = "get", tag = "ApiTags::System")]
    async fn health(&self) -> Json<HealthResponse> {
        Json(HealthResponse {
            success: true,
            message: "Storefront API is running".to_string(),
        })
    }
}
