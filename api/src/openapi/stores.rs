use super::common::{ApiResponse, ApiTags};
use crate::database::{now_ns, Database, Product, Store};
use poem::web::Data;
use poem_openapi::{param::Path, payload::Json, OpenApi};
use std::sync::Arc;

pub struct StoresApi;

#[OpenApi]
impl StoresApi {
    /// List stores
    #[oai(path = "/stores", method = "get", tag = "ApiTags::Stores")]
    async fn list_stores(&self, db: Data<&Arc<Database>>) -> Json<ApiResponse<Vec<Store>>> {
        Json(db.list_stores().await.into())
    }

    /// Get store by slug
    #[oai(path = "/stores/:slug", method = "get", tag = "ApiTags::Stores")]
    async fn get_store(&self, db: Data<&Arc<Database>>, slug: Path<String>) -> Json<ApiResponse<Store>> {
        Json(ApiResponse::from_lookup(
            db.get_store_by_slug(&slug.0).await,
            "Store not found",
        ))
    }

    /// List store products
    ///
    /// Returns the store's published products that are already available
    #[oai(path = "/stores/:slug/products", method = "get", tag = "ApiTags::Stores")]
    async fn list_products(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
    ) -> Json<ApiResponse<Vec<Product>>> {
        if let Err(e) = db.require_store_by_slug(&slug.0).await {
            return Json(ApiResponse::error(e.to_string()));
        }
        Json(db.list_visible_products(&slug.0, now_ns()).await.into())
    }
}
