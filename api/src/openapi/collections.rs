use super::common::{ApiResponse, ApiTags, CollectionView};
use crate::database::{now_ns, Database, Product};
use poem::web::Data;
use poem_openapi::{param::Path, payload::Json, OpenApi};
use std::sync::Arc;

pub struct CollectionsApi;

#[OpenApi]
impl CollectionsApi {
    /// List store collections
    #[oai(path = "/stores/:slug/collections", method = "get", tag = "ApiTags::Collections")]
    async fn list_collections(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
    ) -> Json<ApiResponse<Vec<CollectionView>>> {
        let result = db
            .list_collections(&slug.0)
            .await
            .map(|collections| collections.into_iter().map(CollectionView::from).collect());
        Json(result.into())
    }

    /// Get collection products
    ///
    /// Returns the visible products matching the collection's conditions
    #[oai(
        path = "/stores/:slug/collections/:id/products",
        method = "get",
        tag = "ApiTags::Collections"
    )]
    async fn get_collection_products(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
        id: Path<i64>,
    ) -> Json<ApiResponse<Vec<Product>>> {
        let store = match db.get_store_by_slug(&slug.0).await {
            Ok(Some(store)) => store,
            Ok(None) => return Json(ApiResponse::error("Store not found")),
            Err(e) => return Json(ApiResponse::error(e.to_string())),
        };
        match db.get_collection(id.0).await {
            Ok(Some(collection)) if collection.store_id == store.id => {}
            Ok(_) => return Json(ApiResponse::error("Collection not found")),
            Err(e) => return Json(ApiResponse::error(e.to_string())),
        }

        Json(db.get_collection_products(id.0, now_ns()).await.into())
    }
}
