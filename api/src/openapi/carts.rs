use super::common::{AddToCartRequest, ApiResponse, ApiTags, CreateCartRequest, RemoveFromCartRequest};
use crate::config::AppConfig;
use crate::database::{now_ns, Cart, Database};
use poem::web::Data;
use poem_openapi::{param::Path, payload::Json, OpenApi};
use std::sync::Arc;

pub struct CartsApi;

/// Load a cart and make sure it belongs to the store in the path
async fn store_cart(db: &Database, slug: &str, cart_id: &str) -> Result<Cart, String> {
    let store = db
        .get_store_by_slug(slug)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Store not found".to_string())?;
    match db.get_cart(cart_id).await.map_err(|e| e.to_string())? {
        Some(cart) if cart.store_id == store.id => Ok(cart),
        _ => Err("Cart not found".to_string()),
    }
}

#[OpenApi]
impl CartsApi {
    /// Create cart
    ///
    /// Opens a cart in the store; omit `user_id` for a guest cart
    #[oai(path = "/stores/:slug/carts", method = "post", tag = "ApiTags::Carts")]
    async fn create_cart(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&AppConfig>,
        slug: Path<String>,
        req: Json<CreateCartRequest>,
    ) -> Json<ApiResponse<Cart>> {
        Json(
            db.create_cart(
                &slug.0,
                req.0.user_id.as_deref(),
                now_ns(),
                config.cart_lifetime_days,
            )
            .await
            .into(),
        )
    }

    /// Get cart
    #[oai(path = "/stores/:slug/carts/:id", method = "get", tag = "ApiTags::Carts")]
    async fn get_cart(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
        id: Path<String>,
    ) -> Json<ApiResponse<Cart>> {
        match store_cart(&db, &slug.0, &id.0).await {
            Ok(cart) => Json(ApiResponse::ok(cart)),
            Err(e) => Json(ApiResponse::error(e)),
        }
    }

    /// Add product to cart
    ///
    /// Adds `quantity` (default 1) of the product, merging with an existing line
    #[oai(
        path = "/stores/:slug/carts/:id/add-to-cart",
        method = "post",
        tag = "ApiTags::Carts"
    )]
    async fn add_to_cart(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
        id: Path<String>,
        req: Json<AddToCartRequest>,
    ) -> Json<ApiResponse<Cart>> {
        if let Err(e) = store_cart(&db, &slug.0, &id.0).await {
            return Json(ApiResponse::error(e));
        }
        Json(
            db.add_to_cart(&id.0, req.product_id, req.quantity, &req.note)
                .await
                .into(),
        )
    }

    /// Remove product from cart
    #[oai(
        path = "/stores/:slug/carts/:id/remove-from-cart",
        method = "post",
        tag = "ApiTags::Carts"
    )]
    async fn remove_from_cart(
        &self,
        db: Data<&Arc<Database>>,
        slug: Path<String>,
        id: Path<String>,
        req: Json<RemoveFromCartRequest>,
    ) -> Json<ApiResponse<Cart>> {
        if let Err(e) = store_cart(&db, &slug.0, &id.0).await {
            return Json(ApiResponse::error(e));
        }
        Json(db.remove_from_cart(&id.0, req.product_id).await.into())
    }
}
