use crate::database::Collection;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Object)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Object)]
#[oai(skip_serializing_if_is_none)]
pub struct ApiResponse<T: poem_openapi::types::ParseFromJSON + poem_openapi::types::ToJSON> {
    pub success: bool,
    #[oai(skip_serializing_if_is_none)]
    pub data: Option<T>,
    #[oai(skip_serializing_if_is_none)]
    pub error: Option<String>,
}

impl<T: poem_openapi::types::ParseFromJSON + poem_openapi::types::ToJSON> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Map a lookup into a response, reporting `not_found` when absent
    pub fn from_lookup(result: anyhow::Result<Option<T>>, not_found: &str) -> Self {
        match result {
            Ok(Some(data)) => Self::ok(data),
            Ok(None) => Self::error(not_found),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

impl<T: poem_openapi::types::ParseFromJSON + poem_openapi::types::ToJSON> From<anyhow::Result<T>>
    for ApiResponse<T>
{
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

pub fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct CollectionView {
    pub id: i64,
    pub store_id: i64,
    pub title: String,
    pub slug: String,
    /// `all` or `any`
    pub combination_mode: String,
}

impl From<Collection> for CollectionView {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id,
            store_id: collection.store_id,
            title: collection.title,
            slug: collection.slug,
            combination_mode: collection.mode.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Object)]
pub struct CreateCartRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Object)]
pub struct AddToCartRequest {
    pub product_id: i64,
    #[oai(default = "default_quantity")]
    pub quantity: i64,
    #[oai(default)]
    pub note: String,
}

#[derive(Debug, Deserialize, Object)]
pub struct RemoveFromCartRequest {
    pub product_id: i64,
}

#[derive(poem_openapi::Tags)]
pub enum ApiTags {
    /// System endpoints
    System,
    /// Store and product listing endpoints
    Stores,
    /// Collection endpoints
    Collections,
    /// Guest and customer cart endpoints
    Carts,
}
