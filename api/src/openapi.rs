pub mod carts;
pub mod collections;
pub mod common;
pub mod stores;
pub mod system;

pub use carts::CartsApi;
pub use collections::CollectionsApi;
pub use stores::StoresApi;
pub use system::SystemApi;

use poem_openapi::OpenApi;

/// Combines all API modules into a single OpenAPI specification
pub fn create_combined_api() -> impl OpenApi {
    (SystemApi, StoresApi, CollectionsApi, CartsApi)
}
