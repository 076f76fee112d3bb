use axum::{routing::{get, put}, Router};

use crate::handlers::product::{
    admin_get_product, admin_list_products, create_product, delete_product, list_products, list_providers,
    update_product,
};
use crate::handlers::product_category::{
    admin_list_product_categories, create_product_category, delete_product_category, list_product_categories,
    update_product_category,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/product-categories", get(list_product_categories))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin_list_products).post(create_product))
        .route("/products/providers", get(list_providers))
        .route("/products/{id}", get(admin_get_product).put(update_product).delete(delete_product))
        .route("/product-categories", get(admin_list_product_categories).post(create_product_category))
        .route("/product-categories/{id}", put(update_product_category).delete(delete_product_category))
}
