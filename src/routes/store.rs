use axum::{routing::{get, post, put}, Router};

use crate::handlers::digiflazz::{list_brands, list_product_types, sync_products};
use crate::handlers::payment_method::{
    admin_list_payment_methods, create_payment_method, delete_payment_method, list_payment_methods,
    update_payment_method,
};
use crate::handlers::role::{create_role, delete_role, list_roles, update_role};
use crate::handlers::transaction::{get_transaction, list_transactions, update_transaction_status};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/payment-methods", get(list_payment_methods))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/payment-methods", get(admin_list_payment_methods).post(create_payment_method))
        .route("/payment-methods/{id}", put(update_payment_method).delete(delete_payment_method))
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/{id}", put(update_role).delete(delete_role))
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/status", put(update_transaction_status))
        .route("/digiflazz/brands", get(list_brands))
        .route("/digiflazz/games/{id}/types", get(list_product_types))
        .route("/digiflazz/sync", post(sync_products))
}
