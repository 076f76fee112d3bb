use axum::{middleware, routing::{delete, get, post, put}, Router};

use crate::handlers::flash_sale::{
    admin_list_flash_sales, attach_product, create_flash_sale, delete_flash_sale, detach_product, get_flash_sale,
    list_active_flash_sales, list_upcoming_flash_sales, update_flash_sale,
};
use crate::handlers::voucher::{
    admin_get_voucher, admin_list_vouchers, check_voucher_code, create_voucher, delete_voucher, list_vouchers,
    set_voucher_games, update_voucher,
};
use crate::middleware::auth::attach_viewer;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/flash-sales", get(list_active_flash_sales))
        .route("/flash-sales/upcoming", get(list_upcoming_flash_sales))
        .route("/flash-sales/{id}", get(get_flash_sale))
        .route("/vouchers", get(list_vouchers))
        .route("/vouchers/{code}/check", get(check_voucher_code))
        .layer(middleware::from_fn_with_state(state.clone(), attach_viewer))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/flash-sales", get(admin_list_flash_sales).post(create_flash_sale))
        .route("/flash-sales/{id}", put(update_flash_sale).delete(delete_flash_sale))
        .route("/flash-sales/{id}/products", post(attach_product))
        .route("/flash-sales/{id}/products/{product_id}", delete(detach_product))
        .route("/vouchers", get(admin_list_vouchers).post(create_voucher))
        .route("/vouchers/{id}", get(admin_get_voucher).put(update_voucher).delete(delete_voucher))
        .route("/vouchers/{id}/games", put(set_voucher_games))
}
