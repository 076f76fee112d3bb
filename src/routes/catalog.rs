use axum::{middleware, routing::{get, post, put}, Router};

use crate::handlers::category::{
    admin_list_categories, create_category, delete_category, get_category, list_categories, update_category,
};
use crate::handlers::game::{
    admin_get_game, admin_list_games, create_game, delete_game, get_configuration_fields, get_configuration_info,
    get_game, get_game_products, list_games, list_games_with_products, search_games, search_suggestions,
    update_game,
};
use crate::handlers::game_configuration::{
    admin_get_game_configuration, admin_list_game_configurations, create_field, create_game_configuration,
    delete_field, delete_game_configuration, list_game_configurations, update_field, update_game_configuration,
};
use crate::middleware::auth::attach_viewer;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(get_category))
        .route("/games", get(list_games_with_products))
        .route("/games/list", get(list_games))
        .route("/games/search", get(search_games))
        .route("/games/search/suggestions", get(search_suggestions))
        .route("/games/{slug}", get(get_game))
        .route("/games/{slug}/configuration-info", get(get_configuration_info))
        .route("/games/{slug}/configuration-fields", get(get_configuration_fields))
        .route("/game-configurations", get(list_game_configurations));

    // Prices depend on who is asking.
    let priced = Router::new()
        .route("/games/{slug}/products", get(get_game_products))
        .layer(middleware::from_fn_with_state(state.clone(), attach_viewer));

    open.merge(priced)
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(admin_list_categories).post(create_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .route("/games", get(admin_list_games).post(create_game))
        .route("/games/{id}", get(admin_get_game).put(update_game).delete(delete_game))
        .route(
            "/game-configurations",
            get(admin_list_game_configurations).post(create_game_configuration),
        )
        .route(
            "/game-configurations/{id}",
            get(admin_get_game_configuration)
                .put(update_game_configuration)
                .delete(delete_game_configuration),
        )
        .route("/game-configurations/{id}/fields", post(create_field))
        .route("/game-configurations/{id}/fields/{field_id}", put(update_field).delete(delete_field))
}
