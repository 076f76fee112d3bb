// src/handlers/digiflazz.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::digiflazz::{available_brands, normalize_brand, select_for_sync, types_for_brand, DigiflazzClient, ALL_TYPES};
use crate::dtos::catalog::GameBrief;
use crate::dtos::digiflazz::{BrandResponse, ProductTypesResponse, SyncProductsRequest, SyncSummary};
use crate::error::AppError;
use crate::models::game::{Game, GAME_COLUMNS};
use crate::models::product::DIGIFLAZZ_PROVIDER;
use crate::pricing::round_currency;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::Validator;

/// Inserts or refreshes one provider SKU. An existing SKU moves to the syncing
/// game and its default category. Returns true when the row was created.
const UPSERT_SYNCED_PRODUCT: &str = "INSERT INTO products (name, description, base_price, provider, provider_sku,
        product_category_id, game_id, is_active)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
     ON CONFLICT (provider, provider_sku) DO UPDATE SET
        name = EXCLUDED.name,
        description = EXCLUDED.description,
        base_price = EXCLUDED.base_price,
        product_category_id = EXCLUDED.product_category_id,
        game_id = EXCLUDED.game_id,
        is_active = EXCLUDED.is_active,
        updated_at = now()
     RETURNING (xmax = 0)";

fn client(state: &AppState) -> Result<&DigiflazzClient, AppError> {
    state
        .digiflazz
        .as_ref()
        .ok_or_else(|| AppError::validation("Digiflazz credentials are not configured"))
}

async fn find_game(pool: &PgPool, id: i64) -> Result<Game, AppError> {
    sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Game not found"))
}

fn game_brand(game: &Game) -> Result<String, AppError> {
    game.brand
        .as_deref()
        .map(normalize_brand)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::validation("Game has no Digiflazz brand set"))
}

// GET /admin/digiflazz/brands
// Only brands that at least one active game is mapped to.
#[instrument(skip(state))]
pub async fn list_brands(State(state): State<AppState>) -> Result<ApiResponse<Vec<BrandResponse>>, AppError> {
    let items = client(&state)?.price_list().await?;

    let games = sqlx::query_as::<_, Game>(&format!(
        "SELECT {GAME_COLUMNS} FROM games g
         WHERE g.is_active AND g.brand IS NOT NULL
         ORDER BY g.display_order, g.name"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let mut by_brand: HashMap<String, Vec<GameBrief>> = HashMap::new();
    for game in &games {
        if let Some(brand) = game.brand.as_deref() {
            by_brand.entry(normalize_brand(brand)).or_default().push(GameBrief::from(game));
        }
    }

    let data = available_brands(&items)
        .into_iter()
        .filter_map(|brand| by_brand.remove(&brand).map(|games| BrandResponse { brand, games }))
        .collect();
    Ok(ApiResponse::ok(data))
}

// GET /admin/digiflazz/games/{id}/types
#[instrument(skip(state))]
pub async fn list_product_types(
    Path(game_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<ProductTypesResponse>, AppError> {
    let digiflazz = client(&state)?;
    let game = find_game(&state.db_pool, game_id).await?;
    let brand = game_brand(&game)?;

    let items = digiflazz.price_list().await?;
    let types = types_for_brand(&items, &brand);

    Ok(ApiResponse::ok(ProductTypesResponse { game: GameBrief::from(&game), brand, types }))
}

// POST /admin/digiflazz/sync
#[instrument(skip(state, payload), fields(game_id = payload.game_id, product_type = %payload.product_type))]
pub async fn sync_products(
    State(state): State<AppState>,
    Json(payload): Json<SyncProductsRequest>,
) -> Result<ApiResponse<SyncSummary>, AppError> {
    let mut v = Validator::new();
    v.required_text("product_type", &payload.product_type, 255);
    v.finish()?;

    let digiflazz = client(&state)?;
    let game = find_game(&state.db_pool, payload.game_id).await?;
    let brand = game_brand(&game)?;

    let product_category_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM product_categories WHERE game_id = $1 ORDER BY display_order, id LIMIT 1",
    )
    .bind(game.id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::validation("Game has no product category to place synced products in"))?;

    let items = digiflazz.price_list().await?;
    let product_type = payload.product_type.trim();
    let wanted = select_for_sync(&items, &brand, product_type);

    let mut summary = SyncSummary {
        brand,
        product_type: product_type.to_string(),
        product_category_id,
        total: wanted.len(),
        ..SyncSummary::default()
    };

    let mut tx = state.db_pool.begin().await?;
    for item in wanted {
        let inserted = sqlx::query_scalar::<_, bool>(UPSERT_SYNCED_PRODUCT)
        .bind(item.product_name.trim())
        .bind(item.desc.as_deref().map(str::trim).filter(|d| !d.is_empty()))
        .bind(round_currency(item.price))
        .bind(DIGIFLAZZ_PROVIDER)
        .bind(&item.buyer_sku_code)
        .bind(product_category_id)
        .bind(game.id)
        .bind(item.seller_product_status)
        .fetch_one(&mut *tx)
        .await?;

        if inserted {
            summary.created += 1;
        } else {
            summary.updated += 1;
        }
    }
    tx.commit().await?;

    info!(
        game_id = game.id,
        created = summary.created,
        updated = summary.updated,
        all_types = product_type == ALL_TYPES,
        "Digiflazz products synced"
    );
    Ok(ApiResponse::ok(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game(brand: Option<&str>) -> Game {
        Game {
            id: 1,
            name: "Mobile Legends".into(),
            slug: "mobile-legends".into(),
            developer: Some("Moonton".into()),
            brand: brand.map(str::to_string),
            allowed_region: None,
            image_thumbnail_path: None,
            image_banner_path: None,
            description: String::new(),
            long_description: String::new(),
            faq: None,
            is_popular: true,
            is_active: true,
            display_order: 0,
            category_id: 1,
            game_configuration_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn game_brand_is_normalized() {
        assert_eq!(game_brand(&game(Some(" mobile legends "))).unwrap(), "MOBILE LEGENDS");
    }

    #[test]
    fn resync_moves_sku_to_syncing_game() {
        let conflict = UPSERT_SYNCED_PRODUCT
            .split_once("DO UPDATE SET")
            .map(|(_, set)| set)
            .unwrap_or_default();
        assert!(conflict.contains("game_id = EXCLUDED.game_id"));
        assert!(conflict.contains("product_category_id = EXCLUDED.product_category_id"));
        assert!(UPSERT_SYNCED_PRODUCT.ends_with("RETURNING (xmax = 0)"));
    }

    #[test]
    fn blank_brand_cannot_sync() {
        assert!(matches!(game_brand(&game(None)), Err(AppError::ValidationError { .. })));
        assert!(matches!(game_brand(&game(Some("   "))), Err(AppError::ValidationError { .. })));
    }
}
