// src/handlers/flash_sale.rs
use std::collections::HashMap;

use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::dtos::flash_sale::{
    ActiveFlashSale, ActiveFlashSalesMeta, AttachProductRequest, AttachedProductResponse, CreateFlashSaleRequest,
    CurrentTimeMeta, FlashSaleProduct, FlashSaleResponse, UpcomingFlashSale, UpcomingFlashSalesMeta,
    UpdateFlashSaleRequest,
};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::viewer::{resolve_viewer, ViewerPricing};
use crate::media::resolve_display_url;
use crate::middleware::auth::Viewer;
use crate::models::flash_sale::{FlashSale, FlashSaleItem};
use crate::pricing::{quote_offer, role_price, FlashSaleOffer};
use crate::promotions::seconds_until;
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;

const FLASH_SALE_COLUMNS: &str = "id, name, start_date, end_date, is_active, created_at, updated_at";

async fn items_by_sale(pool: &PgPool, sale_ids: &[i64]) -> Result<HashMap<i64, Vec<FlashSaleItem>>, AppError> {
    if sale_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = sqlx::query_as::<_, FlashSaleItem>(
        "SELECT fsp.flash_sale_id, p.id AS product_id, p.name, p.description, p.icon_path, p.base_price,
                p.provider, p.provider_sku, fsp.discounted_price, fsp.stock,
                g.id AS game_id, g.name AS game_name, g.slug AS game_slug,
                pc.id AS product_category_id, pc.name AS product_category_name, pc.slug AS product_category_slug
         FROM flash_sale_product fsp
         JOIN products p ON p.id = fsp.product_id
         JOIN games g ON g.id = p.game_id
         JOIN product_categories pc ON pc.id = p.product_category_id
         WHERE fsp.flash_sale_id = ANY($1) AND p.is_active
         ORDER BY fsp.flash_sale_id, p.display_order, p.id",
    )
    .bind(sale_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<FlashSaleItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.flash_sale_id).or_default().push(item);
    }
    Ok(grouped)
}

/// Prices every product of `sale` for the viewer. The discount is measured against the
/// viewer's role price, not `base_price`, and keeps two decimals.
fn price_items(sale: &FlashSale, items: Vec<FlashSaleItem>, viewer: &ViewerPricing, storage: &str) -> Vec<FlashSaleProduct> {
    items
        .into_iter()
        .map(|item| {
            let offer = FlashSaleOffer {
                id: sale.id,
                name: sale.name.clone(),
                start_date: sale.start_date,
                end_date: sale.end_date,
                is_active: sale.is_active,
                discounted_price: item.discounted_price,
                stock: item.stock,
            };
            let quote = quote_offer(role_price(item.base_price, viewer.profit_percentage), &offer);
            let icon_url = resolve_display_url(item.icon_path.as_deref(), storage);
            FlashSaleProduct::new(item, quote, icon_url)
        })
        .collect()
}

fn active_sale(sale: FlashSale, products: Vec<FlashSaleProduct>, now: DateTime<Utc>) -> ActiveFlashSale {
    ActiveFlashSale {
        remaining_seconds: seconds_until(sale.end_date, now),
        total_products: products.len(),
        id: sale.id,
        name: sale.name,
        start_date: sale.start_date,
        end_date: sale.end_date,
        is_active: sale.is_active,
        products,
    }
}

async fn find_flash_sale(pool: &PgPool, id: i64) -> Result<FlashSale, AppError> {
    sqlx::query_as::<_, FlashSale>(&format!("SELECT {FLASH_SALE_COLUMNS} FROM flash_sales WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Flash sale not found"))
}

// GET /v1/flash-sales
#[instrument(skip(state, viewer))]
pub async fn list_active_flash_sales(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<Vec<ActiveFlashSale>, ActiveFlashSalesMeta>, AppError> {
    let now = Utc::now();
    let sales = sqlx::query_as::<_, FlashSale>(&format!(
        "SELECT {FLASH_SALE_COLUMNS} FROM flash_sales
         WHERE is_active AND start_date <= $1 AND end_date >= $1
         ORDER BY end_date, id"
    ))
    .bind(now)
    .fetch_all(&state.db_pool)
    .await?;

    let pricing = resolve_viewer(&state.db_pool, &state.config, &viewer).await?;
    let ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let mut items = items_by_sale(&state.db_pool, &ids).await?;
    let storage = &state.config.storage_url;

    let data: Vec<ActiveFlashSale> = sales
        .into_iter()
        .map(|sale| {
            let products = price_items(&sale, items.remove(&sale.id).unwrap_or_default(), &pricing, storage);
            active_sale(sale, products, now)
        })
        .collect();

    let meta = ActiveFlashSalesMeta { current_time: now, total_active_flashsales: data.len() };
    Ok(ApiResponse::with_meta(data, meta))
}

// GET /v1/flash-sales/upcoming
#[instrument(skip(state, viewer))]
pub async fn list_upcoming_flash_sales(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<Vec<UpcomingFlashSale>, UpcomingFlashSalesMeta>, AppError> {
    let now = Utc::now();
    let sales = sqlx::query_as::<_, FlashSale>(&format!(
        "SELECT {FLASH_SALE_COLUMNS} FROM flash_sales
         WHERE is_active AND start_date > $1
         ORDER BY start_date, id"
    ))
    .bind(now)
    .fetch_all(&state.db_pool)
    .await?;

    let pricing = resolve_viewer(&state.db_pool, &state.config, &viewer).await?;
    let ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let mut items = items_by_sale(&state.db_pool, &ids).await?;
    let storage = &state.config.storage_url;

    let data: Vec<UpcomingFlashSale> = sales
        .into_iter()
        .map(|sale| {
            let products = price_items(&sale, items.remove(&sale.id).unwrap_or_default(), &pricing, storage);
            UpcomingFlashSale {
                time_until_start: seconds_until(sale.start_date, now),
                total_products: products.len(),
                id: sale.id,
                name: sale.name,
                start_date: sale.start_date,
                end_date: sale.end_date,
                is_active: sale.is_active,
                products,
            }
        })
        .collect();

    let meta = UpcomingFlashSalesMeta { current_time: now, total_upcoming_flashsales: data.len() };
    Ok(ApiResponse::with_meta(data, meta))
}

// GET /v1/flash-sales/{id}
#[instrument(skip(state, viewer))]
pub async fn get_flash_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<ActiveFlashSale, CurrentTimeMeta>, AppError> {
    let now = Utc::now();
    let sale = sqlx::query_as::<_, FlashSale>(&format!(
        "SELECT {FLASH_SALE_COLUMNS} FROM flash_sales
         WHERE id = $1 AND is_active AND start_date <= $2 AND end_date >= $2"
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Flash sale not found or not active"))?;

    let pricing = resolve_viewer(&state.db_pool, &state.config, &viewer).await?;
    let items = items_by_sale(&state.db_pool, &[id]).await?.remove(&id).unwrap_or_default();
    let products = price_items(&sale, items, &pricing, &state.config.storage_url);

    Ok(ApiResponse::with_meta(active_sale(sale, products, now), CurrentTimeMeta { current_time: now }))
}

// GET /admin/flash-sales
#[instrument(skip(state))]
pub async fn admin_list_flash_sales(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<FlashSaleResponse>>, AppError> {
    let sales = sqlx::query_as::<_, FlashSale>(&format!(
        "SELECT {FLASH_SALE_COLUMNS} FROM flash_sales ORDER BY start_date DESC, id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(ApiResponse::ok(sales.into_iter().map(Into::into).collect()))
}

// POST /admin/flash-sales
#[instrument(skip(state, payload))]
pub async fn create_flash_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlashSaleRequest>,
) -> Result<(StatusCode, ApiResponse<FlashSaleResponse>), AppError> {
    payload.validate()?;

    let sale = sqlx::query_as::<_, FlashSale>(&format!(
        "INSERT INTO flash_sales (name, start_date, end_date, is_active)
         VALUES ($1, $2, $3, COALESCE($4, TRUE))
         RETURNING {FLASH_SALE_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.is_active)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = sale.id, name = %sale.name, "Flash sale created");
    Ok((StatusCode::CREATED, ApiResponse::ok(sale.into())))
}

// PUT /admin/flash-sales/{id}
#[instrument(skip(state, payload))]
pub async fn update_flash_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateFlashSaleRequest>,
) -> Result<ApiResponse<FlashSaleResponse>, AppError> {
    let current = find_flash_sale(&state.db_pool, id).await?;
    payload.validate(&current)?;

    let sale = sqlx::query_as::<_, FlashSale>(&format!(
        "UPDATE flash_sales SET
            name = COALESCE($1, name),
            start_date = COALESCE($2, start_date),
            end_date = COALESCE($3, end_date),
            is_active = COALESCE($4, is_active),
            updated_at = now()
         WHERE id = $5
         RETURNING {FLASH_SALE_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Flash sale not found"))?;

    info!(id, "Flash sale updated");
    Ok(ApiResponse::ok(sale.into()))
}

// DELETE /admin/flash-sales/{id}
#[instrument(skip(state))]
pub async fn delete_flash_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM flash_sales WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Flash sale not found"));
    }
    info!(id, "Flash sale deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

#[derive(sqlx::FromRow)]
struct PivotRow {
    flash_sale_id: i64,
    product_id: i64,
    discounted_price: rust_decimal::Decimal,
    stock: Option<i32>,
}

impl From<PivotRow> for AttachedProductResponse {
    fn from(r: PivotRow) -> Self {
        Self {
            flash_sale_id: r.flash_sale_id,
            product_id: r.product_id,
            discounted_price: r.discounted_price,
            stock: r.stock,
        }
    }
}

// POST /admin/flash-sales/{id}/products
// Attaching an already attached product replaces its price and stock.
#[instrument(skip(state, payload))]
pub async fn attach_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<AttachProductRequest>,
) -> Result<ApiResponse<AttachedProductResponse>, AppError> {
    payload.validate()?;
    find_flash_sale(&state.db_pool, id).await?;

    let row = sqlx::query_as::<_, PivotRow>(
        "INSERT INTO flash_sale_product (flash_sale_id, product_id, discounted_price, stock)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (flash_sale_id, product_id) DO UPDATE SET
            discounted_price = EXCLUDED.discounted_price,
            stock = EXCLUDED.stock,
            updated_at = now()
         RETURNING flash_sale_id, product_id, discounted_price, stock",
    )
    .bind(id)
    .bind(payload.product_id)
    .bind(payload.discounted_price)
    .bind(payload.stock)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Product is already attached"))?;

    info!(flash_sale_id = id, product_id = payload.product_id, "Product attached to flash sale");
    Ok(ApiResponse::ok(row.into()))
}

// DELETE /admin/flash-sales/{id}/products/{product_id}
#[instrument(skip(state))]
pub async fn detach_product(
    Path((id, product_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM flash_sale_product WHERE flash_sale_id = $1 AND product_id = $2")
        .bind(id)
        .bind(product_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product is not attached to this flash sale"));
    }
    info!(flash_sale_id = id, product_id, "Product detached from flash sale");
    Ok(ApiResponse::ok(Deleted::new(product_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn sale(now: DateTime<Utc>) -> FlashSale {
        FlashSale {
            id: 7,
            name: "Payday".into(),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::minutes(30),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(base: i64, discounted: i64) -> FlashSaleItem {
        FlashSaleItem {
            flash_sale_id: 7,
            product_id: 11,
            name: "86 Diamonds".into(),
            description: None,
            icon_path: Some("products/86.png".into()),
            base_price: Decimal::from(base),
            provider: "digiflazz".into(),
            provider_sku: "ML86".into(),
            discounted_price: Decimal::from(discounted),
            stock: Some(5),
            game_id: 1,
            game_name: "Mobile Legends".into(),
            game_slug: "mobile-legends".into(),
            product_category_id: 2,
            product_category_name: "Diamonds".into(),
            product_category_slug: "diamonds".into(),
        }
    }

    fn viewer(pct: i64) -> ViewerPricing {
        ViewerPricing { role: None, profit_percentage: Decimal::from(pct), authenticated: false, is_guest_default: true }
    }

    #[test]
    fn items_are_discounted_against_role_price() {
        let now = Utc::now();
        let products = price_items(&sale(now), vec![item(20000, 19800)], &viewer(10), "http://cdn.test");
        let p = &products[0];
        assert_eq!(p.original_price, Decimal::from(22000));
        assert_eq!(p.discounted_price, Decimal::from(19800));
        assert_eq!(p.discount_percentage, Decimal::from(10));
        assert_eq!(p.icon_url.as_deref(), Some("http://cdn.test/products/86.png"));
    }

    #[test]
    fn discount_keeps_two_decimals_against_role_price() {
        let now = Utc::now();
        let products = price_items(&sale(now), vec![item(30000, 29000)], &viewer(10), "");
        // 4000 off a 33000 role price, not 1000 off the 30000 base
        assert_eq!(products[0].original_price, Decimal::from(33000));
        assert_eq!(products[0].discount_percentage, Decimal::new(1212, 2));
    }

    #[test]
    fn active_sale_counts_down_to_end() {
        let now = Utc::now();
        let s = sale(now);
        let products = price_items(&s, vec![item(10000, 9000)], &viewer(0), "");
        let active = active_sale(s, products, now);
        assert_eq!(active.remaining_seconds, 30 * 60);
        assert_eq!(active.total_products, 1);
    }
}
