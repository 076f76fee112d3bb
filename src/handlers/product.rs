// src/handlers/product.rs
use std::collections::HashMap;

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::product::{CreateProductRequest, ProductResponse, ProviderSummary, UpdateProductRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::game::like_pattern;
use crate::models::product::{Product, MANUAL_PROVIDER, PRODUCT_COLUMNS};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use crate::validation::QueryParams;

const SKU_TAKEN: &str = "Provider SKU already exists for this provider";

// GET /v1/products
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ProductResponse>>, AppError> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.is_active ORDER BY p.display_order, p.id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(products.into_iter().map(|p| ProductResponse::new(p, storage)).collect()))
}

// GET /admin/products
#[instrument(skip(state))]
pub async fn admin_list_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<ProductResponse>>, AppError> {
    let mut q = QueryParams::new(&params);
    let game_id: Option<i64> = q.parse("game_id", "must be an integer");
    let category_id: Option<i64> = q.parse("product_category_id", "must be an integer");
    let provider = q.text("provider", 64);
    let search = q.text("q", 255);
    q.finish()?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE TRUE"));
    if let Some(id) = game_id {
        select.push(" AND p.game_id = ").push_bind(id);
    }
    if let Some(id) = category_id {
        select.push(" AND p.product_category_id = ").push_bind(id);
    }
    if let Some(provider) = provider {
        select.push(" AND p.provider = ").push_bind(provider);
    }
    if let Some(term) = search {
        let pattern = like_pattern(&term);
        select
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.provider_sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    select.push(" ORDER BY p.game_id, p.display_order, p.id");
    let products = select.build_query_as::<Product>().fetch_all(&state.db_pool).await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(products.into_iter().map(|p| ProductResponse::new(p, storage)).collect()))
}

// GET /admin/products/providers
#[instrument(skip(state))]
pub async fn list_providers(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ProviderSummary>>, AppError> {
    let providers = sqlx::query_as::<_, ProviderSummary>(
        "SELECT provider, COUNT(*) AS total_products FROM products GROUP BY provider ORDER BY provider",
    )
    .fetch_all(&state.db_pool)
    .await?;
    Ok(ApiResponse::ok(providers))
}

// GET /admin/products/{id}
#[instrument(skip(state))]
pub async fn admin_get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(ApiResponse::ok(ProductResponse::new(product, &state.config.storage_url)))
}

// POST /admin/products
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, ApiResponse<ProductResponse>), AppError> {
    payload.validate()?;

    // game_id always follows the product category
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products AS p (name, icon_path, description, base_price, provider, provider_sku,
            product_category_id, game_id, display_order, is_active)
         SELECT $1, $2, $3, $4, $5, $6, pc.id, pc.game_id, COALESCE($8, 0), COALESCE($9, TRUE)
         FROM product_categories pc WHERE pc.id = $7
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.icon_path)
    .bind(payload.description)
    .bind(payload.base_price)
    .bind(payload.provider.as_deref().unwrap_or(MANUAL_PROVIDER))
    .bind(payload.provider_sku.trim())
    .bind(payload.product_category_id)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, SKU_TAKEN))?
    .ok_or_else(|| AppError::validation("Product category does not exist"))?;

    info!(id = product.id, sku = %product.provider_sku, "Product created");
    Ok((StatusCode::CREATED, ApiResponse::ok(ProductResponse::new(product, &state.config.storage_url))))
}

// PUT /admin/products/{id}
#[instrument(skip(state, payload))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    payload.validate()?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products AS p SET
            name = COALESCE($1, p.name),
            icon_path = COALESCE($2, p.icon_path),
            description = COALESCE($3, p.description),
            base_price = COALESCE($4, p.base_price),
            provider = COALESCE($5, p.provider),
            provider_sku = COALESCE($6, p.provider_sku),
            product_category_id = COALESCE($7, p.product_category_id),
            game_id = COALESCE((SELECT game_id FROM product_categories WHERE id = $7), p.game_id),
            display_order = COALESCE($8, p.display_order),
            is_active = COALESCE($9, p.is_active),
            updated_at = now()
         WHERE p.id = $10
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.icon_path)
    .bind(payload.description)
    .bind(payload.base_price)
    .bind(payload.provider)
    .bind(payload.provider_sku.as_deref().map(str::trim))
    .bind(payload.product_category_id)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, SKU_TAKEN))?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(ApiResponse::ok(ProductResponse::new(product, &state.config.storage_url)))
}

// DELETE /admin/products/{id}
#[instrument(skip(state))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }
    info!(id, "Product deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}
