// src/handlers/product_category.rs
use std::collections::HashMap;

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::product_category::{
    CreateProductCategoryRequest, ProductCategoryResponse, UpdateProductCategoryRequest,
};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::game::PRODUCT_CATEGORY_COLUMNS;
use crate::models::product_category::ProductCategory;
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use crate::validation::QueryParams;

// GET /v1/product-categories
#[instrument(skip(state))]
pub async fn list_product_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ProductCategoryResponse>>, AppError> {
    let rows = sqlx::query_as::<_, ProductCategory>(&format!(
        "SELECT {PRODUCT_CATEGORY_COLUMNS} FROM product_categories pc
         WHERE pc.is_active ORDER BY pc.display_order, pc.id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(rows.into_iter().map(|pc| ProductCategoryResponse::new(pc, storage)).collect()))
}

// GET /admin/product-categories
#[instrument(skip(state))]
pub async fn admin_list_product_categories(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<ProductCategoryResponse>>, AppError> {
    let mut q = QueryParams::new(&params);
    let game_id: Option<i64> = q.parse("game_id", "must be an integer");
    q.finish()?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PRODUCT_CATEGORY_COLUMNS} FROM product_categories pc WHERE TRUE"
    ));
    if let Some(id) = game_id {
        select.push(" AND pc.game_id = ").push_bind(id);
    }
    select.push(" ORDER BY pc.game_id, pc.display_order, pc.id");
    let rows = select.build_query_as::<ProductCategory>().fetch_all(&state.db_pool).await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(rows.into_iter().map(|pc| ProductCategoryResponse::new(pc, storage)).collect()))
}

// POST /admin/product-categories
#[instrument(skip(state, payload))]
pub async fn create_product_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductCategoryRequest>,
) -> Result<(StatusCode, ApiResponse<ProductCategoryResponse>), AppError> {
    payload.validate()?;

    let pc = sqlx::query_as::<_, ProductCategory>(&format!(
        "INSERT INTO product_categories AS pc (game_id, name, slug, icon_path, display_order, is_active)
         VALUES ($1, $2, $3, $4, COALESCE($5, 0), COALESCE($6, TRUE))
         RETURNING {PRODUCT_CATEGORY_COLUMNS}"
    ))
    .bind(payload.game_id)
    .bind(payload.name.trim())
    .bind(&payload.slug)
    .bind(payload.icon_path)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Product category already exists"))?;

    info!(id = pc.id, game_id = pc.game_id, "Product category created");
    Ok((StatusCode::CREATED, ApiResponse::ok(ProductCategoryResponse::new(pc, &state.config.storage_url))))
}

// PUT /admin/product-categories/{id}
#[instrument(skip(state, payload))]
pub async fn update_product_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductCategoryRequest>,
) -> Result<ApiResponse<ProductCategoryResponse>, AppError> {
    payload.validate()?;

    let pc = sqlx::query_as::<_, ProductCategory>(&format!(
        "UPDATE product_categories AS pc SET
            game_id = COALESCE($1, pc.game_id),
            name = COALESCE($2, pc.name),
            slug = COALESCE($3, pc.slug),
            icon_path = COALESCE($4, pc.icon_path),
            display_order = COALESCE($5, pc.display_order),
            is_active = COALESCE($6, pc.is_active),
            updated_at = now()
         WHERE pc.id = $7
         RETURNING {PRODUCT_CATEGORY_COLUMNS}"
    ))
    .bind(payload.game_id)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.slug)
    .bind(payload.icon_path)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Product category already exists"))?
    .ok_or_else(|| AppError::not_found("Product category not found"))?;

    Ok(ApiResponse::ok(ProductCategoryResponse::new(pc, &state.config.storage_url)))
}

// DELETE /admin/product-categories/{id}
#[instrument(skip(state))]
pub async fn delete_product_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product category not found"));
    }
    info!(id, "Product category deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}
