// src/handlers/category.rs
use std::collections::HashMap;

use axum::{extract::{Path, State}, http::StatusCode, Json};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::dtos::catalog::{CategoriesMeta, CategoryWithGames, GameCard, TotalGamesMeta};
use crate::dtos::category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::media::resolve_display_url;
use crate::models::category::Category;
use crate::models::game::{Game, GAME_COLUMNS};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;

const CATEGORY_COLUMNS: &str = "id, name, slug, display_order, is_active, created_at, updated_at";

fn game_card(g: &Game, storage_base: &str) -> GameCard {
    GameCard {
        id: g.id,
        name: g.name.clone(),
        slug: g.slug.clone(),
        developer: g.developer.clone(),
        image_thumbnail_url: resolve_display_url(g.image_thumbnail_path.as_deref(), storage_base),
        image_banner_url: resolve_display_url(g.image_banner_path.as_deref(), storage_base),
        description: g.description.clone(),
        is_popular: g.is_popular,
        display_order: g.display_order,
    }
}

fn with_games(c: Category, games: Vec<GameCard>) -> CategoryWithGames {
    CategoryWithGames {
        id: c.id,
        name: c.name,
        slug: c.slug,
        display_order: c.display_order,
        is_active: c.is_active,
        total_games: games.len(),
        games,
    }
}

async fn active_games_by_category(
    pool: &PgPool,
    category_ids: &[i64],
    storage_base: &str,
) -> Result<HashMap<i64, Vec<GameCard>>, AppError> {
    let games = sqlx::query_as::<_, Game>(&format!(
        "SELECT {GAME_COLUMNS} FROM games g
         WHERE g.is_active AND g.category_id = ANY($1)
         ORDER BY g.display_order, g.id"
    ))
    .bind(category_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<GameCard>> = HashMap::new();
    for game in &games {
        grouped.entry(game.category_id).or_default().push(game_card(game, storage_base));
    }
    Ok(grouped)
}

// GET /v1/categories
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CategoryWithGames>, CategoriesMeta>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active ORDER BY display_order, id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let mut games = active_games_by_category(&state.db_pool, &ids, &state.config.storage_url).await?;

    let data: Vec<CategoryWithGames> = categories
        .into_iter()
        .map(|c| {
            let cards = games.remove(&c.id).unwrap_or_default();
            with_games(c, cards)
        })
        .collect();

    let meta = CategoriesMeta {
        total_categories: data.len(),
        total_games: data.iter().map(|c| c.total_games).sum(),
    };
    Ok(ApiResponse::with_meta(data, meta))
}

// GET /v1/categories/{slug}
#[instrument(skip(state))]
pub async fn get_category(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiResponse<CategoryWithGames, TotalGamesMeta>, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active AND slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    let mut games = active_games_by_category(&state.db_pool, &[category.id], &state.config.storage_url).await?;
    let cards = games.remove(&category.id).unwrap_or_default();
    let data = with_games(category, cards);
    let meta = TotalGamesMeta { total_games: data.total_games };
    Ok(ApiResponse::with_meta(data, meta))
}

// GET /admin/categories
#[instrument(skip(state))]
pub async fn admin_list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CategoryResponse>>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY display_order, id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(ApiResponse::ok(categories.into_iter().map(CategoryResponse::from).collect()))
}

// POST /admin/categories
#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, ApiResponse<CategoryResponse>), AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (name, slug, display_order, is_active)
         VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, TRUE))
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(&payload.slug)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Category slug already exists"))?;

    info!(id = category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, ApiResponse::ok(category.into())))
}

// PUT /admin/categories/{id}
#[instrument(skip(state, payload))]
pub async fn update_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<ApiResponse<CategoryResponse>, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET
            name = COALESCE($1, name),
            slug = COALESCE($2, slug),
            display_order = COALESCE($3, display_order),
            is_active = COALESCE($4, is_active),
            updated_at = now()
         WHERE id = $5
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.slug)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Category slug already exists"))?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(ApiResponse::ok(category.into()))
}

// DELETE /admin/categories/{id}
#[instrument(skip(state))]
pub async fn delete_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Category not found"));
    }
    info!(id, "Category deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}
