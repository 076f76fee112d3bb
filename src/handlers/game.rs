// src/handlers/game.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};

use crate::dtos::catalog::{
    CatalogProduct, CatalogProductCategory, CategoryBrief, ConfigurationBrief, ConfigurationFieldResponse,
    ConfigurationFieldsResponse, ConfigurationInfoResponse, ConfigurationSummary, GameBrief, GameDetail,
    GameHeader, GameListItem, GameProductsResponse, PageMeta, PricedProduct, PricedProductCategory,
    Suggestion, SuggestionMeta,
};
use crate::dtos::game::{CreateGameRequest, GameResponse, UpdateGameRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::viewer::{load_offers, resolve_viewer};
use crate::media::resolve_display_url;
use crate::middleware::auth::Viewer;
use crate::models::category::Category;
use crate::models::game::{Game, GAME_COLUMNS};
use crate::models::game_configuration::{GameConfiguration, GameConfigurationField};
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::models::product_category::ProductCategory;
use crate::pricing::resolve_price;
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use crate::validation::QueryParams;

pub const PRODUCT_CATEGORY_COLUMNS: &str =
    "pc.id, pc.game_id, pc.name, pc.slug, pc.icon_path, pc.display_order, pc.is_active, pc.created_at, pc.updated_at";
pub const CONFIGURATION_COLUMNS: &str =
    "id, name, guide_text, guide_image_path, validation_provider, is_active, created_at, updated_at";
pub const FIELD_COLUMNS: &str = "id, game_configuration_id, input_name, label, placeholder, options, type,
    validation_rules, is_required, display_order";

const SORT_COLUMNS: [&str; 4] = ["name", "developer", "display_order", "created_at"];
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;
const MAX_GAME_SUGGESTIONS: i64 = 5;
const MAX_DEVELOPER_SUGGESTIONS: i64 = 3;
const MAX_CATEGORY_SUGGESTIONS: i64 = 3;
const MAX_SUGGESTIONS: usize = 10;

/// `%term%` for ILIKE with the pattern metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Validated filters shared by `/games/list` and `/games/search`.
#[derive(Debug)]
struct GameFilter {
    q: Option<String>,
    category: Option<String>,
    developer: Option<String>,
    is_popular: Option<bool>,
    with_products: bool,
    limit: i64,
    page: i64,
    sort: String,
    order: String,
}

impl GameFilter {
    /// `q` and `developer` are only read when searching.
    fn from_params(params: &HashMap<String, String>, searching: bool) -> Result<Self, AppError> {
        let mut q = QueryParams::new(params);
        let filter = GameFilter {
            q: if searching { q.text("q", 255) } else { None },
            category: q.text("category", 255),
            developer: if searching { q.text("developer", 255) } else { None },
            is_popular: q.boolean("is_popular"),
            with_products: q.boolean("with_products").unwrap_or(false),
            limit: q.int_in("limit", 1, MAX_PAGE_SIZE).unwrap_or(DEFAULT_PAGE_SIZE),
            page: q.int_in("page", 1, i64::from(i32::MAX)).unwrap_or(1),
            sort: q.one_of("sort", &SORT_COLUMNS).unwrap_or_else(|| "display_order".to_string()),
            order: q.one_of("order", &["asc", "desc"]).unwrap_or_else(|| "asc".to_string()),
        };
        q.finish()?;
        Ok(filter)
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" FROM games g WHERE g.is_active");
        if let Some(slug) = &self.category {
            qb.push(" AND EXISTS (SELECT 1 FROM categories c WHERE c.id = g.category_id AND c.is_active AND c.slug = ")
                .push_bind(slug.clone())
                .push(")");
        }
        if let Some(term) = &self.q {
            let pattern = like_pattern(term);
            qb.push(" AND (g.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR g.description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR g.developer ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(developer) = &self.developer {
            qb.push(" AND g.developer ILIKE ").push_bind(like_pattern(developer));
        }
        if let Some(popular) = self.is_popular {
            qb.push(" AND g.is_popular = ").push_bind(popular);
        }
    }

    fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub(crate) async fn find_active_game(pool: &PgPool, slug: &str) -> Result<Game, AppError> {
    sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.is_active AND g.slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Game not found"))
}

async fn category_briefs(pool: &PgPool, ids: &[i64]) -> Result<HashMap<i64, CategoryBrief>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, display_order, is_active, created_at, updated_at
         FROM categories WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(categories.iter().map(|c| (c.id, CategoryBrief::from(c))).collect())
}

async fn active_product_categories(pool: &PgPool, game_ids: &[i64]) -> Result<Vec<ProductCategory>, AppError> {
    let rows = sqlx::query_as::<_, ProductCategory>(&format!(
        "SELECT {PRODUCT_CATEGORY_COLUMNS} FROM product_categories pc
         WHERE pc.is_active AND pc.game_id = ANY($1)
         ORDER BY pc.display_order, pc.id"
    ))
    .bind(game_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn active_products_in(pool: &PgPool, category_ids: &[i64]) -> Result<Vec<Product>, AppError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p
         WHERE p.is_active AND p.product_category_id = ANY($1)
         ORDER BY p.display_order, p.id"
    ))
    .bind(category_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Active product categories with their active products, unpriced, keyed by game.
async fn catalog_tree(
    pool: &PgPool,
    game_ids: &[i64],
    storage_base: &str,
) -> Result<HashMap<i64, Vec<CatalogProductCategory>>, AppError> {
    let categories = active_product_categories(pool, game_ids).await?;
    let category_ids: Vec<i64> = categories.iter().map(|c| c.id).collect();

    let mut products: HashMap<i64, Vec<CatalogProduct>> = HashMap::new();
    for p in active_products_in(pool, &category_ids).await? {
        products.entry(p.product_category_id).or_default().push(CatalogProduct {
            icon_url: resolve_display_url(p.icon_path.as_deref(), storage_base),
            id: p.id,
            name: p.name,
            description: p.description,
            base_price: p.base_price,
            provider: p.provider,
            provider_sku: p.provider_sku,
            display_order: p.display_order,
        });
    }

    let mut tree: HashMap<i64, Vec<CatalogProductCategory>> = HashMap::new();
    for c in categories {
        tree.entry(c.game_id).or_default().push(CatalogProductCategory {
            icon_url: resolve_display_url(c.icon_path.as_deref(), storage_base),
            products: products.remove(&c.id).unwrap_or_default(),
            id: c.id,
            name: c.name,
            slug: c.slug,
            display_order: c.display_order,
        });
    }
    Ok(tree)
}

fn list_item(g: Game, category: Option<CategoryBrief>, storage_base: &str) -> GameListItem {
    GameListItem {
        image_thumbnail_url: resolve_display_url(g.image_thumbnail_path.as_deref(), storage_base),
        image_banner_url: resolve_display_url(g.image_banner_path.as_deref(), storage_base),
        id: g.id,
        name: g.name,
        slug: g.slug,
        developer: g.developer,
        description: g.description,
        is_popular: g.is_popular,
        display_order: g.display_order,
        category,
        created_at: g.created_at,
        updated_at: g.updated_at,
        product_categories: None,
        product_categories_count: None,
    }
}

/// Decorates a page of games with either their product tree or a product-category count.
async fn build_list_items(
    pool: &PgPool,
    games: Vec<Game>,
    with_products: bool,
    storage_base: &str,
) -> Result<Vec<GameListItem>, AppError> {
    let game_ids: Vec<i64> = games.iter().map(|g| g.id).collect();
    let category_ids: Vec<i64> = games.iter().map(|g| g.category_id).collect();
    let categories = category_briefs(pool, &category_ids).await?;

    let mut items: Vec<GameListItem> = games
        .into_iter()
        .map(|g| {
            let category = categories.get(&g.category_id).cloned();
            list_item(g, category, storage_base)
        })
        .collect();

    if with_products {
        let mut tree = catalog_tree(pool, &game_ids, storage_base).await?;
        for item in &mut items {
            item.product_categories = Some(tree.remove(&item.id).unwrap_or_default());
        }
    } else {
        let counts: HashMap<i64, i64> = sqlx::query_as::<_, (i64, i64)>(
            "SELECT game_id, COUNT(*) FROM product_categories
             WHERE is_active AND game_id = ANY($1) GROUP BY game_id",
        )
        .bind(&game_ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();
        for item in &mut items {
            item.product_categories_count = Some(counts.get(&item.id).copied().unwrap_or(0));
        }
    }
    Ok(items)
}

async fn paginate_games(
    state: &AppState,
    params: &HashMap<String, String>,
    searching: bool,
) -> Result<ApiResponse<Vec<GameListItem>, PageMeta>, AppError> {
    let filter = GameFilter::from_params(params, searching)?;
    debug!(?filter, "Listing games");

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    filter.push_from_where(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(&state.db_pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {GAME_COLUMNS}"));
    filter.push_from_where(&mut select);
    // sort and order are checked against fixed lists above
    select
        .push(format!(" ORDER BY g.{} {}, g.id", filter.sort, filter.order))
        .push(" LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset());
    let games = select.build_query_as::<Game>().fetch_all(&state.db_pool).await?;

    let items = build_list_items(&state.db_pool, games, filter.with_products, &state.config.storage_url).await?;
    let meta = PageMeta::new(filter.page, filter.limit, total, items.len(), Some(filter.with_products));
    Ok(ApiResponse::with_meta(items, meta))
}

// GET /v1/games
#[instrument(skip(state))]
pub async fn list_games_with_products(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<GameListItem>>, AppError> {
    let games = sqlx::query_as::<_, Game>(&format!(
        "SELECT {GAME_COLUMNS} FROM games g WHERE g.is_active ORDER BY g.display_order, g.id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let items = build_list_items(&state.db_pool, games, true, &state.config.storage_url).await?;
    Ok(ApiResponse::ok(items))
}

// GET /v1/games/list
#[instrument(skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<GameListItem>, PageMeta>, AppError> {
    paginate_games(&state, &params, false).await
}

// GET /v1/games/search
#[instrument(skip(state))]
pub async fn search_games(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<GameListItem>, PageMeta>, AppError> {
    paginate_games(&state, &params, true).await
}

// GET /v1/games/search/suggestions
#[instrument(skip(state))]
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<Suggestion>, SuggestionMeta>, AppError> {
    let mut q = QueryParams::new(&params);
    let term = q.required_text("q", 2, 255);
    q.finish()?;
    let term = term.ok_or_else(|| AppError::validation("The q field is required."))?;
    let pattern = like_pattern(&term);

    let games = sqlx::query_as::<_, (i64, String, String, Option<String>)>(
        "SELECT id, name, slug, developer FROM games
         WHERE is_active AND name ILIKE $1
         ORDER BY display_order, id LIMIT $2",
    )
    .bind(&pattern)
    .bind(MAX_GAME_SUGGESTIONS)
    .fetch_all(&state.db_pool)
    .await?;

    let developers = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT developer FROM games
         WHERE is_active AND developer ILIKE $1
         ORDER BY developer LIMIT $2",
    )
    .bind(&pattern)
    .bind(MAX_DEVELOPER_SUGGESTIONS)
    .fetch_all(&state.db_pool)
    .await?;

    let categories = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, slug FROM categories
         WHERE is_active AND name ILIKE $1
         ORDER BY display_order, id LIMIT $2",
    )
    .bind(&pattern)
    .bind(MAX_CATEGORY_SUGGESTIONS)
    .fetch_all(&state.db_pool)
    .await?;

    let suggestions: Vec<Suggestion> = games
        .into_iter()
        .map(|(id, name, slug, developer)| Suggestion::Game { id, name, slug, developer })
        .chain(developers.into_iter().map(|name| Suggestion::Developer { name }))
        .chain(categories.into_iter().map(|(id, name, slug)| Suggestion::Category { id, name, slug }))
        .take(MAX_SUGGESTIONS)
        .collect();

    let meta = SuggestionMeta { search_term: term, total_suggestions: suggestions.len() };
    Ok(ApiResponse::with_meta(suggestions, meta))
}

async fn find_configuration(pool: &PgPool, id: Option<i64>) -> Result<Option<GameConfiguration>, AppError> {
    let Some(id) = id else {
        return Ok(None);
    };
    let config = sqlx::query_as::<_, GameConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM game_configurations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

// GET /v1/games/{slug}
#[instrument(skip(state))]
pub async fn get_game(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiResponse<GameDetail>, AppError> {
    let g = find_active_game(&state.db_pool, &slug).await?;
    let category = category_briefs(&state.db_pool, &[g.category_id]).await?.remove(&g.category_id);
    let configuration = find_configuration(&state.db_pool, g.game_configuration_id)
        .await?
        .map(|c| ConfigurationBrief { id: c.id, name: c.name, guide_text: c.guide_text });
    let storage = &state.config.storage_url;

    Ok(ApiResponse::ok(GameDetail {
        image_thumbnail_url: resolve_display_url(g.image_thumbnail_path.as_deref(), storage),
        image_banner_url: resolve_display_url(g.image_banner_path.as_deref(), storage),
        id: g.id,
        name: g.name,
        slug: g.slug,
        developer: g.developer,
        brand: g.brand,
        allowed_region: g.allowed_region,
        description: g.description,
        long_description: g.long_description,
        faq: g.faq,
        is_popular: g.is_popular,
        display_order: g.display_order,
        category,
        game_configuration: configuration,
        created_at: g.created_at,
        updated_at: g.updated_at,
    }))
}

// GET /v1/games/{slug}/products
#[instrument(skip(state, viewer))]
pub async fn get_game_products(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<GameProductsResponse>, AppError> {
    let game = find_active_game(&state.db_pool, &slug).await?;
    let categories = active_product_categories(&state.db_pool, &[game.id]).await?;
    let category_ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let products = active_products_in(&state.db_pool, &category_ids).await?;

    let now = Utc::now();
    let pricing = resolve_viewer(&state.db_pool, &state.config, &viewer).await?;
    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let offers = load_offers(&state.db_pool, &product_ids, now).await?;
    let role_info = pricing.role_info();
    let storage = &state.config.storage_url;

    let mut priced: HashMap<i64, Vec<PricedProduct>> = HashMap::new();
    for p in &products {
        let quote = resolve_price(
            p.base_price,
            pricing.profit_percentage,
            offers.get(&p.id).map(Vec::as_slice).unwrap_or_default(),
            now,
        );
        let icon_url = resolve_display_url(p.icon_path.as_deref(), storage);
        priced
            .entry(p.product_category_id)
            .or_default()
            .push(PricedProduct::new(p, quote, role_info.clone(), icon_url));
    }

    let product_categories: Vec<PricedProductCategory> = categories
        .iter()
        .map(|c| {
            let icon_url = resolve_display_url(c.icon_path.as_deref(), storage);
            PricedProductCategory::new(c, icon_url, priced.remove(&c.id).unwrap_or_default())
        })
        .collect();

    Ok(ApiResponse::ok(GameProductsResponse {
        game: GameHeader { id: game.id, name: game.name, slug: game.slug, developer: game.developer },
        total_products: product_categories.iter().map(|c| c.products.len()).sum(),
        product_categories,
        pricing_info: pricing.pricing_info(),
    }))
}

fn summary(c: GameConfiguration, storage_base: &str) -> ConfigurationSummary {
    ConfigurationSummary {
        guide_image_url: resolve_display_url(c.guide_image_path.as_deref(), storage_base),
        id: c.id,
        name: c.name,
        guide_text: c.guide_text,
    }
}

// GET /v1/games/{slug}/configuration-info
#[instrument(skip(state))]
pub async fn get_configuration_info(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiResponse<ConfigurationInfoResponse>, AppError> {
    let game = find_active_game(&state.db_pool, &slug).await?;
    let configuration = find_configuration(&state.db_pool, game.game_configuration_id)
        .await?
        .map(|c| summary(c, &state.config.storage_url));

    Ok(ApiResponse::ok(ConfigurationInfoResponse {
        game: GameBrief::from(&game),
        has_configuration: configuration.is_some(),
        configuration,
    }))
}

// GET /v1/games/{slug}/configuration-fields
#[instrument(skip(state))]
pub async fn get_configuration_fields(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiResponse<ConfigurationFieldsResponse>, AppError> {
    let game = find_active_game(&state.db_pool, &slug).await?;
    let configuration = find_configuration(&state.db_pool, game.game_configuration_id).await?;

    let fields: Vec<ConfigurationFieldResponse> = match &configuration {
        Some(c) => sqlx::query_as::<_, GameConfigurationField>(&format!(
            "SELECT {FIELD_COLUMNS} FROM game_configuration_fields
             WHERE game_configuration_id = $1 ORDER BY display_order, id"
        ))
        .bind(c.id)
        .fetch_all(&state.db_pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect(),
        None => Vec::new(),
    };

    Ok(ApiResponse::ok(ConfigurationFieldsResponse {
        game: GameBrief::from(&game),
        configuration: configuration.map(|c| summary(c, &state.config.storage_url)),
        total_fields: fields.len(),
        fields,
    }))
}

// GET /admin/games
#[instrument(skip(state))]
pub async fn admin_list_games(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<GameResponse>>, AppError> {
    let mut q = QueryParams::new(&params);
    let category_id: Option<i64> = q.parse("category_id", "must be an integer");
    let search = q.text("q", 255);
    q.finish()?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {GAME_COLUMNS} FROM games g WHERE TRUE"));
    if let Some(id) = category_id {
        select.push(" AND g.category_id = ").push_bind(id);
    }
    if let Some(term) = search {
        select.push(" AND g.name ILIKE ").push_bind(like_pattern(&term));
    }
    select.push(" ORDER BY g.display_order, g.id");
    let games = select.build_query_as::<Game>().fetch_all(&state.db_pool).await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(games.into_iter().map(|g| GameResponse::new(g, storage)).collect()))
}

// GET /admin/games/{id}
#[instrument(skip(state))]
pub async fn admin_get_game(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<GameResponse>, AppError> {
    let game = sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Game not found"))?;

    Ok(ApiResponse::ok(GameResponse::new(game, &state.config.storage_url)))
}

// POST /admin/games
#[instrument(skip(state, payload))]
pub async fn create_game(
    State(state): State<AppState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, ApiResponse<GameResponse>), AppError> {
    payload.validate()?;

    let game = sqlx::query_as::<_, Game>(&format!(
        "INSERT INTO games AS g (name, slug, developer, brand, allowed_region, image_thumbnail_path,
            image_banner_path, description, long_description, faq, is_popular, is_active,
            display_order, category_id, game_configuration_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, FALSE), COALESCE($12, TRUE),
            COALESCE($13, 0), $14, $15)
         RETURNING {GAME_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(&payload.slug)
    .bind(payload.developer)
    .bind(payload.brand)
    .bind(payload.allowed_region)
    .bind(payload.image_thumbnail_path)
    .bind(payload.image_banner_path)
    .bind(payload.description)
    .bind(payload.long_description)
    .bind(payload.faq)
    .bind(payload.is_popular)
    .bind(payload.is_active)
    .bind(payload.display_order)
    .bind(payload.category_id)
    .bind(payload.game_configuration_id)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Game slug already exists"))?;

    info!(id = game.id, slug = %game.slug, "Game created");
    Ok((StatusCode::CREATED, ApiResponse::ok(GameResponse::new(game, &state.config.storage_url))))
}

// PUT /admin/games/{id}
#[instrument(skip(state, payload))]
pub async fn update_game(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<ApiResponse<GameResponse>, AppError> {
    payload.validate()?;

    let game = sqlx::query_as::<_, Game>(&format!(
        "UPDATE games AS g SET
            name = COALESCE($1, g.name),
            slug = COALESCE($2, g.slug),
            developer = COALESCE($3, g.developer),
            brand = COALESCE($4, g.brand),
            allowed_region = COALESCE($5, g.allowed_region),
            image_thumbnail_path = COALESCE($6, g.image_thumbnail_path),
            image_banner_path = COALESCE($7, g.image_banner_path),
            description = COALESCE($8, g.description),
            long_description = COALESCE($9, g.long_description),
            faq = COALESCE($10, g.faq),
            is_popular = COALESCE($11, g.is_popular),
            is_active = COALESCE($12, g.is_active),
            display_order = COALESCE($13, g.display_order),
            category_id = COALESCE($14, g.category_id),
            game_configuration_id = COALESCE($15, g.game_configuration_id),
            updated_at = now()
         WHERE g.id = $16
         RETURNING {GAME_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.slug)
    .bind(payload.developer)
    .bind(payload.brand)
    .bind(payload.allowed_region)
    .bind(payload.image_thumbnail_path)
    .bind(payload.image_banner_path)
    .bind(payload.description)
    .bind(payload.long_description)
    .bind(payload.faq)
    .bind(payload.is_popular)
    .bind(payload.is_active)
    .bind(payload.display_order)
    .bind(payload.category_id)
    .bind(payload.game_configuration_id)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Game slug already exists"))?
    .ok_or_else(|| AppError::not_found("Game not found"))?;

    Ok(ApiResponse::ok(GameResponse::new(game, &state.config.storage_url)))
}

// DELETE /admin/games/{id}
#[instrument(skip(state))]
pub async fn delete_game(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Game not found"));
    }
    info!(id, "Game deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mobile"), "%mobile%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn filter_defaults() {
        let f = GameFilter::from_params(&HashMap::new(), false).unwrap();
        assert_eq!(f.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(f.page, 1);
        assert_eq!(f.sort, "display_order");
        assert_eq!(f.order, "asc");
        assert!(!f.with_products);
        assert_eq!(f.offset(), 0);
    }

    #[test]
    fn list_ignores_search_only_params() {
        let raw = params(&[("q", "legends"), ("developer", "Moonton"), ("page", "3"), ("limit", "10")]);
        let list = GameFilter::from_params(&raw, false).unwrap();
        assert!(list.q.is_none());
        assert!(list.developer.is_none());
        assert_eq!(list.offset(), 20);

        let search = GameFilter::from_params(&raw, true).unwrap();
        assert_eq!(search.q.as_deref(), Some("legends"));
        assert_eq!(search.developer.as_deref(), Some("Moonton"));
    }

    #[test]
    fn filter_rejects_out_of_range_limit_and_unknown_sort() {
        let raw = params(&[("limit", "51"), ("sort", "price"), ("order", "sideways")]);
        match GameFilter::from_params(&raw, true) {
            Err(AppError::ValidationError { errors, .. }) => {
                assert!(errors.contains_key("limit"));
                assert!(errors.contains_key("sort"));
                assert!(errors.contains_key("order"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn filter_sql_binds_every_condition() {
        let raw = params(&[("q", "ml"), ("category", "moba"), ("developer", "Moonton"), ("is_popular", "1")]);
        let f = GameFilter::from_params(&raw, true).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        f.push_from_where(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("c.slug = $1"));
        assert!(sql.contains("g.developer ILIKE $5"));
        assert!(sql.contains("g.is_popular = $6"));
    }
}
