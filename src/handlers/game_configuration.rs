// src/handlers/game_configuration.rs
use std::collections::HashMap;

use axum::{extract::{Path, State}, http::StatusCode, Json};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::dtos::catalog::{ConfigurationFieldResponse, ConfigurationWithFields};
use crate::dtos::game_configuration::{
    CreateFieldRequest, CreateGameConfigurationRequest, GameConfigurationResponse, UpdateFieldRequest,
    UpdateGameConfigurationRequest,
};
use crate::error::AppError;
use crate::handlers::game::{CONFIGURATION_COLUMNS, FIELD_COLUMNS};
use crate::media::resolve_display_url;
use crate::models::game_configuration::{GameConfiguration, GameConfigurationField};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;

async fn fields_by_configuration(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, Vec<GameConfigurationField>>, AppError> {
    let fields = sqlx::query_as::<_, GameConfigurationField>(&format!(
        "SELECT {FIELD_COLUMNS} FROM game_configuration_fields
         WHERE game_configuration_id = ANY($1) ORDER BY display_order, id"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<GameConfigurationField>> = HashMap::new();
    for f in fields {
        grouped.entry(f.game_configuration_id).or_default().push(f);
    }
    Ok(grouped)
}

async fn find_configuration(pool: &PgPool, id: i64) -> Result<GameConfiguration, AppError> {
    sqlx::query_as::<_, GameConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM game_configurations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Game configuration not found"))
}

async fn find_field(pool: &PgPool, configuration_id: i64, field_id: i64) -> Result<GameConfigurationField, AppError> {
    sqlx::query_as::<_, GameConfigurationField>(&format!(
        "SELECT {FIELD_COLUMNS} FROM game_configuration_fields WHERE id = $1 AND game_configuration_id = $2"
    ))
    .bind(field_id)
    .bind(configuration_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Configuration field not found"))
}

// GET /v1/game-configurations
#[instrument(skip(state))]
pub async fn list_game_configurations(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ConfigurationWithFields>>, AppError> {
    let configs = sqlx::query_as::<_, GameConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM game_configurations WHERE is_active ORDER BY id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let ids: Vec<i64> = configs.iter().map(|c| c.id).collect();
    let mut fields = fields_by_configuration(&state.db_pool, &ids).await?;
    let storage = &state.config.storage_url;

    let data = configs
        .into_iter()
        .map(|c| ConfigurationWithFields {
            guide_image_url: resolve_display_url(c.guide_image_path.as_deref(), storage),
            fields: fields
                .remove(&c.id)
                .unwrap_or_default()
                .into_iter()
                .map(ConfigurationFieldResponse::from)
                .collect(),
            id: c.id,
            name: c.name,
            guide_text: c.guide_text,
            validation_provider: c.validation_provider,
            is_active: c.is_active,
        })
        .collect();
    Ok(ApiResponse::ok(data))
}

// GET /admin/game-configurations
#[instrument(skip(state))]
pub async fn admin_list_game_configurations(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<GameConfigurationResponse>>, AppError> {
    let configs = sqlx::query_as::<_, GameConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM game_configurations ORDER BY id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let ids: Vec<i64> = configs.iter().map(|c| c.id).collect();
    let mut fields = fields_by_configuration(&state.db_pool, &ids).await?;
    let storage = &state.config.storage_url;

    Ok(ApiResponse::ok(
        configs
            .into_iter()
            .map(|c| {
                let own = fields.remove(&c.id).unwrap_or_default();
                GameConfigurationResponse::new(c, own, storage)
            })
            .collect(),
    ))
}

// GET /admin/game-configurations/{id}
#[instrument(skip(state))]
pub async fn admin_get_game_configuration(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<GameConfigurationResponse>, AppError> {
    let config = find_configuration(&state.db_pool, id).await?;
    let fields = fields_by_configuration(&state.db_pool, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(ApiResponse::ok(GameConfigurationResponse::new(config, fields, &state.config.storage_url)))
}

// POST /admin/game-configurations
#[instrument(skip(state, payload))]
pub async fn create_game_configuration(
    State(state): State<AppState>,
    Json(payload): Json<CreateGameConfigurationRequest>,
) -> Result<(StatusCode, ApiResponse<GameConfigurationResponse>), AppError> {
    payload.validate()?;

    let config = sqlx::query_as::<_, GameConfiguration>(&format!(
        "INSERT INTO game_configurations (name, guide_text, guide_image_path, validation_provider, is_active)
         VALUES ($1, $2, $3, $4, COALESCE($5, TRUE))
         RETURNING {CONFIGURATION_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.guide_text)
    .bind(payload.guide_image_path)
    .bind(payload.validation_provider)
    .bind(payload.is_active)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = config.id, "Game configuration created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(GameConfigurationResponse::new(config, Vec::new(), &state.config.storage_url)),
    ))
}

// PUT /admin/game-configurations/{id}
#[instrument(skip(state, payload))]
pub async fn update_game_configuration(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateGameConfigurationRequest>,
) -> Result<ApiResponse<GameConfigurationResponse>, AppError> {
    payload.validate()?;

    let config = sqlx::query_as::<_, GameConfiguration>(&format!(
        "UPDATE game_configurations SET
            name = COALESCE($1, name),
            guide_text = COALESCE($2, guide_text),
            guide_image_path = COALESCE($3, guide_image_path),
            validation_provider = COALESCE($4, validation_provider),
            is_active = COALESCE($5, is_active),
            updated_at = now()
         WHERE id = $6
         RETURNING {CONFIGURATION_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.guide_text)
    .bind(payload.guide_image_path)
    .bind(payload.validation_provider)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Game configuration not found"))?;

    let fields = fields_by_configuration(&state.db_pool, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(ApiResponse::ok(GameConfigurationResponse::new(config, fields, &state.config.storage_url)))
}

// DELETE /admin/game-configurations/{id}
#[instrument(skip(state))]
pub async fn delete_game_configuration(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM game_configurations WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Game configuration not found"));
    }
    info!(id, "Game configuration deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

// POST /admin/game-configurations/{id}/fields
#[instrument(skip(state, payload))]
pub async fn create_field(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<CreateFieldRequest>,
) -> Result<(StatusCode, ApiResponse<ConfigurationFieldResponse>), AppError> {
    payload.validate()?;
    find_configuration(&state.db_pool, id).await?;

    let field = sqlx::query_as::<_, GameConfigurationField>(&format!(
        "INSERT INTO game_configuration_fields (game_configuration_id, input_name, label, placeholder,
            options, type, validation_rules, is_required, display_order)
         VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE), COALESCE($9, 0))
         RETURNING {FIELD_COLUMNS}"
    ))
    .bind(id)
    .bind(payload.input_name.trim())
    .bind(payload.label.trim())
    .bind(payload.placeholder)
    .bind(payload.options)
    .bind(&payload.field_type)
    .bind(payload.validation_rules)
    .bind(payload.is_required)
    .bind(payload.display_order)
    .fetch_one(&state.db_pool)
    .await?;

    info!(configuration_id = id, field_id = field.id, "Configuration field created");
    Ok((StatusCode::CREATED, ApiResponse::ok(field.into())))
}

// PUT /admin/game-configurations/{id}/fields/{field_id}
#[instrument(skip(state, payload))]
pub async fn update_field(
    Path((id, field_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateFieldRequest>,
) -> Result<ApiResponse<ConfigurationFieldResponse>, AppError> {
    let current = find_field(&state.db_pool, id, field_id).await?;
    payload.validate(&current)?;

    let field = sqlx::query_as::<_, GameConfigurationField>(&format!(
        "UPDATE game_configuration_fields SET
            input_name = COALESCE($1, input_name),
            label = COALESCE($2, label),
            placeholder = COALESCE($3, placeholder),
            options = COALESCE($4, options),
            type = COALESCE($5, type),
            validation_rules = COALESCE($6, validation_rules),
            is_required = COALESCE($7, is_required),
            display_order = COALESCE($8, display_order),
            updated_at = now()
         WHERE id = $9 AND game_configuration_id = $10
         RETURNING {FIELD_COLUMNS}"
    ))
    .bind(payload.input_name.as_deref().map(str::trim))
    .bind(payload.label.as_deref().map(str::trim))
    .bind(payload.placeholder)
    .bind(payload.options)
    .bind(payload.field_type)
    .bind(payload.validation_rules)
    .bind(payload.is_required)
    .bind(payload.display_order)
    .bind(field_id)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Configuration field not found"))?;

    Ok(ApiResponse::ok(field.into()))
}

// DELETE /admin/game-configurations/{id}/fields/{field_id}
#[instrument(skip(state))]
pub async fn delete_field(
    Path((id, field_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM game_configuration_fields WHERE id = $1 AND game_configuration_id = $2")
        .bind(field_id)
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Configuration field not found"));
    }
    Ok(ApiResponse::ok(Deleted::new(field_id)))
}
