// src/handlers/role.rs
use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::{info, instrument};

use crate::dtos::role::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::models::role::Role;
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;

const ROLE_COLUMNS: &str = "id, name, profit_percentage, created_at, updated_at";

// GET /admin/roles
#[instrument(skip(state))]
pub async fn list_roles(State(state): State<AppState>) -> Result<ApiResponse<Vec<RoleResponse>>, AppError> {
    let roles = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id"))
        .fetch_all(&state.db_pool)
        .await?;
    Ok(ApiResponse::ok(roles.into_iter().map(RoleResponse::from).collect()))
}

// POST /admin/roles
#[instrument(skip(state, payload))]
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, ApiResponse<RoleResponse>), AppError> {
    payload.validate()?;

    let role = sqlx::query_as::<_, Role>(&format!(
        "INSERT INTO roles (name, profit_percentage) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.profit_percentage)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Role name already exists"))?;

    info!(id = role.id, name = %role.name, "Role created");
    Ok((StatusCode::CREATED, ApiResponse::ok(role.into())))
}

// PUT /admin/roles/{id}
#[instrument(skip(state, payload))]
pub async fn update_role(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<ApiResponse<RoleResponse>, AppError> {
    payload.validate()?;

    let role = sqlx::query_as::<_, Role>(&format!(
        "UPDATE roles SET
            name = COALESCE($1, name),
            profit_percentage = COALESCE($2, profit_percentage),
            updated_at = now()
         WHERE id = $3
         RETURNING {ROLE_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.profit_percentage)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Role name already exists"))?
    .ok_or_else(|| AppError::not_found("Role not found"))?;

    info!(id, profit_percentage = %role.profit_percentage, "Role updated");
    Ok(ApiResponse::ok(role.into()))
}

// DELETE /admin/roles/{id}
#[instrument(skip(state))]
pub async fn delete_role(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    if role.is_admin() || role.name == state.config.guest_role_name {
        return Err(AppError::conflict(format!("The {} role cannot be deleted", role.name)));
    }

    sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    info!(id, name = %role.name, "Role deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

