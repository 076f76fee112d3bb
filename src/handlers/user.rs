// src/handlers/user.rs
use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};

use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::dtos::catalog::PageMeta;
use crate::dtos::user::{LoginRequest, LoginResponse, RegisterUserRequest, UpdateUserRequest, UserResponse};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::game::like_pattern;
use crate::middleware::auth::AuthContext;
use crate::models::user::UserWithRole;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::{QueryParams, Validator};

const USER_COLUMNS: &str = "u.id, u.name, u.username, u.email, u.phone, u.balance, u.role_id,
    r.name AS role_name, u.is_active, u.created_at";

#[derive(sqlx::FromRow)]
struct Credentials {
    #[sqlx(flatten)]
    user: UserWithRole,
    password_hash: String,
}

#[derive(Debug)]
struct UserFilter {
    search: Option<String>,
    role_id: Option<i64>,
    is_active: Option<bool>,
    per_page: i64,
    page: i64,
}

impl UserFilter {
    fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut q = QueryParams::new(params);
        let filter = Self {
            search: q.text("q", 255),
            role_id: q.parse::<i64>("role_id", "must be an integer"),
            is_active: q.boolean("is_active"),
            per_page: q.int_in("limit", 1, 100).unwrap_or(20),
            page: q.int_in("page", 1, i64::from(i32::MAX)).unwrap_or(1),
        };
        q.finish()?;
        Ok(filter)
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE TRUE");
        if let Some(term) = &self.search {
            let pattern = like_pattern(term);
            qb.push(" AND (u.name ILIKE ").push_bind(pattern.clone());
            qb.push(" OR u.username ILIKE ").push_bind(pattern.clone());
            qb.push(" OR u.email ILIKE ").push_bind(pattern).push(")");
        }
        if let Some(role_id) = self.role_id {
            qb.push(" AND u.role_id = ").push_bind(role_id);
        }
        if let Some(active) = self.is_active {
            qb.push(" AND u.is_active = ").push_bind(active);
        }
    }
}

async fn find_user(pool: &PgPool, id: i64) -> Result<UserWithRole, AppError> {
    sqlx::query_as::<_, UserWithRole>(&format!(
        "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))
}

// POST /v1/auth/register
// New accounts get the guest role.
#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, ApiResponse<UserResponse>), AppError> {
    payload.validate()?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, username, email, phone, password_hash, role_id)
         VALUES ($1, $2, $3, $4, $5, (SELECT id FROM roles WHERE name = $6))
         RETURNING id",
    )
    .bind(payload.name.trim())
    .bind(payload.username.trim())
    .bind(payload.email.as_deref().map(str::trim))
    .bind(payload.phone.as_deref().map(str::trim))
    .bind(password_hash)
    .bind(&state.config.guest_role_name)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Username or email already exists"))?;

    info!(id, username = %payload.username, "User registered");
    let user = find_user(&state.db_pool, id).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(user.into())))
}

// POST /v1/auth/login
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let mut v = Validator::new();
    v.required_text("username", &payload.username, 64);
    v.check(!payload.password.is_empty(), "password", "is required");
    v.finish()?;

    let creds = sqlx::query_as::<_, Credentials>(&format!(
        "SELECT {USER_COLUMNS}, u.password_hash
         FROM users u LEFT JOIN roles r ON r.id = u.role_id
         WHERE u.username = $1"
    ))
    .bind(payload.username.trim())
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    let ok = verify(&payload.password, &creds.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;
    if !ok {
        warn!("Rejected login with wrong password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }
    if !creds.user.is_active {
        return Err(AppError::forbidden("Account is inactive"));
    }

    let user = creds.user;
    let token = sign_token(user.id, user.role_name.as_deref(), &user.username, &state.config.jwt_secret)?;

    Ok(ApiResponse::ok(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: TOKEN_TTL_HOURS * 60 * 60,
        user: user.into(),
    }))
}

// GET /v1/auth/me
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = find_user(&state.db_pool, auth.user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

// GET /admin/users
#[instrument(skip(state))]
pub async fn admin_list_users(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<UserResponse>, PageMeta>, AppError> {
    let filter = UserFilter::from_params(&params)?;
    let (page, per_page) = (filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    filter.push_from_where(&mut count);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&state.db_pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS}"));
    filter.push_from_where(&mut select);
    select
        .push(" ORDER BY u.created_at DESC, u.id DESC LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind((page - 1) * per_page);
    let users: Vec<UserWithRole> = select.build_query_as::<UserWithRole>().fetch_all(&state.db_pool).await?;

    let meta = PageMeta::new(page, per_page, total, users.len(), None);
    Ok(ApiResponse::with_meta(users.into_iter().map(Into::into).collect(), meta))
}

// GET /admin/users/{id}
#[instrument(skip(state))]
pub async fn admin_get_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    Ok(ApiResponse::ok(find_user(&state.db_pool, id).await?.into()))
}

// PUT /admin/users/{id}
#[instrument(skip(state, payload))]
pub async fn update_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let mut v = Validator::new();
    if let Some(name) = &payload.name {
        v.required_text("name", name, 255);
    }
    v.finish()?;

    let result = sqlx::query(
        "UPDATE users SET
            name = COALESCE($1, name),
            role_id = COALESCE($2, role_id),
            is_active = COALESCE($3, is_active),
            updated_at = now()
         WHERE id = $4",
    )
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.role_id)
    .bind(payload.is_active)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "User already exists"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }

    info!(id, role_id = ?payload.role_id, is_active = ?payload.is_active, "User updated");
    Ok(ApiResponse::ok(find_user(&state.db_pool, id).await?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn user_filter_binds_search_once_per_column() {
        let filter = UserFilter::from_params(&params(&[("q", "budi"), ("is_active", "true")])).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        filter.push_from_where(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("u.email ILIKE $3"));
        assert!(sql.contains("u.is_active = $4"));
    }

    #[test]
    fn user_filter_rejects_bad_role_id() {
        assert!(UserFilter::from_params(&params(&[("role_id", "gold")])).is_err());
    }
}
