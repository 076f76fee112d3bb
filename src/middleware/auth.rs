use axum::{response::{Response, IntoResponse}};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::role::ADMIN_ROLE;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Option<String>,
    pub username: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// Who is looking at a public page. Anonymous when no valid token was sent.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthContext>);

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

    // Expect "Bearer <token>"
    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization format"))
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AppError> {
    let token = bearer_token(headers)?;
    let claims = verify_token(token, secret)?;
    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
        username: claims.username,
    })
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let ctx = match authenticate(req.headers(), &state.config.jwt_secret) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    // Attach context
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

/// Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<AuthContext>() {
        Some(ctx) if ctx.is_admin() => next.run(req).await,
        Some(ctx) => {
            tracing::warn!(user_id = ctx.user_id, "Non-admin attempted admin route");
            AppError::forbidden("Admin access required").into_response()
        }
        None => AppError::unauthorized("Missing Authorization header").into_response(),
    }
}

/// Attaches a `Viewer`; bad or missing tokens fall back to anonymous.
pub async fn attach_viewer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let viewer = if req.headers().contains_key(header::AUTHORIZATION) {
        match authenticate(req.headers(), &state.config.jwt_secret) {
            Ok(ctx) => Viewer(Some(ctx)),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid viewer token");
                Viewer(None)
            }
        }
    } else {
        Viewer(None)
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}
