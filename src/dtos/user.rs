// src/dtos/user.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::user::UserWithRole;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.required_text("username", &self.username, 64);
        v.check(
            self.username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
            "username",
            "may only contain letters, digits, dots and underscores",
        );
        if let Some(email) = &self.email {
            v.check(email.contains('@'), "email", "must be a valid email address");
        }
        v.check(self.password.len() >= 8, "password", "must be at least 8 characters");
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: i64,
    pub user: UserResponse,
}

/// Admin-side edit: role assignment and account activation.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub role_id: Option<i64>,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserWithRole> for UserResponse {
    fn from(u: UserWithRole) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            phone: u.phone,
            balance: u.balance,
            role_id: u.role_id,
            role: u.role_name,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_collects_every_problem() {
        let req = RegisterUserRequest {
            name: String::new(),
            username: "bad name!".into(),
            email: Some("nope".into()),
            phone: None,
            password: "short".into(),
        };
        match req.validate() {
            Err(AppError::ValidationError { errors, .. }) => {
                for field in ["name", "username", "email", "password"] {
                    assert!(errors.contains_key(field), "missing {field}");
                }
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
