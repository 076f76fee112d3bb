// src/dtos/role.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::role::Role;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub profit_percentage: Decimal,
}

impl CreateRoleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 64);
        v.percentage("profit_percentage", self.profit_percentage);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub profit_percentage: Option<Decimal>,
}

impl UpdateRoleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 64);
        }
        if let Some(pct) = self.profit_percentage {
            v.percentage("profit_percentage", pct);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub profit_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
            profit_percentage: r.profit_percentage,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_percentage_must_be_within_bounds() {
        let too_high = CreateRoleRequest { name: "reseller".into(), profit_percentage: Decimal::from(101) };
        assert!(too_high.validate().is_err());
        let negative = UpdateRoleRequest { name: None, profit_percentage: Some(Decimal::from(-1)) };
        assert!(negative.validate().is_err());
        let ok = CreateRoleRequest { name: "reseller".into(), profit_percentage: Decimal::from(7) };
        assert!(ok.validate().is_ok());
    }
}
