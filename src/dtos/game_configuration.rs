// src/dtos/game_configuration.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dtos::catalog::ConfigurationFieldResponse;
use crate::error::AppError;
use crate::media::resolve_display_url;
use crate::models::game_configuration::{GameConfiguration, GameConfigurationField};
use crate::validation::Validator;

pub const FIELD_TYPES: [&str; 4] = ["text", "number", "select", "password"];

#[derive(Debug, Deserialize)]
pub struct CreateGameConfigurationRequest {
    pub name: String,
    pub guide_text: Option<String>,
    pub guide_image_path: Option<String>,
    pub validation_provider: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateGameConfigurationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGameConfigurationRequest {
    pub name: Option<String>,
    pub guide_text: Option<String>,
    pub guide_image_path: Option<String>,
    pub validation_provider: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateGameConfigurationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        v.finish()
    }
}

fn check_field(v: &mut Validator, field_type: &str, options: Option<&Value>) {
    v.check(FIELD_TYPES.contains(&field_type), "type", "must be one of: text, number, select, password");
    if field_type == "select" {
        v.check(
            options.is_some_and(|o| o.as_array().is_some_and(|a| !a.is_empty())),
            "options",
            "must list at least one option for select fields",
        );
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFieldRequest {
    pub input_name: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub options: Option<Value>,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    pub validation_rules: Option<String>,
    pub is_required: Option<bool>,
    pub display_order: Option<i32>,
}

fn default_field_type() -> String {
    "text".to_string()
}

impl CreateFieldRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("input_name", &self.input_name, 255);
        v.required_text("label", &self.label, 255);
        check_field(&mut v, &self.field_type, self.options.as_ref());
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub input_name: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub options: Option<Value>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub validation_rules: Option<String>,
    pub is_required: Option<bool>,
    pub display_order: Option<i32>,
}

impl UpdateFieldRequest {
    pub fn validate(&self, current: &GameConfigurationField) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.input_name {
            v.required_text("input_name", name, 255);
        }
        if let Some(label) = &self.label {
            v.required_text("label", label, 255);
        }
        let field_type = self.field_type.as_deref().unwrap_or(&current.field_type);
        check_field(&mut v, field_type, self.options.as_ref().or(current.options.as_ref()));
        v.finish()
    }
}

impl From<GameConfigurationField> for ConfigurationFieldResponse {
    fn from(f: GameConfigurationField) -> Self {
        Self {
            id: f.id,
            input_name: f.input_name,
            label: f.label,
            placeholder: f.placeholder,
            options: f.options,
            field_type: f.field_type,
            validation_rules: f.validation_rules,
            is_required: f.is_required,
            display_order: f.display_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameConfigurationResponse {
    pub id: i64,
    pub name: String,
    pub guide_text: Option<String>,
    pub guide_image_path: Option<String>,
    pub guide_image_url: Option<String>,
    pub validation_provider: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<ConfigurationFieldResponse>,
}

impl GameConfigurationResponse {
    pub fn new(c: GameConfiguration, fields: Vec<GameConfigurationField>, storage_base: &str) -> Self {
        Self {
            guide_image_url: resolve_display_url(c.guide_image_path.as_deref(), storage_base),
            id: c.id,
            name: c.name,
            guide_text: c.guide_text,
            guide_image_path: c.guide_image_path,
            validation_provider: c.validation_provider,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_fields_need_options() {
        let req: CreateFieldRequest = serde_json::from_value(json!({
            "input_name": "server",
            "label": "Server",
            "type": "select"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateFieldRequest = serde_json::from_value(json!({
            "input_name": "server",
            "label": "Server",
            "type": "select",
            "options": [{ "label": "Asia", "value": "asia" }]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn field_type_defaults_to_text_and_is_checked() {
        let req: CreateFieldRequest =
            serde_json::from_value(json!({ "input_name": "user_id", "label": "User ID" })).unwrap();
        assert_eq!(req.field_type, "text");
        assert!(req.validate().is_ok());

        let bad: CreateFieldRequest =
            serde_json::from_value(json!({ "input_name": "x", "label": "X", "type": "date" })).unwrap();
        assert!(bad.validate().is_err());
    }
}
