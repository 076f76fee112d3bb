// src/response.rs
use axum::{response::{IntoResponse, Response}, Json};
use serde::Serialize;

/// Success envelope shared by every endpoint:
/// `{"success": true, "data": ..., "meta": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T, M = ()> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data, meta: None }
    }
}

impl<T, M> ApiResponse<T, M> {
    pub fn with_meta(data: T, meta: M) -> Self {
        Self { success: true, data, meta: Some(meta) }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for ApiResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

impl Deleted {
    pub fn new(id: i64) -> Self {
        Self { id, deleted: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_is_omitted_when_absent() {
        let value = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(value, json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn meta_is_rendered_when_present() {
        let value = serde_json::to_value(ApiResponse::with_meta("x", json!({ "total": 1 }))).unwrap();
        assert_eq!(value["meta"]["total"], 1);
    }
}
