use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Success envelope shared by every collection endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 201 response carrying a payload
    pub fn created(message: &'static str, data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status: true,
                message,
                data: Some(data),
            }),
        )
    }
}

impl ApiResponse<()> {
    /// 201 response with no payload
    pub fn done(message: &'static str) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status: true,
                message,
                data: None,
            }),
        )
    }
}
