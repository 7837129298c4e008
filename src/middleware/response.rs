use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Successful handler output: a JSON body, a status and an optional `Location`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub location: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            location: None,
        }
    }

    /// 201 Created pointing at the new resource
    pub fn created(location: impl Into<String>, data: T) -> Self {
        Self {
            data,
            status_code: Some(StatusCode::CREATED),
            location: Some(location.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let body = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error("Failed to serialize response data").into_response();
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(_) => tracing::warn!("Dropping unrepresentable Location header: {}", location),
            }
        }
        response
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
