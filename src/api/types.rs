//! API request, query, and error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::devices::{Power, RawFeatures};
use crate::error::ValidationError;
use crate::id::RoomId;
use crate::store::{NewDevice, NewRoutine};

/// Optional limit for the logs endpoint.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewRoomRequest {
    pub name: String,
}

/// Body of `POST /devices`. Feature values may be numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeviceRequest {
    pub room_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub features: Map<String, Value>,
    pub watt: Option<f64>,
}

impl From<NewDeviceRequest> for NewDevice {
    fn from(r: NewDeviceRequest) -> Self {
        Self {
            room_id: RoomId::from(r.room_id),
            device_type: r.device_type,
            name: r.name,
            features: RawFeatures::from_json(&r.features),
            watt: r.watt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PowerRequest {
    pub power: Power,
}

/// Body of `POST /devices/{id}/features`.
#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub key: String,
    pub value: Value,
}

impl FeatureRequest {
    /// The value as raw text, the way form input arrives.
    pub fn raw_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoutineRequest {
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub target: String,
    pub target_value: Option<String>,
    pub to: String,
}

impl From<NewRoutineRequest> for NewRoutine {
    fn from(r: NewRoutineRequest) -> Self {
        Self {
            name: r.name,
            time: r.time,
            target: r.target,
            target_value: r.target_value,
            to: r.to,
        }
    }
}

/// Body of `POST /register`. A blank name falls back to a default.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identifier of a newly created entity.
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// A rejected store operation: 404 for missing entities, 400 otherwise.
#[derive(Debug)]
pub struct ApiError(pub ValidationError);

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
