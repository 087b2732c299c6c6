//! Request handlers for the API endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::devices::Device;
use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId, RoutineId};
use crate::sim::event::{Alert, LogEntry};
use crate::sim::report::EnergyReport;
use crate::sim::types::HomeState;

use super::AppState;
use super::types::{
    ApiError, FeatureRequest, IdResponse, LoginRequest, LogsQuery, NewDeviceRequest,
    NewRoomRequest, NewRoutineRequest, PowerRequest, RegisterRequest,
};

/// `GET /state` → 200 + the whole aggregate.
pub async fn get_state(State(state): State<AppState>) -> Json<HomeState> {
    Json(state.lock().state().clone())
}

/// `GET /logs` → newest first, up to the configured display limit.
/// `GET /logs?limit=N` → up to N entries.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<LogEntry>> {
    let store = state.lock();
    let limit = query.limit.unwrap_or(store.config().log_display_limit);
    let logs = store.state().recent_logs(limit).cloned().collect();
    Json(logs)
}

/// `GET /alerts` → 200 + every alert in raise order.
pub async fn get_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.lock().state().alerts.clone())
}

/// `GET /energy` → 200 + `EnergyReport`.
pub async fn get_energy(State(state): State<AppState>) -> Json<EnergyReport> {
    Json(EnergyReport::from_state(state.lock().state()))
}

/// `POST /rooms` → 201 + id, or 400 for a blank name.
pub async fn post_room(
    State(state): State<AppState>,
    Json(req): Json<NewRoomRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let id = state.lock().add_room(&req.name)?;
    Ok(created(id.to_string()))
}

/// `DELETE /rooms/{id}` → 204, removing the room's devices too.
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lock().remove_room(&RoomId::from(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /devices` → 201 + id; 404 for an unknown room, 400 for an
/// unknown type.
pub async fn post_device(
    State(state): State<AppState>,
    Json(req): Json<NewDeviceRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let id = state.lock().add_device(&req.into())?;
    Ok(created(id.to_string()))
}

/// `POST /devices/{id}/power` → 200 + the updated device.
pub async fn post_device_power(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PowerRequest>,
) -> Result<Json<Device>, ApiError> {
    let id = DeviceId::from(id);
    let (mut store, now) = state.lock_at();
    store.toggle_power(&id, req.power, &now)?;
    Ok(Json(updated_device(store.state(), &id)?))
}

/// `POST /devices/{id}/features` → 200 + the updated device. Keys that do
/// not belong to the device type are accepted and ignored.
pub async fn post_device_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FeatureRequest>,
) -> Result<Json<Device>, ApiError> {
    let id = DeviceId::from(id);
    let mut store = state.lock();
    store.set_feature(&id, &req.key, &req.raw_value())?;
    Ok(Json(updated_device(store.state(), &id)?))
}

/// `POST /routines` → 201 + id, or 400 for a blank name or bad time.
pub async fn post_routine(
    State(state): State<AppState>,
    Json(req): Json<NewRoutineRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let id = state.lock().add_routine(&req.into())?;
    Ok(created(id.to_string()))
}

/// `DELETE /routines/{id}` → 204.
pub async fn delete_routine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lock().remove_routine(&RoutineId::from(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /register` → 201 + user id and the user is signed in; 400 if the
/// email is taken.
pub async fn post_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let id = state
        .lock()
        .register(&req.name, &req.email, &req.password)?;
    Ok(created(id.to_string()))
}

/// `POST /login` → 200 + user id, or 400 for a bad email/password pair.
pub async fn post_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = state.lock().login(&req.email, &req.password)?;
    Ok(Json(IdResponse { id: id.to_string() }))
}

/// `POST /logout` → 204 whether or not anyone was signed in.
pub async fn post_logout(State(state): State<AppState>) -> StatusCode {
    state.lock().logout();
    StatusCode::NO_CONTENT
}

/// `POST /reset` → 204 after wiping users, the home, and saved state.
pub async fn post_reset(State(state): State<AppState>) -> StatusCode {
    state.lock().reset_all();
    StatusCode::NO_CONTENT
}

fn created(id: String) -> (StatusCode, Json<IdResponse>) {
    (StatusCode::CREATED, Json(IdResponse { id }))
}

fn updated_device(state: &HomeState, id: &DeviceId) -> Result<Device, ApiError> {
    state
        .device(id)
        .cloned()
        .ok_or_else(|| ValidationError::DeviceNotFound(id.to_string()).into())
}
