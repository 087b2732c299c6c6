//! REST API over a live, ticking store.
//!
//! Read endpoints:
//! - `GET /state`, `GET /logs?limit=N`, `GET /alerts`, `GET /energy`
//!
//! Mutating endpoints:
//! - `POST /rooms`, `DELETE /rooms/{id}`
//! - `POST /devices`, `POST /devices/{id}/power`, `POST /devices/{id}/features`
//! - `POST /routines`, `DELETE /routines/{id}`
//! - `POST /register`, `POST /login`, `POST /logout`, `POST /reset`

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use log::info;
use tokio::task::JoinHandle;

use crate::io::persist::Persistence;
use crate::sim::clock::{Clock, Moment};
use crate::store::Store;

pub use types::{
    ErrorResponse, FeatureRequest, IdResponse, LoginRequest, LogsQuery, NewDeviceRequest,
    NewRoomRequest, NewRoutineRequest, PowerRequest, RegisterRequest,
};

/// Store type shared by the server: persistence is chosen at startup.
pub type SharedStore = Store<Box<dyn Persistence + Send>>;

/// State shared by all handlers and the ticker task.
///
/// Every read and write goes through the one mutex, so a request never
/// observes a half-applied tick.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<SharedStore>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AppState {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            clock,
        }
    }

    /// Locks the store. A panic in another holder does not corrupt the
    /// aggregate, which is only ever replaced whole, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, SharedStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the store, then reads the clock, so writers stamp their
    /// changes in lock order.
    pub fn lock_at(&self) -> (MutexGuard<'_, SharedStore>, Moment) {
        let store = self.lock();
        let now = self.clock.now();
        (store, now)
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/logs", get(handlers::get_logs))
        .route("/alerts", get(handlers::get_alerts))
        .route("/energy", get(handlers::get_energy))
        .route("/rooms", post(handlers::post_room))
        .route("/rooms/{id}", delete(handlers::delete_room))
        .route("/devices", post(handlers::post_device))
        .route("/devices/{id}/power", post(handlers::post_device_power))
        .route("/devices/{id}/features", post(handlers::post_device_features))
        .route("/routines", post(handlers::post_routine))
        .route("/routines/{id}", delete(handlers::delete_routine))
        .route("/register", post(handlers::post_register))
        .route("/login", post(handlers::post_login))
        .route("/logout", post(handlers::post_logout))
        .route("/reset", post(handlers::post_reset))
        .with_state(state)
}

/// Spawns the recurring tick. Aborting the returned handle stops it.
pub fn spawn_ticker(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let (mut store, now) = state.lock_at();
            store.apply_tick(&now);
        }
    })
}

/// Binds to `addr`, starts the ticker, and serves until the server fails.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server stops.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let every = Duration::from_millis(state.lock().config().tick_interval_ms);
    let ticker = spawn_ticker(state.clone(), every);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");
    let result = axum::serve(listener, router(state)).await;
    ticker.abort();
    result
}
