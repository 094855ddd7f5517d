//! dccn-chair library - conference chair service
//!
//! JSON API over the DCCN database for the chairs of a conference:
//! submission lifecycle, reviewer assignment, decisions, camera-ready
//! volumes, mailing lists and CSV export.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use dccn_common::{EventBus, Workflow};

pub mod api;
pub mod error;
pub mod pagination;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// State-changing operations on submissions
    pub workflow: Workflow,
    /// Event bus for SSE broadcasting
    pub events: Arc<EventBus>,
    /// Service startup timestamp, reported by /health
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, events: Arc<EventBus>) -> Self {
        let workflow = Workflow::new(db.clone(), events.clone());
        Self {
            db,
            workflow,
            events,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::dashboard_routes())
        .merge(api::submission_routes())
        .merge(api::user_routes())
        .merge(api::review_routes())
        .merge(api::decision_routes())
        .merge(api::message_routes())
        .merge(api::export_routes())
        .merge(api::sse_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
