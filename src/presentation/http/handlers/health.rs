//! Health Check Handlers
//!
//! Liveness and readiness checks.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness check (is the process running?)
//! - `GET /health/ready` - Readiness check (database reachable?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::infrastructure::database;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Database round trips slower than this report as degraded
const DB_DEGRADED_AFTER: Duration = Duration::from_millis(100);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub relay: RelayHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Relay occupancy
#[derive(Debug, Serialize)]
pub struct RelayHealth {
    pub status: HealthStatus,
    pub active_connections: usize,
    pub active_rooms: usize,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness check. Always 200 while the process can serve requests.
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness check. 503 when the database is unreachable.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let db_health = check_database(&state).await;
    let relay_health = RelayHealth {
        status: HealthStatus::Healthy,
        active_connections: state.relay.connection_count(),
        active_rooms: state.relay.room_count(),
    };

    let overall_status = db_health.status;
    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            database: db_health,
            relay: relay_health,
        },
    };

    (status_code(overall_status), Json(response))
}

fn status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn database_health(result: Result<Duration, sqlx::Error>) -> ServiceHealth {
    match result {
        Ok(latency) => ServiceHealth {
            status: if latency < DB_DEGRADED_AFTER {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            latency_ms: Some(latency.as_millis() as u64),
            message: None,
        },
        Err(e) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Database connection failed: {}", e)),
        },
    }
}

async fn check_database(state: &AppState) -> ServiceHealth {
    database_health(database::ping(&state.db).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Healthy).unwrap();
        assert_eq!(json, "\"healthy\"");
    }

    #[test]
    fn test_database_health_thresholds() {
        assert_eq!(
            database_health(Ok(Duration::from_millis(5))).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            database_health(Ok(Duration::from_millis(500))).status,
            HealthStatus::Degraded
        );

        let down = database_health(Err(sqlx::Error::PoolTimedOut));
        assert_eq!(down.status, HealthStatus::Unhealthy);
        assert_eq!(status_code(down.status), StatusCode::SERVICE_UNAVAILABLE);
    }
}
