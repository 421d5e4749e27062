use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::catalyst::types::{NetworkDevice, Site};
use crate::catalyst::{CatalystClient, DeployRequest};
use crate::AppState;

use super::ApiError;

fn client(state: &AppState) -> Result<&CatalystClient, ApiError> {
    state
        .catalyst
        .as_deref()
        .ok_or_else(|| ApiError::unavailable("Catalyst Center is not configured"))
}

// Controller failures are upstream problems, reported as 502 with the reason
fn upstream(err: anyhow::Error) -> ApiError {
    tracing::warn!("Catalyst Center request failed: {:#}", err);
    ApiError::bad_gateway(format!("Catalyst Center request failed: {}", err))
}

pub async fn get_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NetworkDevice>>, ApiError> {
    let devices = client(&state)?.get_devices().await.map_err(upstream)?;
    Ok(Json(devices))
}

pub async fn get_sites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Site>>, ApiError> {
    let sites = client(&state)?.get_sites().await.map_err(upstream)?;
    Ok(Json(sites))
}

pub async fn get_network_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let health = client(&state)?.get_network_health().await.map_err(upstream)?;
    Ok(Json(health))
}

pub async fn get_templates(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let templates = client(&state)?.get_templates().await.map_err(upstream)?;
    Ok(Json(templates))
}

/// Push a controller template to devices
pub async fn deploy_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeployRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.template_id.is_empty() || req.target_devices.is_empty() {
        return Err(ApiError::bad_request(
            "template_id and target_devices are required",
        ));
    }
    let result = client(&state)?.deploy_template(&req).await.map_err(upstream)?;
    Ok(Json(result))
}
