use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::{created, ApiError, MessageResponse};

/// Custom category metadata as stored in the sidecar, keyed by id
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<CategoryMap> {
    Json(state.store.custom_categories().await)
}

/// Create a custom category. The name is trimmed and lowercased before validation.
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let id = req.name.trim().to_lowercase();
    let category = state.store.create_category(&id, &req).await?;

    Ok(created(CategoryResponse {
        success: true,
        message: format!("Category \"{}\" created successfully", id),
        category,
    }))
}

/// Update display metadata of a custom category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state.store.update_category(&id, &req).await?;

    Ok(Json(CategoryResponse {
        success: true,
        message: format!("Category \"{}\" updated successfully", id),
        category,
    }))
}

/// Delete a custom category; its templates move to `community`
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let moved = state.store.delete_category(&id).await?;

    Ok(MessageResponse::new(format!(
        "Category \"{}\" deleted successfully. {} templates moved to community category.",
        id, moved
    )))
}
