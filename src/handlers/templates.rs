use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::*;
use crate::render::render_template;
use crate::utils::is_safe_name;
use crate::AppState;

use super::{ApiError, MessageResponse};

/// Templates shown per category on the home overview
const OVERVIEW_PREVIEW_COUNT: usize = 3;

/// List all templates across every category
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Template>>, ApiError> {
    let templates = state.store.list_all_templates().await?;
    Ok(Json(templates))
}

/// List templates of one category
pub async fn list_category_templates(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Template>>, ApiError> {
    let templates = state.store.list_templates(&category).await?;
    Ok(Json(templates))
}

/// Get a single template by category and file stem
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
) -> Result<Json<Template>, ApiError> {
    if !is_safe_name(&name) {
        return Err(ApiError::not_found("template"));
    }
    let template = state
        .store
        .get_template(&category, &name)
        .await?
        .ok_or_else(|| ApiError::not_found("template"))?;
    Ok(Json(template))
}

/// Render a template's configuration with the supplied parameters.
/// Render failures come back as text in `rendered_config`, not as an HTTP error.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let (Some(name), Some(category)) = (
        req.template_name.as_deref().filter(|s| !s.is_empty()),
        req.category.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request("template_name and category are required"));
    };
    if !is_safe_name(name) {
        return Err(ApiError::not_found("template"));
    }

    let template = state
        .store
        .get_template(category, name)
        .await?
        .ok_or_else(|| ApiError::not_found("template"))?;

    let outcome = render_template(&template, &req.parameters);
    let error = outcome.error().map(str::to_string);

    Ok(Json(RenderResponse {
        success: true,
        rendered_config: outcome.into_text(),
        template_name: name.to_string(),
        error,
    }))
}

/// Move a template file (full filename with extension) to another category
pub async fn move_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveTemplateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
    let (Some(filename), Some(from), Some(to)) = (
        non_empty(&req.template_name),
        non_empty(&req.from_category),
        non_empty(&req.to_category),
    ) else {
        return Err(ApiError::bad_request("Missing required parameters"));
    };

    if from == to {
        return Err(ApiError::bad_request(
            "Source and destination categories are the same",
        ));
    }
    if !is_safe_name(&filename) {
        return Err(ApiError::bad_request("Invalid template name"));
    }

    state.store.move_template(&from, &to, &filename).await?;
    tracing::info!("Moved template '{}' from '{}' to '{}'", filename, from, to);

    Ok(MessageResponse::new(format!(
        "Template \"{}\" moved from \"{}\" to \"{}\" successfully",
        filename, from, to
    )))
}

/// Categories a template can be moved to: every known category except its own
pub async fn move_options(
    State(state): State<Arc<AppState>>,
    Path((category, template_name)): Path<(String, String)>,
) -> Result<Json<MoveOptionsResponse>, ApiError> {
    let available_categories: BTreeMap<String, Category> = state
        .store
        .list_categories()
        .await
        .into_iter()
        .filter(|c| c.id != category)
        .map(|c| (c.id.clone(), c))
        .collect();

    Ok(Json(MoveOptionsResponse {
        template_name,
        current_category: category,
        available_categories,
    }))
}

/// Home overview: every category with its template count and first few templates
pub async fn overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryOverview>>, ApiError> {
    let mut tiles = Vec::new();
    for category in state.store.list_categories().await {
        let mut templates = state.store.list_templates(&category.id).await?;
        let count = templates.len();
        templates.truncate(OVERVIEW_PREVIEW_COUNT);
        tiles.push(CategoryOverview {
            category,
            count,
            templates,
        });
    }
    Ok(Json(tiles))
}
