use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;

use crate::catalog::{search, SearchOutcome, SearchQuery};
use crate::models::SearchParams;
use crate::AppState;

use super::ApiError;

/// Search the catalog. With no filter at all the caller is sent back home.
pub async fn search_templates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let query = SearchQuery::from_params(&params);
    if query.is_unfiltered() {
        return Ok(Redirect::to("/").into_response());
    }

    // An unknown category simply matches nothing
    let templates = match &query.category {
        Some(category) => {
            if state.store.category_exists(category).await {
                state.store.list_templates(category).await?
            } else {
                Vec::new()
            }
        }
        None => state.store.list_all_templates().await?,
    };

    match search(&query, templates) {
        SearchOutcome::RedirectHome => Ok(Redirect::to("/").into_response()),
        SearchOutcome::Results(results) => {
            tracing::debug!("Search '{}' matched {} templates", results.query, results.total_results);
            Ok(Json(results).into_response())
        }
    }
}
