use anyhow::Result;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::io::{Cursor, Write};
use std::sync::Arc;

use crate::models::*;
use crate::utils::{allowed_file, is_safe_name, sanitize_filename};
use crate::AppState;

use super::ApiError;

/// Download the raw template file as an attachment
pub async fn download_template(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (path, file_type) = locate(&state, &category, &name).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(anyhow::Error::from)?;

    let filename = format!("{}.{}", name, file_type.extension());
    Ok(attachment(bytes, file_type.content_type(), &filename))
}

/// Return the raw template file content as JSON
pub async fn preview_template(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let (path, file_type) = locate(&state, &category, &name).await?;
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(anyhow::Error::from)?;

    Ok(Json(PreviewResponse {
        success: true,
        content,
        filename: format!("{}.{}", name, file_type.extension()),
        file_type,
    }))
}

/// Zip the selected `category:filename` templates.
/// Ids that are malformed or do not resolve to a file are skipped.
pub async fn bulk_download(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkDownloadRequest>,
) -> Result<Response, ApiError> {
    if req.templates.is_empty() {
        return Err(ApiError::bad_request("No templates selected"));
    }

    let mut entries = Vec::new();
    for id in &req.templates {
        let Some((category, name)) = id.split_once(':') else {
            tracing::debug!("Skipping malformed template id '{}'", id);
            continue;
        };
        if !is_safe_name(name) || !state.store.category_exists(category).await {
            tracing::debug!("Skipping unknown template '{}'", id);
            continue;
        }
        let Some((path, file_type)) = state.store.find_template_file(category, name).await? else {
            tracing::debug!("Skipping missing template '{}'", id);
            continue;
        };
        let bytes = tokio::fs::read(&path).await.map_err(anyhow::Error::from)?;
        entries.push((format!("{}/{}.{}", category, name, file_type.extension()), bytes));
    }

    let archive = build_zip(&entries)?;
    tracing::info!(
        "Bulk download: {} of {} requested templates",
        entries.len(),
        req.templates.len()
    );

    let filename = format!("templates_bulk_{}_files.zip", req.templates.len());
    Ok(attachment(archive, "application/zip", &filename))
}

/// Store an uploaded template file (multipart fields `file` and `category`)
pub async fn upload_template(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut category = builtin_category::COMMUNITY.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e)))?;
                if !value.trim().is_empty() {
                    category = value.trim().to_string();
                }
            }
            _ => {}
        }
    }

    let Some((original_name, data)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };
    if original_name.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !state.store.category_exists(&category).await {
        return Err(ApiError::bad_request("Invalid category"));
    }
    if !allowed_file(&original_name) {
        return Err(ApiError::bad_request("Invalid file type"));
    }

    let filename = stored_filename(&original_name)
        .ok_or_else(|| ApiError::bad_request("Invalid filename"))?;
    state.store.save_template(&category, &filename, &data).await?;
    tracing::info!("Uploaded template '{}' to '{}'", filename, category);

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Template uploaded successfully to {} category", category),
        filename,
        category,
    }))
}

/// Sanitized name a template is stored under: `.yml` becomes `.yaml`, extensions are lowercased
fn stored_filename(original: &str) -> Option<String> {
    let sanitized = sanitize_filename(original);
    let (stem, ext) = sanitized.rsplit_once('.')?;
    let file_type = FileType::from_extension(ext)?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}.{}", stem, file_type.extension()))
}

async fn locate(
    state: &AppState,
    category: &str,
    name: &str,
) -> Result<(std::path::PathBuf, FileType), ApiError> {
    if !is_safe_name(name) {
        return Err(ApiError::not_found("Template file"));
    }
    state
        .store
        .find_template_file(category, name)
        .await?
        .ok_or_else(|| ApiError::not_found("Template file"))
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Build an in-memory zip archive from (path, content) pairs
fn build_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (path, content) in files {
        zip.start_file(path.as_str(), options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}
