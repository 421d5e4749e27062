use anyhow::{Context, Result};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::models::*;
use crate::utils::is_valid_category_id;

use super::{ConflictError, InvalidArgumentError, NotFoundError};

/// CategoryRegistry owns the category id -> directory mapping and the JSON
/// sidecar holding custom category metadata.
///
/// Every read-modify-write of the sidecar happens under `write_lock`, and the
/// file is replaced through a temp file + rename, so concurrent requests in
/// this process cannot lose each other's updates.
pub struct CategoryRegistry {
    templates_dir: PathBuf,
    sidecar_path: PathBuf,
    write_lock: Mutex<()>,
}

impl CategoryRegistry {
    pub fn new(templates_dir: impl Into<PathBuf>, sidecar_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            sidecar_path: sidecar_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Directory holding a category's template files
    pub fn dir_for(&self, id: &str) -> PathBuf {
        self.templates_dir.join(id)
    }

    /// Create the built-in category directories
    pub async fn ensure_builtin_dirs(&self) -> Result<()> {
        for id in builtin_category::ALL {
            let dir = self.dir_for(id);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Read the sidecar. A missing file is an empty registry; a corrupt one is an error.
    async fn read_sidecar(&self) -> Result<CategoryMap> {
        let content = match tokio::fs::read_to_string(&self.sidecar_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CategoryMap::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.sidecar_path.display())
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(CategoryMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.sidecar_path.display()))
    }

    /// Read the sidecar for display purposes, treating a corrupt file as empty
    async fn read_sidecar_lenient(&self) -> CategoryMap {
        match self.read_sidecar().await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!("Error loading custom categories: {:#}", e);
                CategoryMap::new()
            }
        }
    }

    async fn write_sidecar(&self, map: &CategoryMap) -> Result<()> {
        if let Some(parent) = self.sidecar_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(map)?;
        let file_name = self
            .sidecar_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "categories.json".to_string());
        let tmp_path = self
            .sidecar_path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.sidecar_path)
            .await
            .with_context(|| format!("Failed to replace {}", self.sidecar_path.display()))?;
        Ok(())
    }

    /// Raw custom category metadata, keyed by id
    pub async fn custom(&self) -> CategoryMap {
        self.read_sidecar_lenient().await
    }

    /// All known category ids: built-ins first, then custom ones
    pub async fn ids(&self) -> Vec<String> {
        let custom = self.read_sidecar_lenient().await;
        builtin_category::ALL
            .iter()
            .map(|id| id.to_string())
            .chain(
                custom
                    .into_keys()
                    .filter(|id| !builtin_category::is_builtin(id) && is_valid_category_id(id)),
            )
            .collect()
    }

    /// All known categories with display metadata resolved
    pub async fn list(&self) -> Vec<Category> {
        let custom = self.read_sidecar_lenient().await;
        let mut ids: Vec<&str> = builtin_category::ALL.to_vec();
        ids.extend(
            custom
                .keys()
                .map(String::as_str)
                .filter(|id| !builtin_category::is_builtin(id) && is_valid_category_id(id)),
        );
        ids.into_iter()
            .map(|id| Category::resolve(id, custom.get(id)))
            .collect()
    }

    /// Resolve a category id to its directory
    pub async fn resolve(&self, id: &str) -> Result<PathBuf> {
        if builtin_category::is_builtin(id) {
            return Ok(self.dir_for(id));
        }
        if is_valid_category_id(id) && self.read_sidecar_lenient().await.contains_key(id) {
            return Ok(self.dir_for(id));
        }
        Err(NotFoundError::new("Category", id).into())
    }

    /// Register a new custom category and create its directory
    pub async fn create(&self, id: &str, req: &CreateCategoryRequest) -> Result<CategoryMetadata> {
        if id.is_empty() {
            return Err(InvalidArgumentError::new("Category name is required").into());
        }
        if !is_valid_category_id(id) {
            return Err(InvalidArgumentError::new(
                "Category name can only contain lowercase letters, numbers, and hyphens",
            )
            .into());
        }

        let _guard = self.write_lock.lock().await;
        let mut map = self.read_sidecar().await?;
        if builtin_category::is_builtin(id) || map.contains_key(id) {
            return Err(ConflictError::new(format!("Category \"{}\" already exists", id)).into());
        }

        let dir = self.dir_for(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let metadata = CategoryMetadata {
            name: Some(id.to_string()),
            display_name: Some(
                non_empty(req.display_name.as_deref()).unwrap_or_else(|| title_case(id)),
            ),
            description: Some(non_empty(req.description.as_deref()).unwrap_or_default()),
            icon: Some(
                non_empty(req.icon.as_deref()).unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            ),
            color: Some(
                non_empty(req.color.as_deref())
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            ),
            created_at: Some(Utc::now().to_rfc3339()),
            ..Default::default()
        };
        map.insert(id.to_string(), metadata.clone());
        self.write_sidecar(&map).await?;

        tracing::info!("Created category '{}'", id);
        Ok(metadata)
    }

    /// Merge the supplied fields over a custom category's metadata
    pub async fn update(&self, id: &str, req: &UpdateCategoryRequest) -> Result<CategoryMetadata> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_sidecar().await?;
        let entry = map
            .get_mut(id)
            .ok_or_else(|| NotFoundError::new("Category", id))?;

        if let Some(display_name) = &req.display_name {
            entry.display_name = Some(display_name.clone());
        }
        if let Some(description) = &req.description {
            entry.description = Some(description.clone());
        }
        if let Some(icon) = &req.icon {
            entry.icon = Some(icon.clone());
        }
        if let Some(color) = &req.color {
            entry.color = Some(color.clone());
        }
        entry.updated_at = Some(Utc::now().to_rfc3339());

        let updated = entry.clone();
        self.write_sidecar(&map).await?;
        Ok(updated)
    }

    /// Delete a custom category, moving its files into `community`.
    ///
    /// Steps run in order: mark the entry as deleting, move the files, remove
    /// the directory, drop the entry. If any step fails the marker stays in
    /// the sidecar; calling delete again (or [`Self::recover_pending`])
    /// resumes from wherever it stopped. Returns the number of files moved.
    pub async fn delete(&self, id: &str) -> Result<usize> {
        if builtin_category::is_builtin(id) {
            return Err(InvalidArgumentError::new(format!(
                "Built-in category \"{}\" cannot be deleted",
                id
            ))
            .into());
        }

        let _guard = self.write_lock.lock().await;
        let mut map = self.read_sidecar().await?;
        let entry = map
            .get_mut(id)
            .ok_or_else(|| NotFoundError::new("Category", id))?;

        if !entry.deleting {
            entry.deleting = true;
            self.write_sidecar(&map).await?;
        }

        let moved = self.drain_into_community(id).await?;
        map.remove(id);
        self.write_sidecar(&map).await?;

        tracing::info!("Deleted category '{}', moved {} templates to community", id, moved);
        Ok(moved)
    }

    /// Finish deletes that were interrupted part way. Returns how many were completed.
    pub async fn recover_pending(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_sidecar().await?;
        let pending: Vec<String> = map
            .iter()
            .filter(|(_, meta)| meta.deleting)
            .map(|(id, _)| id.clone())
            .collect();

        let mut finished = 0;
        for id in &pending {
            match self.drain_into_community(id).await {
                Ok(moved) => {
                    map.remove(id);
                    finished += 1;
                    tracing::warn!("Resumed interrupted delete of '{}', moved {} entries", id, moved);
                }
                Err(e) => {
                    tracing::error!("Failed to finish delete of category '{}': {:#}", id, e);
                }
            }
        }
        if finished > 0 {
            self.write_sidecar(&map).await?;
        }
        Ok(finished)
    }

    /// Move every entry of a category (files and subdirectories) into
    /// `community` and remove its directory.
    /// Safe to re-run: already moved entries and a missing directory are fine.
    async fn drain_into_community(&self, id: &str) -> Result<usize> {
        if !is_valid_category_id(id) {
            return Err(InvalidArgumentError::new(format!("Invalid category id \"{}\"", id)).into());
        }
        let dir = self.dir_for(id);
        let community = self.dir_for(builtin_category::COMMUNITY);
        tokio::fs::create_dir_all(&community).await?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
        };

        let mut moved = 0;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let target = free_target(&community, &file_name, id).await?;
            tokio::fs::rename(entry.path(), &target)
                .await
                .with_context(|| format!("Failed to move {}", entry.path().display()))?;
            moved += 1;
        }

        tokio::fs::remove_dir(&dir)
            .await
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
        Ok(moved)
    }
}

/// Pick a destination path in `dir` that does not overwrite an existing entry:
/// `name`, then `stem-<category>.ext`, then `stem-<category>-2.ext`, ...
async fn free_target(dir: &Path, file_name: &str, category: &str) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !tokio::fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (file_name, String::new()),
    };
    let mut n = 1;
    loop {
        let suffix = if n == 1 {
            format!("-{}", category)
        } else {
            format!("-{}-{}", category, n)
        };
        let candidate = dir.join(format!("{}{}{}", stem, suffix, ext));
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
