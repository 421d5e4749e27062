mod categories;
mod parse;
mod templates;

pub use categories::CategoryRegistry;
pub use templates::TemplateRepo;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::*;

/// Typed error for a missing category, template or registry entry
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Typed error for a name that is already taken (duplicate category, move target exists)
#[derive(Debug)]
pub struct ConflictError {
    pub message: String,
}

impl ConflictError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConflictError {}

/// Typed error for a rejected input (malformed category id, built-in category delete)
#[derive(Debug)]
pub struct InvalidArgumentError {
    pub message: String,
}

impl InvalidArgumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InvalidArgumentError {}

/// Store handles all template and category operations, delegating to the
/// category registry and the per-directory template repo.
#[derive(Clone)]
pub struct Store {
    registry: Arc<CategoryRegistry>,
}

impl Store {
    pub fn new(templates_dir: impl Into<PathBuf>, categories_file: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(CategoryRegistry::new(templates_dir, categories_file)),
        }
    }

    /// Create built-in directories and finish any interrupted category deletes
    pub async fn init(&self) -> Result<()> {
        self.registry.ensure_builtin_dirs().await?;
        match self.registry.recover_pending().await {
            Ok(0) => {}
            Ok(recovered) => {
                tracing::warn!("Completed {} interrupted category deletes", recovered);
            }
            Err(e) => tracing::error!("Failed to recover interrupted category deletes: {:#}", e),
        }
        Ok(())
    }

    // ========== Category Operations ==========

    pub async fn list_categories(&self) -> Vec<Category> {
        self.registry.list().await
    }

    pub async fn custom_categories(&self) -> CategoryMap {
        self.registry.custom().await
    }

    pub async fn category_exists(&self, id: &str) -> bool {
        self.registry.resolve(id).await.is_ok()
    }

    pub async fn create_category(&self, id: &str, req: &CreateCategoryRequest) -> Result<CategoryMetadata> {
        self.registry.create(id, req).await
    }

    pub async fn update_category(&self, id: &str, req: &UpdateCategoryRequest) -> Result<CategoryMetadata> {
        self.registry.update(id, req).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<usize> {
        self.registry.delete(id).await
    }

    // ========== Template Operations ==========

    pub async fn list_templates(&self, category: &str) -> Result<Vec<Template>> {
        let dir = self.registry.resolve(category).await?;
        TemplateRepo::list(&dir, category).await
    }

    /// Every template of every known category, in category order
    pub async fn list_all_templates(&self) -> Result<Vec<Template>> {
        let mut all = Vec::new();
        for id in self.registry.ids().await {
            all.extend(TemplateRepo::list(&self.registry.dir_for(&id), &id).await?);
        }
        Ok(all)
    }

    pub async fn get_template(&self, category: &str, name: &str) -> Result<Option<Template>> {
        let dir = self.registry.resolve(category).await?;
        TemplateRepo::get(&dir, category, name).await
    }

    pub async fn find_template_file(&self, category: &str, name: &str) -> Result<Option<(PathBuf, FileType)>> {
        let dir = self.registry.resolve(category).await?;
        TemplateRepo::find(&dir, name).await
    }

    pub async fn save_template(&self, category: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.registry.resolve(category).await?;
        TemplateRepo::save(&dir, filename, bytes).await
    }

    pub async fn move_template(&self, from: &str, to: &str, filename: &str) -> Result<PathBuf> {
        let from_dir = self.registry.resolve(from).await?;
        let to_dir = self.registry.resolve(to).await?;
        TemplateRepo::move_file(&from_dir, &to_dir, filename).await
    }
}
