use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::models::*;

use super::parse::{parse_json, parse_yaml, LoadOutcome, SkipReason};
use super::{ConflictError, NotFoundError};

/// Template file operations on one category directory.
/// Templates are rebuilt from disk on every call; nothing is cached.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Load a single template file and stamp its provenance fields
    pub async fn load(path: &Path, category: &str) -> Result<LoadOutcome> {
        let Some(file_type) = file_type_of(path) else {
            return Ok(LoadOutcome::Skipped(SkipReason::UnsupportedShape("extension")));
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Absent),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Ok(LoadOutcome::Skipped(SkipReason::Malformed(e.to_string())))
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        let stem = file_stem(path);
        let parsed = match file_type {
            FileType::Yaml if content.trim().is_empty() => Err(SkipReason::TooShort),
            FileType::Yaml => parse_yaml(&content),
            FileType::Json => parse_json(&content, &stem),
        };

        match parsed {
            Ok(mut template) => {
                template.category = category.to_string();
                template.filename = stem;
                template.file_type = file_type;
                template.file_path = path.display().to_string();
                Ok(LoadOutcome::Found(Box::new(template)))
            }
            Err(reason) => Ok(LoadOutcome::Skipped(reason)),
        }
    }

    /// List every `*.yaml` then `*.json` template in a category directory.
    /// Files that do not load are skipped; a missing directory lists as empty.
    pub async fn list(dir: &Path, category: &str) -> Result<Vec<Template>> {
        let mut yaml_files = Vec::new();
        let mut json_files = Vec::new();

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", dir.display()))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks; a dangling link is skipped
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to stat {}", path.display()))
                }
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some("yaml") => yaml_files.push(path),
                Some("json") => json_files.push(path),
                _ => {}
            }
        }
        yaml_files.sort();
        json_files.sort();

        let mut templates = Vec::with_capacity(yaml_files.len() + json_files.len());
        for path in yaml_files.into_iter().chain(json_files) {
            match Self::load(&path, category).await? {
                LoadOutcome::Found(template) => templates.push(*template),
                LoadOutcome::Absent => {}
                LoadOutcome::Skipped(reason) => {
                    tracing::warn!("Skipping template {}: {}", path.display(), reason);
                }
            }
        }

        Ok(templates)
    }

    /// Locate a template file by stem, trying YAML before JSON
    pub async fn find(dir: &Path, name: &str) -> Result<Option<(PathBuf, FileType)>> {
        for file_type in FileType::SEARCH_ORDER {
            let path = dir.join(format!("{}.{}", name, file_type.extension()));
            if tokio::fs::try_exists(&path).await? {
                return Ok(Some((path, file_type)));
            }
        }
        Ok(None)
    }

    /// Load a template by stem, trying YAML before JSON
    pub async fn get(dir: &Path, category: &str, name: &str) -> Result<Option<Template>> {
        match Self::find(dir, name).await? {
            Some((path, _)) => Ok(Self::load(&path, category).await?.into_template()),
            None => Ok(None),
        }
    }

    /// Write a new template file. The filename must already be sanitized.
    /// An existing file with the same name is never overwritten.
    pub async fn save(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(filename);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ConflictError::new(format!(
                    "Template \"{}\" already exists",
                    filename
                ))
                .into())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()))
            }
        };

        file.write_all(bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.flush().await?;

        Ok(path)
    }

    /// Move one file between category directories. Refuses to overwrite.
    pub async fn move_file(from_dir: &Path, to_dir: &Path, filename: &str) -> Result<PathBuf> {
        let from_path = from_dir.join(filename);
        let to_path = to_dir.join(filename);

        if !tokio::fs::try_exists(&from_path).await? {
            return Err(NotFoundError::new("Template", filename).into());
        }
        if tokio::fs::try_exists(&to_path).await? {
            return Err(ConflictError::new(format!(
                "Template \"{}\" already exists in destination",
                filename
            ))
            .into());
        }

        tokio::fs::create_dir_all(to_dir)
            .await
            .with_context(|| format!("Failed to create {}", to_dir.display()))?;
        tokio::fs::rename(&from_path, &to_path)
            .await
            .with_context(|| format!("Failed to move {}", from_path.display()))?;

        Ok(to_path)
    }
}

fn file_type_of(path: &Path) -> Option<FileType> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(FileType::from_extension)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
