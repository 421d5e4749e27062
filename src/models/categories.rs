use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::Template;

/// Built-in categories, present even without a registry entry
pub mod builtin_category {
    pub const NETWORK: &str = "network";
    pub const SECURITY: &str = "security";
    pub const AUTOMATION: &str = "automation";
    pub const MONITORING: &str = "monitoring";
    pub const COMMUNITY: &str = "community";

    pub const ALL: &[&str] = &[NETWORK, SECURITY, AUTOMATION, MONITORING, COMMUNITY];

    pub fn is_builtin(id: &str) -> bool {
        ALL.contains(&id)
    }

    /// Default (display name, icon, color) for a built-in category
    pub fn display_defaults(id: &str) -> Option<(&'static str, &'static str, &'static str)> {
        match id {
            NETWORK => Some(("Network", "fas fa-network-wired", "primary")),
            SECURITY => Some(("Security", "fas fa-shield-alt", "success")),
            AUTOMATION => Some(("Automation", "fas fa-robot", "warning")),
            MONITORING => Some(("Monitoring", "fas fa-chart-line", "info")),
            COMMUNITY => Some(("Community", "fas fa-users", "secondary")),
            _ => None,
        }
    }
}

pub const DEFAULT_CATEGORY_ICON: &str = "fas fa-folder";
pub const DEFAULT_CATEGORY_COLOR: &str = "secondary";

/// CategoryMetadata is one entry of the category sidecar file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Set while a delete is in progress; a leftover marker means the delete was interrupted
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleting: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The whole sidecar file: category id -> metadata
pub type CategoryMap = BTreeMap<String, CategoryMetadata>;

/// Category is the resolved view of a category: built-in defaults merged with metadata
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: String,
    pub builtin: bool,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Category {
    pub fn resolve(id: &str, meta: Option<&CategoryMetadata>) -> Self {
        let defaults = builtin_category::display_defaults(id);
        let (default_display, default_icon, default_color) = match defaults {
            Some((display, icon, color)) => (display.to_string(), icon, color),
            None => (title_case(id), DEFAULT_CATEGORY_ICON, DEFAULT_CATEGORY_COLOR),
        };
        let field = |value: Option<&Option<String>>, fallback: &str| {
            value
                .and_then(|v| v.clone())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            id: id.to_string(),
            builtin: defaults.is_some(),
            display_name: field(meta.map(|m| &m.display_name), &default_display),
            description: field(meta.map(|m| &m.description), ""),
            icon: field(meta.map(|m| &m.icon), default_icon),
            color: field(meta.map(|m| &m.color), default_color),
            created_at: meta.and_then(|m| m.created_at.clone()),
            updated_at: meta.and_then(|m| m.updated_at.clone()),
        }
    }
}

/// Title-case a category id: "data-center" -> "Data-Center"
pub fn title_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut start = true;
    for c in id.chars() {
        if c.is_alphabetic() {
            if start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start = false;
        } else {
            out.push(c);
            start = true;
        }
    }
    out
}

/// CreateCategoryRequest for creating a custom category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// UpdateCategoryRequest merges the supplied fields over existing metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// CategoryResponse wraps a created or updated category entry
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub success: bool,
    pub message: String,
    pub category: CategoryMetadata,
}

/// CategoryOverview is one tile of the home view
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOverview {
    #[serde(flatten)]
    pub category: Category,
    pub count: usize,
    pub templates: Vec<Template>,
}

/// MoveOptionsResponse lists the categories a template can be moved to
#[derive(Debug, Clone, Serialize)]
pub struct MoveOptionsResponse {
    pub template_name: String,
    pub current_category: String,
    pub available_categories: BTreeMap<String, Category>,
}
