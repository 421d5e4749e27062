use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Template;

/// SearchParams are the raw `/search` query-string parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub author: String,
}

fn default_sort() -> String {
    "name".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            category: String::new(),
            sort: default_sort(),
            order: default_order(),
            file_type: String::new(),
            author: String::new(),
        }
    }
}

/// SearchResults is the grouped, sorted catalog view returned by `/search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub categories: BTreeMap<String, Vec<Template>>,
    pub total_results: usize,
    pub sort_by: String,
    pub sort_order: String,
    pub file_type: String,
    pub author: String,
    pub selected_category: String,
}
