//! Catalog search: filter, sort and group templates in memory.
//!
//! Everything here is pure; the caller loads templates from the store and
//! hands them over.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::*;

/// Sort keys understood by the search view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Author,
    /// Plain string comparison: "10.0" sorts before "2.0"
    Version,
}

impl SortKey {
    /// Unknown keys (e.g. "date") mean "keep load order"
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortKey::Name),
            "author" => Some(SortKey::Author),
            "version" => Some(SortKey::Version),
            _ => None,
        }
    }

    fn compare(self, a: &Template, b: &Template) -> Ordering {
        match self {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
            SortKey::Version => a.version.cmp(&b.version),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// SearchQuery is a normalized search request
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lowercased free-text query
    pub text: String,
    pub category: Option<String>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    pub file_type: Option<FileType>,
    /// Lowercased author filter
    pub author: String,
    raw: SearchParams,
}

impl SearchQuery {
    pub fn from_params(params: &SearchParams) -> Self {
        let category = params.category.trim();
        let file_type = params.file_type.trim();
        Self {
            text: params.q.trim().to_lowercase(),
            category: (!category.is_empty()).then(|| category.to_string()),
            sort: SortKey::parse(params.sort.trim()),
            order: SortOrder::parse(params.order.trim()),
            file_type: file_type.parse().ok(),
            author: params.author.trim().to_lowercase(),
            raw: params.clone(),
        }
    }

    /// True when nothing narrows the catalog: no text, category, type or author.
    /// An unrecognized file type still counts as a filter (and matches nothing).
    pub fn is_unfiltered(&self) -> bool {
        self.text.is_empty()
            && self.category.is_none()
            && self.raw.file_type.trim().is_empty()
            && self.author.is_empty()
    }

    pub fn matches(&self, template: &Template) -> bool {
        if !self.text.is_empty() && !template.searchable_text().contains(&self.text) {
            return false;
        }
        if !self.raw.file_type.trim().is_empty() && self.file_type != Some(template.file_type) {
            return false;
        }
        if !self.author.is_empty() && !template.author.to_lowercase().contains(&self.author) {
            return false;
        }
        if let Some(category) = &self.category {
            if &template.category != category {
                return false;
            }
        }
        true
    }
}

/// Outcome of a search request
#[derive(Debug)]
pub enum SearchOutcome {
    /// Nothing to filter on: show the home view instead
    RedirectHome,
    Results(SearchResults),
}

/// Filter and sort templates in place. Sorting is stable, so ties keep load order.
pub fn filter_and_sort(query: &SearchQuery, templates: Vec<Template>) -> Vec<Template> {
    let mut matched: Vec<Template> = templates.into_iter().filter(|t| query.matches(t)).collect();

    if let Some(key) = query.sort {
        match query.order {
            SortOrder::Asc => matched.sort_by(|a, b| key.compare(a, b)),
            SortOrder::Desc => matched.sort_by(|a, b| key.compare(b, a)),
        }
    }
    matched
}

/// Run a search over already-loaded templates and group the matches by category
pub fn search(query: &SearchQuery, templates: Vec<Template>) -> SearchOutcome {
    if query.is_unfiltered() {
        return SearchOutcome::RedirectHome;
    }

    let matched = filter_and_sort(query, templates);
    let total_results = matched.len();

    let mut categories: BTreeMap<String, Vec<Template>> = BTreeMap::new();
    for template in matched {
        categories
            .entry(template.category.clone())
            .or_default()
            .push(template);
    }

    SearchOutcome::Results(SearchResults {
        query: query.text.clone(),
        categories,
        total_results,
        sort_by: query.raw.sort.clone(),
        sort_order: query.raw.order.clone(),
        file_type: query.raw.file_type.clone(),
        author: query.author.clone(),
        selected_category: query.raw.category.clone(),
    })
}
