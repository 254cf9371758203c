//! Composable view filters
//!
//! Category selection and free-text multi-term search are independent
//! predicates. A view applies whichever are set, combined with AND;
//! neither predicate knows about the other.

use crate::models::{Record, Snapshot};

#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub search: Option<SearchFilter>,
    pub category: Option<CategoryFilter>,
}

impl ViewFilter {
    pub fn matches(&self, record: &Record, snapshot: &Snapshot) -> bool {
        self.search
            .as_ref()
            .map_or(true, |f| f.matches(record, snapshot))
            && self.category.as_ref().map_or(true, |f| f.matches(record))
    }
}

/// Comma-separated multi-term substring search over name, slug and
/// resolved category name. Any matching term admits the record; an
/// all-whitespace query admits everything.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    terms: Vec<String>,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        let terms = query
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn matches(&self, record: &Record, snapshot: &Snapshot) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let name = record.name.to_lowercase();
        let slug = record.slug.to_lowercase();
        let category = snapshot
            .category_by_id(&record.category_id)
            .map(|c| c.name.to_lowercase())
            .unwrap_or_default();

        self.terms
            .iter()
            .any(|term| name.contains(term) || slug.contains(term) || category.contains(term))
    }
}

/// Single active category, matched by id.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub category_id: String,
}

impl CategoryFilter {
    pub fn new(category_id: &str) -> Self {
        Self {
            category_id: category_id.to_string(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.category_id == self.category_id
    }
}
