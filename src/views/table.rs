// Tabular presentation of one page of objects

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ObjectKind, ObjectNode};
use crate::query::{Page, Pagination, QueryError};

/// Client-side filter applied to the rows of the current page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFilter {
    /// Case-insensitive substring of the name
    #[serde(default)]
    pub name_contains: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<ObjectKind>,
    #[serde(default)]
    pub level: Option<i32>,
}

impl TableFilter {
    pub fn is_empty(&self) -> bool {
        self.name_contains.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.kind.is_none()
            && self.level.is_none()
    }

    pub fn matches(&self, node: &ObjectNode) -> bool {
        if let Some(needle) = self.name_contains.as_deref().map(str::trim) {
            if !needle.is_empty() && !node.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        self.kind.map_or(true, |kind| node.kind == kind) && self.level.map_or(true, |level| node.level == level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub level: i32,
    pub parent_id: Option<Uuid>,
}

impl From<&ObjectNode> for TableRow {
    fn from(node: &ObjectNode) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            description: node.description.clone(),
            kind: node.kind,
            level: node.level,
            parent_id: node.parent_id,
        }
    }
}

/// Rows for the current page plus what the toolbar needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub pagination: PaginationState,
    /// Total before filtering, across all pages
    pub total: u64,
    pub page_count: u64,
    /// Distinct types on this page, for the filter badges
    pub available_kinds: Vec<ObjectKind>,
    pub available_levels: Vec<i32>,
}

impl TableView {
    pub fn from_page(page: &Page<ObjectNode>, filter: &TableFilter) -> Self {
        let available_kinds: BTreeSet<ObjectKind> = page.items.iter().map(|node| node.kind).collect();
        let available_levels: BTreeSet<i32> = page.items.iter().map(|node| node.level).collect();

        Self {
            rows: page
                .items
                .iter()
                .filter(|node| filter.matches(node))
                .map(TableRow::from)
                .collect(),
            pagination: PaginationState::from(page.pagination()),
            total: page.total,
            page_count: page.page_count,
            available_kinds: available_kinds.into_iter().collect(),
            available_levels: available_levels.into_iter().collect(),
        }
    }
}

/// Grid pagination as the table widget sees it: zero-based page index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_index: u32,
    pub page_size: u32,
}

impl From<Pagination> for PaginationState {
    fn from(pagination: Pagination) -> Self {
        Self {
            page_index: pagination.page.saturating_sub(1),
            page_size: pagination.page_size,
        }
    }
}

impl PaginationState {
    /// A page change does not move rows by itself; the caller re-issues the
    /// listing with the returned request
    pub fn request(&self, page_index: u32, page_size: u32) -> PageRequest {
        // Changing the page size jumps back to the first page
        let page_index = if page_size == self.page_size { page_index } else { 0 };
        PageRequest { page_index, page_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn to_pagination(self) -> Result<Pagination, QueryError> {
        Pagination::new(self.page_index.saturating_add(1), self.page_size)
    }
}

/// Multi-row selection, kept across filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    ids: BTreeSet<Uuid>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the row is selected afterwards
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select_all<'a>(&mut self, rows: impl IntoIterator<Item = &'a TableRow>) {
        self.ids.extend(rows.into_iter().map(|row| row.id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<Uuid> for Selection {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
