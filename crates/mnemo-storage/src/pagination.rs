use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

pub const DEFAULT_PER_PAGE: usize = 40;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

impl Pagination {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    pub fn first(per_page: usize) -> Self {
        Self::new(0, per_page)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(StorageError::InvalidPagination(
                "perPage must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn offset(&self) -> usize {
        self.page.saturating_mul(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Cut one page out of an already ordered result set
    pub fn paginate(all: Vec<T>, pagination: Pagination) -> Result<Self> {
        pagination.validate()?;

        let total = all.len();
        let items = all
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.per_page)
            .collect();

        Ok(Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            has_more: pagination.offset().saturating_add(pagination.per_page) < total,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            has_more: self.has_more,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> std::result::Result<U, E>) -> std::result::Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<std::result::Result<Vec<_>, E>>()?,
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            has_more: self.has_more,
        })
    }
}
