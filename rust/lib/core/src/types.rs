use serde::{Deserialize, Serialize};

/// Parameters for list/query operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset for pagination.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ListParams {
    /// Build params from a 1-based page number and a page size.
    ///
    /// Page 0 is treated as page 1; a page size of 0 falls back to the default.
    pub fn page(page: usize, page_size: usize) -> Self {
        let limit = if page_size == 0 { default_limit() } else { page_size };
        Self {
            limit,
            offset: page.saturating_sub(1) * limit,
        }
    }

    /// The 1-based page number these params address.
    pub fn page_number(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    /// Slice an in-memory collection the way a server would paginate it.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().skip(self.offset).take(self.limit).cloned().collect()
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResult<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), total: 0 }
    }
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}
