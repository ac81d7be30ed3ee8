use serde::{Deserialize, Serialize};

pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 100;

/// Page request. The zero value means "first page with the default limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

impl Pagination {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Apply the defaults when both fields are zero; any other pair is kept as-is.
    pub fn or_default_page(self) -> Self {
        if self.offset == 0 && self.limit == 0 {
            Self::new(DEFAULT_OFFSET, DEFAULT_LIMIT)
        } else {
            self
        }
    }
}
