use serde::Serialize;
use std::num::IntErrorKind;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Slice of a result set chosen for display. Always refers to a real page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// 1-based index of the first item on this page, 0 when the page is empty.
    pub fn start_index(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.offset() + 1
        }
    }

    pub fn end_index(&self) -> u64 {
        (self.offset() + self.per_page).min(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw page parameter. Never fails: anything that is not an integer
    /// selects page 1, integers below 1 clamp to the first page and integers past the
    /// end clamp to the last page.
    pub fn window(&self, total: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(value)) if value < 1 => 1,
            Some(Ok(value)) => (value as u64).min(num_pages),
            Some(Err(err)) if *err.kind() == IntErrorKind::PosOverflow => num_pages,
            Some(Err(_)) | None => 1,
        };

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page,
            total,
        }
    }
}
