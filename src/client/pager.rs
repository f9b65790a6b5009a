//! Pager widget model: numbered page buttons and the "showing x–y" caption.

use std::fmt;

/// Numbered buttons shown at once, not counting first/last and gaps.
pub const MAX_PAGE_BUTTONS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u64),
    Gap,
}

/// A window of page numbers around `current`, with the first and last page
/// kept reachable and gaps where pages are skipped.
pub fn page_window(current: u64, total_pages: u64) -> Vec<PageLink> {
    if total_pages <= MAX_PAGE_BUTTONS {
        return (1..=total_pages).map(PageLink::Page).collect();
    }

    let mut start = current.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let mut end = start + MAX_PAGE_BUTTONS - 1;
    if end > total_pages {
        end = total_pages;
        start = (end + 1).saturating_sub(MAX_PAGE_BUTTONS).max(1);
    }

    let mut links = Vec::new();
    if start > 1 {
        links.push(PageLink::Page(1));
        if start > 2 {
            links.push(PageLink::Gap);
        }
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < total_pages {
        if end < total_pages - 1 {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::Page(total_pages));
    }
    links
}

pub fn has_previous(current: u64) -> bool {
    current > 1
}

pub fn has_next(current: u64, total_pages: u64) -> bool {
    current < total_pages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCaption {
    pub from: u64,
    pub to: u64,
    pub total: u64,
}

impl RangeCaption {
    /// 1-based bounds of the rows on `current`; both zero when nothing matches.
    pub fn new(current: u64, page_size: u64, total: u64) -> Self {
        let first = current.saturating_sub(1).saturating_mul(page_size);
        if total == 0 || first >= total {
            return Self {
                from: 0,
                to: 0,
                total,
            };
        }
        Self {
            from: first + 1,
            to: current.saturating_mul(page_size).min(total),
            total,
        }
    }
}

impl fmt::Display for RangeCaption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "showing {}–{} of {}", self.from, self.to, self.total)
    }
}
