use crate::error::ApiError;
use crate::model::{Student, StudentId};
use crate::query::{PageRequest, PageResult};

use super::pager::{self, PageLink, RangeCaption};
use super::sort::{SortColumn, SortState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    /// The last operation failed; previously loaded rows are still shown.
    Failed(String),
}

/// A page request issued by a view transition. Only the most recently issued
/// ticket may update the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: PageRequest,
}

impl FetchTicket {
    pub fn request(&self) -> &PageRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    /// A newer request was issued since; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    pub number: u64,
    pub student: &'a Student,
}

#[derive(Debug, Clone)]
pub struct ListView {
    current_page: u32,
    page_size: u32,
    filter: Option<String>,
    search: Option<String>,
    records: Vec<Student>,
    total_pages: u64,
    total_items: u64,
    groups: Vec<String>,
    sort: SortState,
    status: LoadStatus,
    latest_seq: u64,
}

impl ListView {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            filter: None,
            search: None,
            records: Vec::new(),
            total_pages: 0,
            total_items: 0,
            groups: Vec::new(),
            sort: SortState::default(),
            status: LoadStatus::Idle,
            latest_seq: 0,
        }
    }

    /// The request the current parameters describe.
    pub fn query(&self) -> PageRequest {
        PageRequest::new(self.current_page, self.page_size)
            .with_group(self.filter.as_deref())
            .with_search(self.search.as_deref())
    }

    fn issue(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.status = LoadStatus::Loading;
        FetchTicket {
            seq: self.latest_seq,
            request: self.query(),
        }
    }

    pub fn mount(&mut self) -> FetchTicket {
        self.issue()
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<FetchTicket> {
        let page = page.max(1);
        if page == self.current_page {
            return None;
        }
        self.current_page = page;
        Some(self.issue())
    }

    /// Changing the group filter always lands on page 1.
    pub fn select_filter(&mut self, group: Option<&str>) -> Option<FetchTicket> {
        let group = group
            .filter(|g| !g.trim().is_empty())
            .map(str::to_string);
        if group == self.filter && self.current_page == 1 {
            return None;
        }
        self.filter = group;
        self.current_page = 1;
        Some(self.issue())
    }

    pub fn submit_search(&mut self, term: Option<&str>) -> Option<FetchTicket> {
        let term = non_blank(term);
        if term == self.search && self.current_page == 1 {
            return None;
        }
        self.search = term;
        self.current_page = 1;
        Some(self.issue())
    }

    pub fn begin_mutation(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// Where a new record lands is unknown without re-sorting, so go to page 1.
    pub fn after_create(&mut self) -> FetchTicket {
        self.current_page = 1;
        self.issue()
    }

    /// The record may leave the page if its sort position changed.
    pub fn after_update(&mut self) -> FetchTicket {
        self.issue()
    }

    /// Steps back a page when the deleted record was the only one shown, so
    /// the view never lands on an empty trailing page.
    pub fn after_delete(&mut self, deleted: &StudentId) -> FetchTicket {
        let was_only_row = self.records.len() == 1 && self.records[0].id == *deleted;
        if was_only_row && self.current_page > 1 {
            self.current_page -= 1;
        }
        self.issue()
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = LoadStatus::Failed(message.into());
    }

    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<PageResult, ApiError>) -> Applied {
        if ticket.seq != self.latest_seq {
            return Applied::Stale;
        }
        match result {
            Ok(page) => {
                self.records = page.students;
                self.total_pages = page.pagination.pages;
                self.total_items = page.pagination.total;
                self.status = LoadStatus::Idle;
            }
            Err(e) => self.fail(format!("failed to load students: {e}")),
        }
        Applied::Current
    }

    pub fn set_groups(&mut self, groups: Vec<String>) {
        self.groups = groups;
    }

    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort.select(column);
    }

    /// Loaded records in local sort order. Numbers follow the displayed order
    /// and continue from the previous pages.
    pub fn rows(&self) -> Vec<Row<'_>> {
        let mut sorted: Vec<&Student> = self.records.iter().collect();
        self.sort.sort(&mut sorted);
        let base = u64::from(self.current_page - 1) * u64::from(self.page_size);
        sorted
            .into_iter()
            .zip(1u64..)
            .map(|(student, pos)| Row {
                number: base + pos,
                student,
            })
            .collect()
    }

    pub fn page_links(&self) -> Vec<PageLink> {
        pager::page_window(u64::from(self.current_page), self.total_pages)
    }

    /// Whether the pager's previous button is enabled.
    pub fn has_previous(&self) -> bool {
        pager::has_previous(u64::from(self.current_page))
    }

    /// Whether the pager's next button is enabled.
    pub fn has_next(&self) -> bool {
        pager::has_next(u64::from(self.current_page), self.total_pages)
    }

    pub fn caption(&self) -> RangeCaption {
        RangeCaption::new(
            u64::from(self.current_page),
            u64::from(self.page_size),
            self.total_items,
        )
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Records in server order.
    pub fn records(&self) -> &[Student] {
        &self.records
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
