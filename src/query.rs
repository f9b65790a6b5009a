//! Page requests and pagination metadata shared by the server query path and
//! the list view client.
//!
//! Ordering contract: matching records are ordered by last name in byte order
//! of the UTF-8 text, ties broken by insertion order. Page boundaries depend on
//! this, so the SQL in `store` and any in-memory reference must agree on it.

use serde::{Deserialize, Serialize};

use crate::model::Student;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub limit: u32,
    /// Upper bound on the page size. `None` leaves it unbounded.
    pub max_limit: Option<u32>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

/// Untrusted list parameters, as received in a query string or an IPC params
/// object. Numbers stay textual so malformed values can fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub group_number: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    /// Builds params from decoded query-string pairs. A repeated key keeps its
    /// last value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "groupNumber" => &mut params.group_number,
                "search" => &mut params.search,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }

    pub fn from_json(params: &serde_json::Value) -> Self {
        let field = |key: &str| match params.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            page: field("page"),
            limit: field("limit"),
            group_number: field("groupNumber"),
            search: field("search"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
    group: Option<String>,
    search: Option<String>,
}

impl PageRequest {
    /// Page and limit are clamped to at least 1.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            group: None,
            search: None,
        }
    }

    /// An empty or blank group means no group filter. Otherwise the label is
    /// matched exactly, surrounding whitespace included.
    pub fn with_group(mut self, group: Option<&str>) -> Self {
        self.group = group
            .filter(|g| !g.trim().is_empty())
            .map(str::to_string);
        self
    }

    /// An empty or blank term means no search.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = non_blank(search);
        self
    }

    pub fn from_params(params: &ListParams, defaults: &QueryDefaults) -> Self {
        let page = match parse_int(params.page.as_deref()) {
            Some(n) if n >= 1 => clamp_u32(n),
            _ => DEFAULT_PAGE,
        };
        let mut limit = match parse_int(params.limit.as_deref()) {
            None | Some(0) => defaults.limit,
            Some(n) if n < 0 => 1,
            Some(n) => clamp_u32(n),
        };
        if let Some(max) = defaults.max_limit {
            limit = limit.min(max);
        }
        Self::new(page, limit)
            .with_group(params.group_number.as_deref())
            .with_search(params.search.as_deref())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Number of matching records before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// The group AND search predicate, evaluated in memory.
    pub fn matches(&self, student: &Student) -> bool {
        if let Some(group) = self.group() {
            if student.group_number != group {
                return false;
            }
        }
        match self.search() {
            None => true,
            Some(term) => {
                contains_ci(&student.first_name, term)
                    || contains_ci(&student.last_name, term)
                    || contains_ci(&student.group_number, term)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, req: &PageRequest) -> Self {
        Self {
            total,
            page: req.page(),
            limit: req.limit(),
            pages: total.div_ceil(u64::from(req.limit())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub students: Vec<Student>,
    pub pagination: Pagination,
}

/// Unicode case-insensitive substring test. The needle is literal text.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

fn clamp_u32(n: i64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
