//! Student records service: a paginated, filterable student list served over
//! HTTP or a stdio JSON protocol, plus the list view controller that consumes
//! it.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod ipc;
pub mod model;
pub mod query;
pub mod store;
