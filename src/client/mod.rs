//! List view controller: the client half of the paging contract.
//!
//! [`ListView`] is the explicit view state and its transitions; every
//! transition that changes the query hands back a [`FetchTicket`].
//! [`ListViewController`] is the effect that runs those tickets against a
//! [`StudentsApi`] and feeds the responses back. [`HttpStudentsApi`] is the
//! REST transport; `SqliteStore` also implements the trait in-process.

mod api;
mod controller;
pub mod pager;
mod rest;
pub mod sort;
mod view;

pub use api::StudentsApi;
pub use controller::ListViewController;
pub use rest::HttpStudentsApi;
pub use view::{Applied, FetchTicket, ListView, LoadStatus, Row};
