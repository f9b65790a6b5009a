use tracing::{debug, warn};

use crate::error::ApiError;
use crate::model::{Student, StudentId, StudentInput};

use super::api::StudentsApi;
use super::sort::SortColumn;
use super::view::{Applied, FetchTicket, ListView};

/// Drives a [`ListView`]: every ticket a transition returns is fetched and
/// applied. Mutation failures are surfaced on the view and returned; no
/// operation is retried.
pub struct ListViewController<A> {
    api: A,
    view: ListView,
}

impl<A: StudentsApi> ListViewController<A> {
    pub fn new(api: A, page_size: u32) -> Self {
        Self {
            api,
            view: ListView::new(page_size),
        }
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn fetch(&mut self, ticket: FetchTicket) -> Applied {
        let result = self.api.list(ticket.request()).await;
        let applied = self.view.apply(&ticket, result);
        if applied == Applied::Stale {
            debug!(page = ticket.request().page(), "dropped stale page response");
        }
        applied
    }

    async fn fetch_opt(&mut self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.fetch(ticket).await;
        }
    }

    pub async fn mount(&mut self) {
        self.refresh_groups().await;
        let ticket = self.view.mount();
        self.fetch(ticket).await;
    }

    /// Group options for the filter. A failure keeps the previous list.
    pub async fn refresh_groups(&mut self) {
        match self.api.groups().await {
            Ok(groups) => self.view.set_groups(groups),
            Err(e) => warn!(error = %e, "failed to load groups"),
        }
    }

    pub async fn go_to_page(&mut self, page: u32) {
        let ticket = self.view.go_to_page(page);
        self.fetch_opt(ticket).await;
    }

    pub async fn select_filter(&mut self, group: Option<&str>) {
        let ticket = self.view.select_filter(group);
        self.fetch_opt(ticket).await;
    }

    pub async fn search(&mut self, term: Option<&str>) {
        let ticket = self.view.submit_search(term);
        self.fetch_opt(ticket).await;
    }

    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.view.toggle_sort(column);
    }

    pub async fn create(&mut self, input: StudentInput) -> Result<Student, ApiError> {
        self.view.begin_mutation();
        match self.api.create(input).await {
            Ok(student) => {
                self.refresh_groups().await;
                let ticket = self.view.after_create();
                self.fetch(ticket).await;
                Ok(student)
            }
            Err(e) => {
                self.view.fail(format!("failed to create student: {e}"));
                Err(e)
            }
        }
    }

    pub async fn update(
        &mut self,
        id: &StudentId,
        input: StudentInput,
    ) -> Result<Student, ApiError> {
        self.view.begin_mutation();
        match self.api.update(id, input).await {
            Ok(student) => {
                self.refresh_groups().await;
                let ticket = self.view.after_update();
                self.fetch(ticket).await;
                Ok(student)
            }
            Err(e) => {
                self.view.fail(format!("failed to update student: {e}"));
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: &StudentId) -> Result<Student, ApiError> {
        self.view.begin_mutation();
        match self.api.delete(id).await {
            Ok(student) => {
                self.refresh_groups().await;
                let ticket = self.view.after_delete(id);
                self.fetch(ticket).await;
                Ok(student)
            }
            Err(e) => {
                self.view.fail(format!("failed to delete student: {e}"));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use super::*;
    use crate::client::LoadStatus;
    use crate::query::{PageRequest, PageResult};
    use crate::store::SqliteStore;

    /// Store-backed API whose calls can be switched to fail.
    struct FlakyApi {
        store: SqliteStore,
        down: AtomicBool,
    }

    impl FlakyApi {
        fn new() -> Self {
            Self {
                store: SqliteStore::open_in_memory().expect("open"),
                down: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(ApiError::unavailable("store unreachable"));
            }
            Ok(())
        }
    }

    impl StudentsApi for FlakyApi {
        async fn list(&self, req: &PageRequest) -> Result<PageResult, ApiError> {
            self.check()?;
            self.store.list(req)
        }

        async fn groups(&self) -> Result<Vec<String>, ApiError> {
            self.check()?;
            self.store.groups()
        }

        async fn create(&self, input: StudentInput) -> Result<Student, ApiError> {
            self.check()?;
            self.store.create(input)
        }

        async fn update(&self, id: &StudentId, input: StudentInput) -> Result<Student, ApiError> {
            self.check()?;
            self.store.update(id, input)
        }

        async fn delete(&self, id: &StudentId) -> Result<Student, ApiError> {
            self.check()?;
            self.store.delete(id)
        }
    }

    fn input(last: &str, group: &str) -> StudentInput {
        StudentInput::from_json(&json!({
            "firstName": "Test",
            "lastName": last,
            "gender": "F",
            "groupNumber": group,
            "averageScore": 60
        }))
        .expect("valid input")
    }

    fn seed(store: &SqliteStore, count: usize) -> Vec<Student> {
        (0..count)
            .map(|i| store.create(input(&format!("L{i:02}"), "101")).expect("seed"))
            .collect()
    }

    #[tokio::test]
    async fn twenty_three_records_page_as_ten_ten_three() {
        let store = SqliteStore::open_in_memory().expect("open");
        seed(&store, 23);
        let mut ctl = ListViewController::new(store, 10);

        ctl.mount().await;
        assert_eq!(ctl.view().total_pages(), 3);
        assert_eq!(ctl.view().records().len(), 10);
        ctl.go_to_page(2).await;
        assert_eq!(ctl.view().records().len(), 10);
        ctl.go_to_page(3).await;
        assert_eq!(ctl.view().records().len(), 3);
        assert_eq!(ctl.view().rows()[0].number, 21);
    }

    #[tokio::test]
    async fn deleting_sole_record_on_last_page_moves_back() {
        let store = SqliteStore::open_in_memory().expect("open");
        seed(&store, 21);
        let mut ctl = ListViewController::new(store, 10);
        ctl.mount().await;
        ctl.go_to_page(3).await;
        let only = ctl.view().records()[0].id;

        ctl.delete(&only).await.expect("delete");
        assert_eq!(ctl.view().current_page(), 2);
        assert_eq!(ctl.view().records().len(), 10);
        assert_eq!(ctl.view().total_pages(), 2);
    }

    #[tokio::test]
    async fn create_resets_to_first_page() {
        let store = SqliteStore::open_in_memory().expect("open");
        seed(&store, 15);
        let mut ctl = ListViewController::new(store, 5);
        ctl.mount().await;
        ctl.go_to_page(3).await;

        let created = ctl.create(input("A-first", "202")).await.expect("create");
        assert_eq!(ctl.view().current_page(), 1);
        assert_eq!(ctl.view().records()[0].id, created.id);
        assert_eq!(ctl.view().total_items(), 16);
        assert_eq!(ctl.view().groups(), ["101", "202"]);
    }

    #[tokio::test]
    async fn update_may_move_record_off_the_page() {
        let store = SqliteStore::open_in_memory().expect("open");
        let seeded = seed(&store, 4);
        let mut ctl = ListViewController::new(store, 2);
        ctl.mount().await;
        let first = seeded[0].id;

        ctl.update(&first, input("Z-last", "101")).await.expect("update");
        assert_eq!(ctl.view().current_page(), 1);
        assert!(ctl.view().records().iter().all(|s| s.id != first));
    }

    #[tokio::test]
    async fn filter_selection_narrows_and_resets_page() {
        let store = SqliteStore::open_in_memory().expect("open");
        seed(&store, 12);
        store.create(input("Other", "303")).expect("create");
        let mut ctl = ListViewController::new(store, 5);
        ctl.mount().await;
        ctl.go_to_page(2).await;

        ctl.select_filter(Some("303")).await;
        assert_eq!(ctl.view().current_page(), 1);
        assert_eq!(ctl.view().total_items(), 1);
        assert!(ctl.view().records().iter().all(|s| s.group_number == "303"));

        ctl.select_filter(None).await;
        assert_eq!(ctl.view().total_items(), 13);
    }

    #[tokio::test]
    async fn failures_keep_rows_and_surface_one_message() {
        let api = FlakyApi::new();
        seed(&api.store, 3);
        let mut ctl = ListViewController::new(api, 10);
        ctl.mount().await;
        assert_eq!(ctl.view().records().len(), 3);

        ctl.api().down.store(true, Ordering::SeqCst);
        let err = ctl.create(input("New", "101")).await.expect_err("down");
        assert!(err.is_retryable());
        assert_eq!(
            ctl.view().status(),
            &LoadStatus::Failed("failed to create student: store unreachable".into())
        );
        assert_eq!(ctl.view().records().len(), 3);
        assert_eq!(ctl.view().groups(), ["101"]);

        ctl.api().down.store(false, Ordering::SeqCst);
        ctl.create(input("New", "101")).await.expect("create");
        assert_eq!(ctl.view().status(), &LoadStatus::Idle);
        assert_eq!(ctl.view().total_items(), 4);
    }
}
