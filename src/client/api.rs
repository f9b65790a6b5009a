use crate::error::ApiError;
use crate::model::{Student, StudentId, StudentInput};
use crate::query::{PageRequest, PageResult};
use crate::store::SqliteStore;

/// The operations the list view needs from the service.
#[allow(async_fn_in_trait)]
pub trait StudentsApi {
    async fn list(&self, req: &PageRequest) -> Result<PageResult, ApiError>;
    async fn groups(&self) -> Result<Vec<String>, ApiError>;
    async fn create(&self, input: StudentInput) -> Result<Student, ApiError>;
    async fn update(&self, id: &StudentId, input: StudentInput) -> Result<Student, ApiError>;
    async fn delete(&self, id: &StudentId) -> Result<Student, ApiError>;
}

/// In-process access, for embedding the view next to the store.
impl StudentsApi for SqliteStore {
    async fn list(&self, req: &PageRequest) -> Result<PageResult, ApiError> {
        SqliteStore::list(self, req)
    }

    async fn groups(&self) -> Result<Vec<String>, ApiError> {
        SqliteStore::groups(self)
    }

    async fn create(&self, input: StudentInput) -> Result<Student, ApiError> {
        SqliteStore::create(self, input)
    }

    async fn update(&self, id: &StudentId, input: StudentInput) -> Result<Student, ApiError> {
        SqliteStore::update(self, id, input)
    }

    async fn delete(&self, id: &StudentId) -> Result<Student, ApiError> {
        SqliteStore::delete(self, id)
    }
}
