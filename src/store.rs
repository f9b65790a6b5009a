use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::db;
use crate::error::ApiError;
use crate::model::{Gender, Student, StudentId, StudentInput};
use crate::query::{PageRequest, PageResult, Pagination};

const STUDENT_COLUMNS: &str =
    "id, first_name, last_name, gender, group_number, average_score";

// ?1 = group filter, ?2 = search term; NULL disables each clause.
const MATCH_CLAUSE: &str = "(?1 IS NULL OR group_number = ?1)
     AND (?2 IS NULL
          OR icontains(first_name, ?2)
          OR icontains(last_name, ?2)
          OR icontains(group_number, ?2))";

/// SQLite-backed record store. One connection, serialized behind a mutex;
/// every operation touches a single record or runs read-only.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_db(workspace)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.conn.lock().map_err(|_| {
            warn!("student store lock poisoned");
            ApiError::unavailable("student store is unavailable")
        })
    }

    /// Count and page run under one lock so the metadata describes the rows.
    pub fn list(&self, req: &PageRequest) -> Result<PageResult, ApiError> {
        let conn = self.conn()?;
        let filter = (req.group(), req.search());

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM students WHERE {MATCH_CLAUSE}"),
                filter,
                |r| r.get(0),
            )
            .map_err(|e| ApiError::db("db_query_failed", e))?;

        let offset = i64::try_from(req.offset()).unwrap_or(i64::MAX);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {STUDENT_COLUMNS}
                 FROM students
                 WHERE {MATCH_CLAUSE}
                 ORDER BY last_name COLLATE BINARY, rowid
                 LIMIT ?3 OFFSET ?4"
            ))
            .map_err(|e| ApiError::db("db_query_failed", e))?;
        let students = stmt
            .query_map(
                (filter.0, filter.1, i64::from(req.limit()), offset),
                student_from_row,
            )
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(|e| ApiError::db("db_query_failed", e))?;

        let total = u64::try_from(total).unwrap_or(0);
        debug!(
            page = req.page(),
            limit = req.limit(),
            group = req.group(),
            search = req.search(),
            total,
            returned = students.len(),
            "students.list"
        );
        Ok(PageResult {
            students,
            pagination: Pagination::new(total, req),
        })
    }

    /// Distinct group labels in byte order.
    pub fn groups(&self) -> Result<Vec<String>, ApiError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT group_number FROM students ORDER BY group_number")
            .map_err(|e| ApiError::db("db_query_failed", e))?;
        stmt.query_map([], |r| r.get(0))
            .and_then(|it| it.collect::<Result<Vec<String>, _>>())
            .map_err(|e| ApiError::db("db_query_failed", e))
    }

    pub fn get(&self, id: &StudentId) -> Result<Student, ApiError> {
        let conn = self.conn()?;
        find(&conn, id)?.ok_or(ApiError::NotFound("student"))
    }

    pub fn create(&self, input: StudentInput) -> Result<Student, ApiError> {
        let conn = self.conn()?;
        let student = input.into_student(StudentId::generate());
        conn.execute(
            &format!("INSERT INTO students({STUDENT_COLUMNS}) VALUES(?, ?, ?, ?, ?, ?)"),
            (
                student.id.to_string(),
                &student.first_name,
                &student.last_name,
                student.gender.as_str(),
                &student.group_number,
                student.average_score,
            ),
        )
        .map_err(|e| ApiError::db("db_insert_failed", e))?;
        Ok(student)
    }

    /// Full replacement of every field; the identifier is kept.
    pub fn update(&self, id: &StudentId, input: StudentInput) -> Result<Student, ApiError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE students
                 SET first_name = ?, last_name = ?, gender = ?, group_number = ?, average_score = ?
                 WHERE id = ?",
                (
                    &input.first_name,
                    &input.last_name,
                    input.gender.as_str(),
                    &input.group_number,
                    input.average_score,
                    id.to_string(),
                ),
            )
            .map_err(|e| ApiError::db("db_update_failed", e))?;
        if changed == 0 {
            return Err(ApiError::NotFound("student"));
        }
        Ok(input.into_student(*id))
    }

    /// Removes the record and returns it as it was.
    pub fn delete(&self, id: &StudentId) -> Result<Student, ApiError> {
        let conn = self.conn()?;
        let Some(existing) = find(&conn, id)? else {
            return Err(ApiError::NotFound("student"));
        };
        let changed = conn
            .execute("DELETE FROM students WHERE id = ?", [id.to_string()])
            .map_err(|e| ApiError::db("db_delete_failed", e))?;
        if changed == 0 {
            return Err(ApiError::NotFound("student"));
        }
        Ok(existing)
    }
}

fn find(conn: &Connection, id: &StudentId) -> Result<Option<Student>, ApiError> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"),
        [id.to_string()],
        student_from_row,
    )
    .optional()
    .map_err(|e| ApiError::db("db_query_failed", e))
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    let id: String = row.get(0)?;
    let gender: String = row.get(3)?;
    let id = StudentId::parse(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let gender = Gender::parse(&gender).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown gender {gender:?}").into(),
        )
    })?;
    Ok(Student {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender,
        group_number: row.get(4)?,
        average_score: row.get(5)?,
    })
}
