use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;

use crate::query::contains_ci;

pub const DB_FILE: &str = "students.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    init(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> anyhow::Result<()> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    register_functions(conn)?;

    // rowid is kept implicit: it is the insertion-order tiebreaker for
    // listings, so the table must not be WITHOUT ROWID.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            gender TEXT NOT NULL CHECK(gender IN ('M', 'F')),
            group_number TEXT NOT NULL,
            average_score REAL NOT NULL CHECK(average_score BETWEEN 0 AND 100)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_last_name ON students(last_name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_group ON students(group_number, last_name)",
        [],
    )?;
    Ok(())
}

/// `icontains(haystack, needle)`: Unicode case-insensitive literal substring
/// match. SQLite's own LIKE folds ASCII only.
fn register_functions(conn: &Connection) -> anyhow::Result<()> {
    conn.create_scalar_function(
        "icontains",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: Option<String> = ctx.get(1)?;
            Ok(match (haystack, needle) {
                (Some(h), Some(n)) => contains_ci(&h, &n),
                _ => false,
            })
        },
    )?;
    Ok(())
}
