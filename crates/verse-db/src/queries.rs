use crate::Database;
use crate::models::{MessageRow, UserRow};
use crate::store::{Result, Store, StoreError};
use rusqlite::{Connection, ErrorCode, Row};

impl Store for Database {
    // -- Users --

    fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, profile_picture, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.password,
                    user.profile_picture,
                    user.created_at
                ],
            )
            .map_err(map_unique_email)?;
            Ok(())
        })
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    fn set_profile_picture(&self, id: &str, picture: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET profile_picture = ?1 WHERE id = ?2",
                (picture, id),
            )?;
            Ok(changed > 0)
        })
    }

    fn set_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                (password_hash, id),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Messages --

    fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender, receiver, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    message.id,
                    message.sender,
                    message.receiver,
                    message.text,
                    message.created_at
                ],
            )
            .map_err(map_unknown_user)?;
            Ok(())
        })
    }

    fn get_conversation(&self, a: &str, b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_conversation(conn, a, b))
    }
}

/// `column` is always one of our own literals, never caller input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, profile_picture, created_at FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], user_from_row).optional()?;

    Ok(row)
}

fn query_conversation(conn: &Connection, a: &str, b: &str) -> Result<Vec<MessageRow>> {
    // rowid breaks ties between messages stamped in the same microsecond
    let mut stmt = conn.prepare(
        "SELECT id, sender, receiver, text, created_at
         FROM messages
         WHERE (sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1)
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt
        .query_map([a, b], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                sender: row.get(1)?,
                receiver: row.get(2)?,
                text: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        profile_picture: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_unique_email(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains("users.email") =>
        {
            StoreError::DuplicateEmail
        }
        _ => StoreError::Sqlite(err),
    }
}

fn map_unknown_user(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StoreError::UnknownUser
        }
        _ => StoreError::Sqlite(err),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_lookup() {
        conformance::create_and_lookup(&db());
    }

    #[test]
    fn duplicate_email_conflicts() {
        conformance::duplicate_email_conflicts(&db());
    }

    #[test]
    fn updates_profile_fields() {
        conformance::updates_profile_fields(&db());
    }

    #[test]
    fn conversation_is_bidirectional_and_ordered() {
        conformance::conversation_is_bidirectional_and_ordered(&db());
    }

    #[test]
    fn same_instant_keeps_insertion_order() {
        conformance::same_instant_keeps_insertion_order(&db());
    }

    #[test]
    fn message_requires_both_users() {
        conformance::message_requires_both_users(&db());
    }

    #[test]
    fn file_database_reads_through_reader_pool() {
        let path = std::env::temp_dir().join(format!(
            "verse-db-test-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let db = Database::open(&path).unwrap();
            db.create_user(&conformance::user("u1", "a@x.com")).unwrap();
            // More lookups than readers so the round-robin wraps
            for _ in 0..(crate::READER_POOL_SIZE * 2) {
                assert!(db.get_user_by_email("a@x.com").unwrap().is_some());
            }
        }

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
