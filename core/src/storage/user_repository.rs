use crate::models::{datetime_to_timestamp, timestamp_to_datetime, User};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub struct UserRepository;

impl UserRepository {
    /// Insert a user, or refresh the username of an existing id
    pub fn upsert(conn: &Connection, user: &User) -> Result<()> {
        conn.execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username",
            params![user.id, user.username, datetime_to_timestamp(&user.created_at)],
        )?;
        Ok(())
    }

    /// Make sure `user` is stored under its current username, writing only
    /// when the row is missing or the name changed. Returns whether it wrote.
    pub fn sync(conn: &Connection, user: &User) -> Result<bool> {
        let stored: Option<String> = conn
            .query_row("SELECT username FROM users WHERE id = ?1", params![user.id], |row| row.get(0))
            .optional()?;
        if stored.as_deref() == Some(user.username.as_str()) {
            return Ok(false);
        }

        Self::upsert(conn, user)?;
        Ok(true)
    }

    /// Get a user by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<User> {
        conn.query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: timestamp_to_datetime(row.get(2)?),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
    }

    /// Get a user by username
    pub fn get_by_username(conn: &Connection, username: &str) -> Result<User> {
        conn.query_row(
            "SELECT id, username, created_at FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: timestamp_to_datetime(row.get(2)?),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use std::time::Duration;
    use tempfile::tempdir;

    fn setup_test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db"));
        let conn = db.create().unwrap();
        (dir, conn)
    }

    #[test]
    fn test_upsert_and_lookup() {
        let (_dir, conn) = setup_test_db();
        UserRepository::upsert(&conn, &User::new(42, "hikari".to_string())).unwrap();

        assert_eq!(UserRepository::get_by_id(&conn, 42).unwrap().username, "hikari");
        assert_eq!(UserRepository::get_by_username(&conn, "hikari").unwrap().id, 42);
    }

    #[test]
    fn test_sync_writes_only_changes() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db")).with_busy_timeout(Duration::from_millis(50));
        let conn = db.create().unwrap();
        let user = User::new(42, "hikari".to_string());

        assert!(UserRepository::sync(&conn, &user).unwrap());
        assert!(!UserRepository::sync(&conn, &user).unwrap());

        // An unchanged user does not need the write lock another connection holds
        let mut writer = db.connect().unwrap();
        let tx = crate::write_transaction(&mut writer).unwrap();
        assert!(!UserRepository::sync(&conn, &user).unwrap());
        let renamed = User::new(42, "hikari_2".to_string());
        assert!(UserRepository::sync(&conn, &renamed).unwrap_err().is_transient());
        drop(tx);

        assert!(UserRepository::sync(&conn, &renamed).unwrap());
        assert_eq!(UserRepository::get_by_id(&conn, 42).unwrap().username, "hikari_2");
    }

    #[test]
    fn test_upsert_renames() {
        let (_dir, conn) = setup_test_db();
        UserRepository::upsert(&conn, &User::new(42, "hikari".to_string())).unwrap();
        UserRepository::upsert(&conn, &User::new(42, "hikari_2".to_string())).unwrap();

        assert_eq!(UserRepository::get_by_id(&conn, 42).unwrap().username, "hikari_2");
        assert!(matches!(
            UserRepository::get_by_username(&conn, "hikari"),
            Err(Error::NotFound(_))
        ));
    }
}
