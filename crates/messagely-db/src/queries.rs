use crate::Database;
use crate::models::{MessageViewRow, ProfileRow, UserRow};
use crate::timestamp;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

const MESSAGES_FROM_SQL: &str = "
    SELECT m.id, u.username, u.first_name, u.last_name, u.phone, m.body, m.sent_at, m.read_at
    FROM messages m
    JOIN users u ON m.to_username = u.username
    WHERE m.from_username = ?1
    ORDER BY m.sent_at ASC, m.rowid ASC";

const MESSAGES_TO_SQL: &str = "
    SELECT m.id, u.username, u.first_name, u.last_name, u.phone, m.body, m.sent_at, m.read_at
    FROM messages m
    JOIN users u ON m.from_username = u.username
    WHERE m.to_username = ?1
    ORDER BY m.sent_at ASC, m.rowid ASC";

impl Database {
    // -- Users --

    /// Inserts a user with `join_at` and `last_login_at` both set to `now`.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = timestamp::format(now);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![username, password_hash, first_name, last_name, phone, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT password FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Returns false when no such user exists.
    pub fn update_last_login(&self, username: &str, now: DateTime<Utc>) -> Result<bool> {
        let now = timestamp::format(now);
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET last_login_at = ?1 WHERE username = ?2",
                [now.as_str(), username],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn list_users(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, first_name, last_name, phone FROM users ORDER BY username",
            )?;

            let rows = stmt
                .query_map([], |row| profile_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: Uuid,
        from_username: &str,
        to_username: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let id = id.to_string();
        let sent_at = timestamp::format(sent_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, from_username, to_username, body, sent_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, from_username, to_username, body, sent_at],
            )?;
            Ok(())
        })
    }

    /// Messages sent by `username`, each joined with its recipient.
    pub fn get_messages_from(&self, username: &str) -> Result<Vec<MessageViewRow>> {
        self.with_conn(|conn| query_message_views(conn, MESSAGES_FROM_SQL, username))
    }

    /// Messages received by `username`, each joined with its sender.
    pub fn get_messages_to(&self, username: &str) -> Result<Vec<MessageViewRow>> {
        self.with_conn(|conn| query_message_views(conn, MESSAGES_TO_SQL, username))
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, join_at, last_login_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                join_at: row.get(5)?,
                last_login_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_views(conn: &Connection, sql: &str, username: &str) -> Result<Vec<MessageViewRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(MessageViewRow {
                id: row.get(0)?,
                counterpart: profile_at(row, 1)?,
                body: row.get(5)?,
                sent_at: row.get(6)?,
                read_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Reads username, first_name, last_name, phone starting at column `start`.
fn profile_at(row: &Row<'_>, start: usize) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        username: row.get(start)?,
        first_name: row.get(start + 1)?,
        last_name: row.get(start + 2)?,
        phone: row.get(start + 3)?,
    })
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
    use crate::is_unique_violation;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash-a", "Alice", "Anders", "555-0100", at(0)).unwrap();
        db.create_user("bob", "hash-b", "Bob", "Baker", "555-0200", at(0)).unwrap();
        db
    }

    #[test]
    fn duplicate_username_is_a_unique_violation() {
        let db = seeded();
        let err = db.create_user("alice", "x", "A", "B", "1", at(0)).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn message_to_unknown_user_is_rejected_but_not_as_duplicate() {
        let db = seeded();
        let err = db
            .insert_message(Uuid::new_v4(), "alice", "nobody", "hello?", at(1))
            .unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn update_last_login_reports_missing_user() {
        let db = seeded();
        let later = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert!(db.update_last_login("alice", later).unwrap());
        assert!(!db.update_last_login("carol", later).unwrap());

        let alice = db.get_user("alice").unwrap().unwrap();
        assert_eq!(alice.last_login_at, "2024-05-02T00:00:00.000000Z");
        assert_eq!(alice.join_at, "2024-05-01T10:00:00.000000Z");
    }

    #[test]
    fn writes_store_ids_and_times_in_canonical_form() {
        let db = seeded();
        let id = Uuid::new_v4();
        db.insert_message(id, "alice", "bob", "hi", at(7)).unwrap();

        let sent = db.get_messages_from("alice").unwrap();
        assert_eq!(sent[0].id, id.to_string());
        assert_eq!(sent[0].sent_at, "2024-05-01T10:00:07.000000Z");
    }

    #[test]
    fn message_views_join_the_other_party_in_send_order() {
        let db = seeded();
        db.insert_message(Uuid::new_v4(), "alice", "bob", "second", at(2)).unwrap();
        db.insert_message(Uuid::new_v4(), "alice", "bob", "first", at(1)).unwrap();
        let reply = Uuid::new_v4();
        db.insert_message(reply, "bob", "alice", "reply", at(3)).unwrap();

        let sent = db.get_messages_from("alice").unwrap();
        let bodies: Vec<&str> = sent.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
        assert!(sent.iter().all(|m| m.counterpart.username == "bob"));
        assert_eq!(sent[0].counterpart.first_name, "Bob");

        let received = db.get_messages_to("alice").unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, reply.to_string());
        assert_eq!(received[0].counterpart.username, "bob");
        assert!(received[0].read_at.is_none());
    }

    #[test]
    fn file_backed_reads_see_committed_writes() {
        let dir = std::env::temp_dir().join(format!("messagely_db_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_user("dana", "hash", "Dana", "Diaz", "555-0300", at(0)).unwrap();

            // Cycle through every reader connection.
            for _ in 0..8 {
                assert!(db.user_exists("dana").unwrap());
            }
            assert_eq!(db.list_users().unwrap().len(), 1);
        }

        // Reopening must not rerun the initial migration.
        let db = Database::open(&path).unwrap();
        assert!(db.user_exists("dana").unwrap());

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
