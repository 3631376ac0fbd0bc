use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use messagely_db::{Database, is_unique_violation};
use messagely_types::models::{RegisteredUser, UserDetail, UserSummary};

use crate::convert;
use crate::error::{Error, Result};
use crate::password::Hasher;

/// Registration input. `password` is plaintext and only ever reaches the hasher.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Identity lifecycle and authentication decisions.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
    hasher: Hasher,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, hasher: Hasher) -> Self {
        Self { db, hasher }
    }

    /// Creates the user with `join_at == last_login_at == now`.
    /// A taken username fails with `Error::Conflict`.
    pub fn register(&self, new_user: NewUser) -> Result<RegisteredUser> {
        let password_hash = self.hasher.hash(&new_user.password)?;

        self.db
            .create_user(
                &new_user.username,
                &password_hash,
                &new_user.first_name,
                &new_user.last_name,
                &new_user.phone,
                Utc::now(),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Conflict(new_user.username.clone())
                } else {
                    Error::Store(e)
                }
            })?;

        info!("Registered user {}", new_user.username);

        Ok(RegisteredUser {
            username: new_user.username,
            password: password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
        })
    }

    /// Unknown username is `Error::NotFound`; a wrong password is `Ok(false)`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let stored = self
            .db
            .get_password_hash(username)?
            .ok_or_else(|| Error::NotFound(username.to_string()))?;

        let valid = self.hasher.verify(password, &stored)?;
        debug!("Authentication for {}: {}", username, if valid { "ok" } else { "rejected" });
        Ok(valid)
    }

    pub fn record_login(&self, username: &str) -> Result<()> {
        if !self.db.update_last_login(username, Utc::now())? {
            return Err(Error::NotFound(username.to_string()));
        }
        Ok(())
    }

    /// All users ordered by username; empty when nobody has registered.
    pub fn list(&self) -> Result<Vec<UserSummary>> {
        let rows = self.db.list_users()?;
        Ok(rows.into_iter().map(convert::summary).collect())
    }

    pub fn get(&self, username: &str) -> Result<UserDetail> {
        let row = self
            .db
            .get_user(username)?
            .ok_or_else(|| Error::NotFound(username.to_string()))?;

        convert::detail(row)
    }
}
