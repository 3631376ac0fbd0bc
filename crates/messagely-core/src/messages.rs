use std::sync::Arc;

use tracing::debug;

use messagely_db::Database;
use messagely_types::models::{ReceivedMessage, SentMessage};

use crate::convert;
use crate::error::{Error, Result};

/// Read-only directional views over the messages table.
///
/// Both views check the identity first, so an unknown user is `NotFound`
/// while a known user without history gets an empty list. Results are in
/// `sent_at` order. A row that fails to parse fails the whole view with
/// `Error::Store`.
#[derive(Clone)]
pub struct MessageQueryService {
    db: Arc<Database>,
}

impl MessageQueryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>> {
        self.ensure_user(username)?;

        let rows = self.db.get_messages_from(username)?;
        debug!("{} sent {} messages", username, rows.len());
        rows.into_iter().map(convert::sent).collect()
    }

    pub fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>> {
        self.ensure_user(username)?;

        let rows = self.db.get_messages_to(username)?;
        debug!("{} received {} messages", username, rows.len());
        rows.into_iter().map(convert::received).collect()
    }

    fn ensure_user(&self, username: &str) -> Result<()> {
        if self.db.user_exists(username)? {
            Ok(())
        } else {
            Err(Error::NotFound(username.to_string()))
        }
    }
}
