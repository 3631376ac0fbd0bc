#![allow(dead_code)]

use std::sync::Arc;

use messagely_core::{CredentialStore, HashConfig, Hasher, NewUser};
use messagely_db::Database;

/// Minimum Argon2 cost; keeps the suite fast.
pub fn cheap_hasher() -> Hasher {
    Hasher::new(HashConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

pub fn store() -> (Arc<Database>, CredentialStore) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let credentials = CredentialStore::new(db.clone(), cheap_hasher());
    (db, credentials)
}

pub fn new_user(username: &str, password: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: password.to_string(),
        first_name: format!("{}-first", username),
        last_name: format!("{}-last", username),
        phone: "555-0100".to_string(),
    }
}
