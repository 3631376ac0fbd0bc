//! User and messaging domain layer.
//!
//! `CredentialStore` owns registration, password verification and profile
//! lookups. `MessageQueryService` builds the directional message views.
//! Both take an injected `Arc<Database>`; neither keeps other state.

mod convert;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod password;

pub use credentials::{CredentialStore, NewUser};
pub use error::{Error, Result};
pub use messages::MessageQueryService;
pub use password::{HashConfig, Hasher};
