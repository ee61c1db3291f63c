//! Opaque bearer-token storage.
//!
//! The session layer only ever reads and clears the token; how it is
//! persisted (keychain, file, browser storage in the original console) is
//! the host's business, behind this trait.

use std::sync::{Mutex, PoisonError};

/// Opaque credential get/set/clear.
///
/// An absent credential is a valid state: unauthenticated calls go out
/// without an Authorization header and the service rejects them, which
/// surfaces as `AuthExpired` like any other session loss.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

/// Process-local in-memory store, the default for the CLI.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
