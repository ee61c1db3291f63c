//! # vigil-client
//!
//! Authenticated HTTP session layer for the vigil console.
//!
//! - [`SessionGuard`] - credential injection and uniform response
//!   classification into [`RequestOutcome`] values
//! - [`CredentialStore`] - opaque bearer-token get/set/clear
//! - [`HttpHealthProbe`] - the `GET /health` probe driven by
//!   `vigil_sync::ConnectivityMonitor`
//! - [`api`] - thin endpoint helpers plus list-payload normalization

pub mod api;
pub mod credentials;
pub mod errors;
pub mod outcome;
pub mod probe;
pub mod session;

pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use errors::ClientError;
pub use outcome::RequestOutcome;
pub use probe::HttpHealthProbe;
pub use session::{SessionEvent, SessionGuard};
