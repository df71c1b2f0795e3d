//! Session management.
//!
//! This module provides `SessionManager`, the single writer of the session
//! store. It derives a read-optimized `AuthSnapshot` from the store,
//! broadcasts it over a watch channel on every mutation, and owns the
//! redirect side of authentication: logout, post-login redirect, and the
//! session-expiry path shared with the API client.

pub mod session;

pub use session::{AuthSnapshot, SessionManager};
