//! Client core for a trading terminal.
//!
//! This crate owns the session-guarding logic shared by any front-end
//! built on it:
//!
//! - `store`: persistent key/value session store (token, identity,
//!   last-visited path) with file-backed and in-memory implementations
//! - `auth`: the session manager, the store's single writer, exposing a
//!   derived login snapshot over a watch channel
//! - `routes` / `guard`: the protected/public path partition and the
//!   router guard evaluated on every transition
//! - `api`: the enveloped REST client that attaches the bearer token and
//!   drives session expiry on authorization failure
//! - `notify`: the channel carrying user-visible notices to the UI layer
//!
//! The UI itself (screens, rendering, the real router) lives above this
//! crate and plugs in via the `Navigator` trait and the notice channel.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod nav;
pub mod notify;
pub mod routes;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthSnapshot, SessionManager};
pub use config::Config;
pub use guard::{GuardOutcome, NavigationGuard};
pub use nav::{HistoryNavigator, Navigator};
pub use notify::{notice_channel, Notice, NoticeLevel, NoticeSender};
pub use routes::{RouteClass, RouteTable};
pub use store::{FileStore, MemoryStore, SessionStore};
