use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::nav::Navigator;
use crate::notify::NoticeSender;
use crate::routes::{normalize_path, RouteTable, LOGIN_PATH, ROOT_PATH};
use crate::store::{keys, SessionStore};

/// Derived view of the session store: who is logged in, if anyone.
///
/// This is never mutated in place. The manager recomputes it on every
/// store mutation and publishes it whole, so observers can never see the
/// identity fields half-populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub logged_in: bool,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

impl AuthSnapshot {
    fn logged_in(user_id: String, username: String) -> Self {
        Self {
            logged_in: true,
            user_id: Some(user_id),
            username: Some(username),
        }
    }
}

/// Manages login state and user info on top of the session store.
///
/// All operations are synchronous and idempotent under repetition; two
/// racing expiry paths both land in the same logged-out state.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notices: NoticeSender,
    routes: RouteTable,
    state_tx: watch::Sender<AuthSnapshot>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        notices: NoticeSender,
        routes: RouteTable,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthSnapshot::default());
        Self {
            store,
            navigator,
            notices,
            routes,
            state_tx,
        }
    }

    // =========================================================================
    // Derived state
    // =========================================================================

    /// Current derived state.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state_tx.borrow().logged_in
    }

    /// Subscribe to state changes. The receiver always starts with the
    /// current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state_tx.subscribe()
    }

    /// Bearer token, read from the store at call time so in-flight state
    /// never goes stale.
    pub fn token(&self) -> Option<String> {
        self.store.get(keys::TOKEN).filter(|t| !t.is_empty())
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore login state from the store, e.g. at application start.
    /// Missing data is a valid logged-out state, not an error.
    pub fn initialize(&self) {
        let token = self.store.get(keys::TOKEN);
        let user_id = self.store.get(keys::USER_ID);
        let username = self.store.get(keys::USERNAME);

        let snapshot = match (token, user_id, username) {
            (Some(t), Some(id), Some(name))
                if !t.is_empty() && !id.is_empty() && !name.is_empty() =>
            {
                AuthSnapshot::logged_in(id, name)
            }
            _ => AuthSnapshot::default(),
        };

        debug!(logged_in = snapshot.logged_in, "Session initialized");
        self.state_tx.send_replace(snapshot);
    }

    /// Persist a successful login. All three values are required; the store
    /// is written before the derived state so a reader woken by the state
    /// change already sees the token.
    pub fn set_login_info(&self, token: &str, user_id: &str, username: &str) -> Result<()> {
        if token.is_empty() || user_id.is_empty() || username.is_empty() {
            anyhow::bail!("token, user id, and username are all required");
        }

        self.store.set(keys::TOKEN, token)?;
        self.store.set(keys::USER_ID, user_id)?;
        self.store.set(keys::USERNAME, username)?;

        self.state_tx
            .send_replace(AuthSnapshot::logged_in(user_id.to_string(), username.to_string()));
        info!(username, "Logged in");
        Ok(())
    }

    /// Remove all session data. Safe to call when already logged out.
    /// Store IO failures are logged, not raised: the in-memory state must
    /// reach logged-out regardless.
    pub fn clear_login_info(&self) {
        for key in [
            keys::TOKEN,
            keys::USER_ID,
            keys::USERNAME,
            keys::LAST_VISITED_PATH,
        ] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
        self.state_tx.send_replace(AuthSnapshot::default());
    }

    /// Clear the session and return to the login page.
    pub fn logout(&self) {
        self.clear_login_info();
        self.navigator.push(LOGIN_PATH);
        info!("Logged out");
    }

    /// The shared unauthorized path: clear the session, tell the user, and
    /// go to login unless already there (prevents a redirect loop when the
    /// login call itself comes back 401).
    pub fn expire_session(&self) {
        self.clear_login_info();
        self.notices.error("Session expired, please log in again");
        if !self.routes.is_login(&self.navigator.current_path()) {
            self.navigator.push(LOGIN_PATH);
        }
    }

    // =========================================================================
    // Post-login redirect
    // =========================================================================

    /// Record `path` as the post-login target. The login and register pages
    /// are never valid targets and are silently skipped.
    pub fn save_last_visited_path(&self, path: &str) {
        if self.routes.is_auth_page(path) {
            return;
        }
        let path = normalize_path(path);
        if let Err(e) = self.store.set(keys::LAST_VISITED_PATH, &path) {
            warn!(%path, error = %e, "Failed to save last visited path");
        }
    }

    /// The saved post-login target, defaulting to root.
    pub fn last_visited_path(&self) -> String {
        self.store
            .get(keys::LAST_VISITED_PATH)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }

    /// Navigate to the saved target after a successful login.
    pub fn redirect_after_login(&self) {
        self.navigator.push(&self.last_visited_path());
    }

    /// Reusable auth check for views and the router guard.
    ///
    /// Returns false when the check fails, after performing the redirect:
    /// a protected view with no session goes to login (saving the current
    /// path for after login), a logged-in user on an auth-only page goes
    /// back to root.
    pub fn check_auth(&self, require_auth: bool) -> bool {
        let logged_in = self.is_logged_in();

        if require_auth && !logged_in {
            self.save_last_visited_path(&self.navigator.current_path());
            self.navigator.push(LOGIN_PATH);
            return false;
        }

        if !require_auth && logged_in {
            self.navigator.push(ROOT_PATH);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::HistoryNavigator;
    use crate::notify::notice_channel;
    use crate::store::MemoryStore;

    fn manager_with(
        store: Arc<dyn SessionStore>,
    ) -> (SessionManager, Arc<HistoryNavigator>) {
        let nav = Arc::new(HistoryNavigator::new());
        let (notices, _rx) = notice_channel();
        let manager = SessionManager::new(store, nav.clone(), notices, RouteTable::default());
        (manager, nav)
    }

    #[test]
    fn test_login_state_survives_reload() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

        let (manager, _) = manager_with(store.clone());
        manager.set_login_info("tok-1", "42", "alice").unwrap();

        // Simulated reload: a fresh manager over the same store
        let (restored, _) = manager_with(store);
        restored.initialize();

        let snap = restored.snapshot();
        assert!(snap.logged_in);
        assert_eq!(snap.user_id.as_deref(), Some("42"));
        assert_eq!(snap.username.as_deref(), Some("alice"));
        assert_eq!(restored.token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_clear_then_initialize_is_logged_out() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

        let (manager, _) = manager_with(store.clone());
        manager.set_login_info("tok-1", "42", "alice").unwrap();
        manager.clear_login_info();
        // Idempotent: clearing twice is fine
        manager.clear_login_info();

        let (restored, _) = manager_with(store);
        restored.initialize();
        assert_eq!(restored.snapshot(), AuthSnapshot::default());
        assert_eq!(restored.token(), None);
    }

    #[test]
    fn test_partial_store_initializes_logged_out() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::TOKEN, "tok-1").unwrap();
        store.set(keys::USER_ID, "42").unwrap();
        // username missing

        let (manager, _) = manager_with(store);
        manager.initialize();
        assert!(!manager.is_logged_in());
        assert_eq!(manager.snapshot().user_id, None);
    }

    #[test]
    fn test_set_login_info_rejects_empty_fields() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()));
        assert!(manager.set_login_info("", "42", "alice").is_err());
        assert!(manager.set_login_info("tok", "", "alice").is_err());
        assert!(manager.set_login_info("tok", "42", "").is_err());
        assert!(!manager.is_logged_in());
    }

    #[test]
    fn test_check_auth_required_while_logged_out() {
        let (manager, nav) = manager_with(Arc::new(MemoryStore::new()));
        manager.initialize();
        nav.push("/trade/order");

        assert!(!manager.check_auth(true));
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(manager.last_visited_path(), "/trade/order");
    }

    #[test]
    fn test_check_auth_public_only_while_logged_in() {
        let (manager, nav) = manager_with(Arc::new(MemoryStore::new()));
        manager.set_login_info("tok", "42", "alice").unwrap();
        nav.push("/login");

        assert!(!manager.check_auth(false));
        assert_eq!(nav.current_path(), "/");
    }

    #[test]
    fn test_check_auth_passes_otherwise() {
        let (manager, nav) = manager_with(Arc::new(MemoryStore::new()));
        manager.set_login_info("tok", "42", "alice").unwrap();
        nav.push("/trade");
        assert!(manager.check_auth(true));
        assert_eq!(nav.current_path(), "/trade");
    }

    #[test]
    fn test_last_visited_skips_auth_pages() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()));

        manager.save_last_visited_path("/dashboard");
        assert_eq!(manager.last_visited_path(), "/dashboard");

        manager.save_last_visited_path("/login");
        manager.save_last_visited_path("/Register");
        assert_eq!(manager.last_visited_path(), "/dashboard");
    }

    #[test]
    fn test_redirect_after_login_defaults_to_root() {
        let (manager, nav) = manager_with(Arc::new(MemoryStore::new()));
        manager.redirect_after_login();
        assert_eq!(nav.current_path(), "/");

        manager.save_last_visited_path("/portfolio");
        manager.redirect_after_login();
        assert_eq!(nav.current_path(), "/portfolio");
    }

    #[test]
    fn test_watch_observers_see_mutations() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()));
        let rx = manager.subscribe();

        manager.set_login_info("tok", "42", "alice").unwrap();
        assert!(rx.borrow().logged_in);

        manager.clear_login_info();
        assert!(!rx.borrow().logged_in);
    }

    #[test]
    fn test_expire_session_skips_redirect_on_login() {
        let (manager, nav) = manager_with(Arc::new(MemoryStore::new()));
        manager.set_login_info("tok", "42", "alice").unwrap();
        nav.push("/login");

        manager.expire_session();
        assert!(!manager.is_logged_in());
        // No loop: still on login, not pushed again
        assert_eq!(nav.history(), vec!["/", "/login"]);
    }
}
