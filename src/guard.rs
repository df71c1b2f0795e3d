//! Router guard evaluated on every route transition.
//!
//! Each evaluation terminates in exactly one outcome: proceed to the
//! requested path, bounce to login, or bounce to root. Redirects are
//! normal control flow, not errors, and the guard never defers a decision.

use std::sync::Arc;

use tracing::debug;

use crate::auth::SessionManager;
use crate::routes::{RouteClass, RouteTable, LOGIN_PATH, ROOT_PATH};

/// Terminal outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Navigation proceeds to the requested path.
    Proceed,
    /// Unauthenticated access to a protected path: go to login instead.
    ToLogin,
    /// Authenticated access to login/register: go to root instead.
    ToRoot,
}

impl GuardOutcome {
    /// The path the transition actually lands on.
    pub fn target<'a>(&self, requested: &'a str) -> &'a str {
        match self {
            GuardOutcome::Proceed => requested,
            GuardOutcome::ToLogin => LOGIN_PATH,
            GuardOutcome::ToRoot => ROOT_PATH,
        }
    }
}

pub struct NavigationGuard {
    session: Arc<SessionManager>,
    routes: RouteTable,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionManager>, routes: RouteTable) -> Self {
        Self { session, routes }
    }

    /// Evaluate a transition from `from` to `to`.
    ///
    /// Rules, in order:
    /// 1. Persist `from` as last-visited (login/register excluded).
    /// 2. Protected `to` without a session goes to login, carrying `to` as
    ///    the post-login target.
    /// 3. Login/register while logged in goes to root.
    /// 4. Everything else proceeds.
    pub fn evaluate(&self, from: &str, to: &str) -> GuardOutcome {
        self.session.save_last_visited_path(from);

        let logged_in = self.session.is_logged_in();

        let outcome = if self.routes.classify(to) == RouteClass::Protected && !logged_in {
            // Redirect target for after the user logs in
            self.session.save_last_visited_path(to);
            GuardOutcome::ToLogin
        } else if self.routes.is_auth_page(to) && logged_in {
            GuardOutcome::ToRoot
        } else {
            GuardOutcome::Proceed
        };

        debug!(from, to, ?outcome, "Route transition evaluated");
        outcome
    }
}
