//! Static route table partitioning paths into protected and public.
//!
//! Protected paths are matched by prefix, so `/trade/order` falls under
//! `/trade`. Matching is case-insensitive; paths are normalized before
//! comparison so `/Login` and `/login` are the same route. Any path not
//! listed as protected is public by policy.

/// Root path, the default post-login target.
pub const ROOT_PATH: &str = "/";

/// Login page path. Always public, never recorded as last-visited.
pub const LOGIN_PATH: &str = "/login";

/// Register page path. Always public, never recorded as last-visited.
pub const REGISTER_PATH: &str = "/register";

/// Classification of a path under the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires an active session.
    Protected,
    /// Accessible without a session.
    Public,
}

/// The application's route partition.
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected_prefixes: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&["/account", "/trade", "/orders", "/portfolio"])
    }
}

impl RouteTable {
    /// Build a table from protected path prefixes. Prefixes are normalized
    /// on the way in so lookups only normalize the queried path.
    pub fn new(protected_prefixes: &[&str]) -> Self {
        Self {
            protected_prefixes: protected_prefixes
                .iter()
                .map(|p| normalize_path(p))
                .collect(),
        }
    }

    /// Classify a path. Unlisted paths are public.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.is_protected(path) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.protected_prefixes.iter().any(|prefix| {
            path == *prefix || path.starts_with(&format!("{}/", prefix))
        })
    }

    /// True for the login and register pages. These are excluded from
    /// last-visited tracking and bounce logged-in users back to root.
    pub fn is_auth_page(&self, path: &str) -> bool {
        let path = normalize_path(path);
        path == LOGIN_PATH || path == REGISTER_PATH
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize_path(path) == LOGIN_PATH
    }
}

/// Normalize a path for comparison: lowercase, leading slash, no trailing
/// slash (except root itself).
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim().to_lowercase();
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    while p.len() > 1 && p.ends_with('/') {
        p.pop();
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Login"), "/login");
        assert_eq!(normalize_path("login"), "/login");
        assert_eq!(normalize_path("/trade/"), "/trade");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(" /Orders "), "/orders");
    }

    #[test]
    fn test_protected_prefix_match() {
        let table = RouteTable::default();
        assert!(table.is_protected("/trade"));
        assert!(table.is_protected("/trade/order"));
        assert!(table.is_protected("/Account"));
        // Prefix match must not swallow sibling paths
        assert!(!table.is_protected("/tradehistory"));
        assert!(!table.is_protected("/market"));
    }

    #[test]
    fn test_unlisted_paths_are_public() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/"), RouteClass::Public);
        assert_eq!(table.classify("/quotes"), RouteClass::Public);
        assert_eq!(table.classify("/some/unknown/path"), RouteClass::Public);
        assert_eq!(table.classify("/orders"), RouteClass::Protected);
    }

    #[test]
    fn test_auth_pages_case_insensitive() {
        let table = RouteTable::default();
        assert!(table.is_auth_page("/login"));
        assert!(table.is_auth_page("/Login"));
        assert!(table.is_auth_page("/Register"));
        assert!(!table.is_auth_page("/"));
        assert!(table.is_login("/Login"));
        assert!(!table.is_login("/register"));
    }
}
