//! Route guard for the presentation shell.
//!
//! # Invariants
//! - Protected routes are never served without a session.
//! - A signed-in visit to the entry route lands on the dashboard.

pub const ENTRY_ROUTE: &str = "/";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const TASKS_ROUTE: &str = "/tasks";
pub const SETTINGS_ROUTE: &str = "/settings";

const PROTECTED_ROUTES: [&str; 4] = [DASHBOARD_ROUTE, "/notes", TASKS_ROUTE, SETTINGS_ROUTE];

/// Guard verdict for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Results screen route for a processed note.
pub fn note_results_route(note_id: &str) -> String {
    format!("/notes/{note_id}/results")
}

/// Returns whether `path` requires a session.
pub fn is_protected(path: &str) -> bool {
    PROTECTED_ROUTES.iter().any(|route| {
        path == *route
            || path
                .strip_prefix(route)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Decides whether a navigation to `path` proceeds.
pub fn guard(path: &str, signed_in: bool) -> RouteDecision {
    if !signed_in && is_protected(path) {
        return RouteDecision::Redirect(ENTRY_ROUTE);
    }
    if signed_in && path == ENTRY_ROUTE {
        return RouteDecision::Redirect(DASHBOARD_ROUTE);
    }
    RouteDecision::Allow
}
