//! Route table and pre-navigation role guard.
//!
//! This is a client-side UX gate only, never a security boundary: the hosted
//! backend's access rules are what actually protect the data. The guard just
//! keeps users out of screens their role has no business rendering.

use std::sync::Arc;

use crate::models::Role;
use crate::session::SessionContext;

// ═══════════════════════════════════════════════════════════
// Route table
// ═══════════════════════════════════════════════════════════

/// Access annotation on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    RequiresAuth,
    RequiresRole(Role),
}

/// One entry in the static route table. `:param` segments match any single
/// path segment.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub access: Access,
}

pub const ROUTES: &[Route] = &[
    Route {
        path: "/",
        name: "home",
        access: Access::Public,
    },
    Route {
        path: "/login",
        name: "login",
        access: Access::Public,
    },
    Route {
        path: "/admin",
        name: "admin-dashboard",
        access: Access::RequiresRole(Role::Admin),
    },
    Route {
        path: "/admin/doctors",
        name: "admin-doctors",
        access: Access::RequiresRole(Role::Admin),
    },
    Route {
        path: "/admin/patients",
        name: "admin-patients",
        access: Access::RequiresRole(Role::Admin),
    },
    Route {
        path: "/doctor",
        name: "doctor-dashboard",
        access: Access::RequiresRole(Role::Doctor),
    },
    Route {
        path: "/doctor/patients/:id",
        name: "doctor-patient-detail",
        access: Access::RequiresRole(Role::Doctor),
    },
    Route {
        path: "/account/password",
        name: "account-password",
        access: Access::RequiresAuth,
    },
];

/// Segment-wise path match; `:param` matches any single segment.
fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/').filter(|s| !s.is_empty());
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if !p.starts_with(':') && p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Find the route matching a concrete path.
pub fn match_route(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| path_matches(route.path, path))
}

// ═══════════════════════════════════════════════════════════
// Guard
// ═══════════════════════════════════════════════════════════

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: String,
        notice: Option<String>,
    },
}

const UNAUTHORIZED_NOTICE: &str = "You are not authorized to access this page";

/// Pre-navigation gate over the shared session context.
pub struct Navigator {
    session: Arc<SessionContext>,
}

impl Navigator {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    /// Decide whether a navigation to `path` may proceed.
    ///
    /// Unknown and public routes always pass. Protected routes without a
    /// session redirect home. A role mismatch redirects to the stored
    /// role's own area (home for unrecognized roles) with a notice.
    pub fn check(&self, path: &str) -> GuardDecision {
        let access = match match_route(path) {
            Some(route) => route.access,
            None => return GuardDecision::Allow,
        };

        let required = match access {
            Access::Public => return GuardDecision::Allow,
            Access::RequiresAuth => None,
            Access::RequiresRole(role) => Some(role),
        };

        let session_role = match self.session.role() {
            Some(role) => role,
            None => {
                return GuardDecision::Redirect {
                    to: "/".to_string(),
                    notice: None,
                }
            }
        };

        let required = match required {
            Some(role) => role,
            // RequiresAuth: any session passes.
            None => return GuardDecision::Allow,
        };

        match Role::from_str(&session_role) {
            Some(role) if role == required => GuardDecision::Allow,
            Some(role) => GuardDecision::Redirect {
                to: role.default_area().to_string(),
                notice: Some(UNAUTHORIZED_NOTICE.to_string()),
            },
            None => GuardDecision::Redirect {
                to: "/".to_string(),
                notice: Some(UNAUTHORIZED_NOTICE.to_string()),
            },
        }
    }
}
