//! Explicit session context shared by the facade and the navigation guard.
//!
//! Constructed once at app start and refreshed on auth state change
//! (`DataService::refresh_session`). There is no other shared mutable
//! in-process state.

use std::sync::RwLock;

use serde::Serialize;

/// The signed-in identity as the shell sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// Raw role string from the profile row; the guard parses it when
    /// it needs to branch.
    pub role: String,
}

/// Shared holder for the current session. A poisoned lock degrades to
/// "no session" rather than panicking.
#[derive(Debug, Default)]
pub struct SessionContext {
    inner: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: Session) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(session),
            Err(poisoned) => *poisoned.into_inner() = Some(session),
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    /// The current role string, if signed in.
    pub fn role(&self) -> Option<String> {
        self.current().map(|s| s.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Session {
        Session {
            user_id: 3,
            name: "Dr. Sari".to_string(),
            email: "sari@clinic.test".to_string(),
            role: "doctor".to_string(),
        }
    }

    #[test]
    fn set_current_clear_roundtrip() {
        let ctx = SessionContext::new();
        assert!(ctx.current().is_none());
        assert!(ctx.role().is_none());

        ctx.set(doctor());
        assert_eq!(ctx.current().unwrap().user_id, 3);
        assert_eq!(ctx.role().as_deref(), Some("doctor"));

        ctx.clear();
        assert!(ctx.current().is_none());
    }
}
