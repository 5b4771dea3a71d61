//! Resident context injection
//!
//! Thread-local storage for the signed-in resident and the floor they are
//! viewing, so every span opened in a scope can be tagged with them.

use std::cell::RefCell;

use floorboard_core::{Floor, PrincipalId};
use uuid::Uuid;

/// Resident context stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentContextData {
    pub principal_id: String,
    /// Floor being viewed, if any
    pub floor: Option<u32>,
    /// Unique id for this app session
    pub instance_id: Uuid,
}

thread_local! {
    static RESIDENT_CONTEXT: RefCell<Option<ResidentContextData>> = const { RefCell::new(None) };
}

/// RAII guard for resident context
///
/// Creating the guard sets the context for the current thread. Dropping it
/// restores whatever was set before.
///
/// # Example
///
/// ```ignore
/// use floorboard_logging::ResidentContextGuard;
///
/// let _guard = ResidentContextGuard::new(&principal.id).with_floor(Floor::new(3));
///
/// // Spans opened in this scope carry principal_id and floor
/// tracing::info_span!("render").in_scope(|| tracing::info!("drawing feed"));
/// ```
pub struct ResidentContextGuard {
    previous: Option<ResidentContextData>,
}

impl ResidentContextGuard {
    pub fn new(principal_id: &PrincipalId) -> Self {
        Self::with_instance_id(principal_id, Uuid::new_v4())
    }

    /// Keep a known instance id, e.g. across reconnects
    pub fn with_instance_id(principal_id: &PrincipalId, instance_id: Uuid) -> Self {
        let previous = Self::current();
        let data = ResidentContextData {
            principal_id: principal_id.to_string(),
            floor: None,
            instance_id,
        };
        RESIDENT_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(data));
        Self { previous }
    }

    /// Record the floor being viewed for the rest of this guard's scope
    pub fn with_floor(self, floor: Floor) -> Self {
        RESIDENT_CONTEXT.with(|ctx| {
            if let Some(data) = ctx.borrow_mut().as_mut() {
                data.floor = Some(floor.number());
            }
        });
        self
    }

    pub fn current() -> Option<ResidentContextData> {
        RESIDENT_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_principal_id() -> Option<String> {
        Self::current().map(|ctx| ctx.principal_id)
    }

    pub fn current_floor() -> Option<u32> {
        Self::current().and_then(|ctx| ctx.floor)
    }

    pub fn current_instance_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.instance_id)
    }
}

impl Drop for ResidentContextGuard {
    fn drop(&mut self) {
        RESIDENT_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with a resident context set
///
/// ```ignore
/// with_resident_context!(&principal.id, {
///     tracing::info!("posting");
/// });
/// ```
#[macro_export]
macro_rules! with_resident_context {
    ($principal_id:expr, $body:block) => {{
        let _guard = $crate::context::ResidentContextGuard::new($principal_id);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_sets_and_clears() {
        assert!(ResidentContextGuard::current().is_none());
        {
            let _guard = ResidentContextGuard::new(&PrincipalId::new("uid-1"));
            assert_eq!(ResidentContextGuard::current_principal_id().as_deref(), Some("uid-1"));
            assert_eq!(ResidentContextGuard::current_floor(), None);
        }
        assert!(ResidentContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts_restore() {
        let _outer = ResidentContextGuard::new(&PrincipalId::new("uid-1")).with_floor(Floor::new(3));
        {
            let _inner = ResidentContextGuard::new(&PrincipalId::new("uid-2"));
            assert_eq!(ResidentContextGuard::current_principal_id().as_deref(), Some("uid-2"));
            assert_eq!(ResidentContextGuard::current_floor(), None);
        }
        assert_eq!(ResidentContextGuard::current_principal_id().as_deref(), Some("uid-1"));
        assert_eq!(ResidentContextGuard::current_floor(), Some(3));
    }

    #[test]
    fn test_instance_id_kept() {
        let id = Uuid::new_v4();
        let _guard = ResidentContextGuard::with_instance_id(&PrincipalId::new("uid-9"), id);
        assert_eq!(ResidentContextGuard::current_instance_id(), Some(id));
    }

    #[test]
    fn test_macro_scopes_context() {
        let seen = with_resident_context!(&PrincipalId::new("uid-4"), {
            ResidentContextGuard::current_principal_id()
        });
        assert_eq!(seen.as_deref(), Some("uid-4"));
        assert!(ResidentContextGuard::current().is_none());
    }
}
