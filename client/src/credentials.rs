use std::sync::{Arc, PoisonError, RwLock};

/// Source of the bearer token for the current caller.
///
/// Read synchronously at submission time; the workflow never stores or
/// mutates what it gets back.
pub trait CredentialResolver: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Resolver for callers that never log in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialResolver for Anonymous {
    fn current_token(&self) -> Option<String> {
        None
    }
}

impl CredentialResolver for Option<String> {
    fn current_token(&self) -> Option<String> {
        usable(self.as_deref())
    }
}

/// In-memory token slot shared between the session layer (writer) and the
/// workflow (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }
}

impl CredentialResolver for SharedToken {
    fn current_token(&self) -> Option<String> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        usable(slot.as_deref())
    }
}

// Blank tokens are treated as logged out.
fn usable(token: Option<&str>) -> Option<String> {
    token
        .filter(|t| !t.trim().is_empty())
        .map(str::to_owned)
}
