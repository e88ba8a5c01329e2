use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation counter guarding async completions against a detached consumer.
///
/// A consumer hands out [`FetchToken`]s while it is alive and calls
/// [`Liveness::invalidate`] on teardown; completions holding an older token
/// must not touch state.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    generation: Arc<AtomicU64>,
}

impl Liveness {
    pub fn new() -> Self { Self::default() }

    pub fn token(&self) -> FetchToken {
        FetchToken {
            generation: Some(Arc::clone(&self.generation)),
            issued: self.generation.load(Ordering::Acquire),
        }
    }

    /// Make every token issued so far stale.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 { self.generation.load(Ordering::Acquire) }
}

#[derive(Debug, Clone)]
pub struct FetchToken {
    generation: Option<Arc<AtomicU64>>,
    issued: u64,
}

impl FetchToken {
    /// A token not tied to any consumer; always current.
    pub fn detached() -> Self { Self { generation: None, issued: 0 } }

    pub fn is_current(&self) -> bool {
        match &self.generation {
            Some(g) => g.load(Ordering::Acquire) == self.issued,
            None => true,
        }
    }
}
