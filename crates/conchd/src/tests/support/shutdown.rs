//! Shutdown signal that fires after a fixed number of host iterations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::process::ShutdownSignal;

/// Reports shutdown once it has been asked `after` times.
#[derive(Debug, Clone)]
pub struct ScriptedShutdown {
    after: usize,
    checks: Arc<AtomicUsize>,
}

impl ScriptedShutdown {
    #[must_use]
    pub fn after(after: usize) -> Self {
        Self {
            after,
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the host asked whether to stop.
    #[must_use]
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl ShutdownSignal for ScriptedShutdown {
    fn requested(&mut self) -> bool {
        let seen = self.checks.fetch_add(1, Ordering::SeqCst);
        seen >= self.after
    }
}
