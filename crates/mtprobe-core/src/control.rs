//! Run control: a shared shutdown token tripped by ctrl-c.
//!
//! The scheduler checks the token between iterations only, so a request that
//! is already in flight always completes before the run drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the run's shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at the next iteration boundary.
    pub fn request(&self) {
        self.token.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.token.load(Ordering::Relaxed)
    }

    /// Spawn a task that trips this token on the first ctrl-c.
    /// Must be called from within a tokio runtime.
    pub fn listen_for_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::warn!("interrupt received; draining after the current server");
                    shutdown.request();
                }
                Err(e) => tracing::warn!("could not listen for ctrl-c: {}", e),
            }
        })
    }
}
