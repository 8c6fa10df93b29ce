use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Coalesces render requests: any number of [`RenderScheduler::schedule`] calls between two
/// frame ticks produce one render.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: AtomicBool,
    notify: Notify,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a render as due. Returns `false` if one was already pending.
    pub fn schedule(&self) -> bool {
        let newly = !self.pending.swap(true, Ordering::AcqRel);
        if newly {
            self.notify.notify_one();
        }
        newly
    }

    /// Frame boundary: clear the pending flag and report whether a render is due.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until a render is pending. Does not clear the flag.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_pending() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
