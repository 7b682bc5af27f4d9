use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

// Unattached --attach--> Loading --finish--> Ready | Error
// detach returns to Unattached from any state; re-attach starts a new generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Unattached,
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    generation: u64,
    cancel: Option<watch::Sender<bool>>,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: LifecycleState::Unattached,
                generation: 0,
                cancel: None,
            })),
        }
    }
}

impl Lifecycle {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state.clone()
    }

    pub fn attach(&self) -> AttachToken {
        let mut inner = self.lock();
        if let Some(prev) = inner.cancel.take() {
            prev.send_replace(true);
        }
        let (tx, rx) = watch::channel(false);
        inner.generation += 1;
        inner.state = LifecycleState::Loading;
        inner.cancel = Some(tx);
        AttachToken {
            generation: inner.generation,
            cancelled: rx,
            lifecycle: self.clone(),
        }
    }

    pub fn detach(&self) {
        let mut inner = self.lock();
        if let Some(tx) = inner.cancel.take() {
            tx.send_replace(true);
        }
        inner.generation += 1;
        inner.state = LifecycleState::Unattached;
    }
}

#[derive(Debug)]
pub struct AttachToken {
    generation: u64,
    cancelled: watch::Receiver<bool>,
    lifecycle: Lifecycle,
}

impl AttachToken {
    pub fn is_live(&self) -> bool {
        let cancelled = *self.cancelled.borrow();
        !cancelled && self.lifecycle.lock().generation == self.generation
    }

    pub async fn cancelled(&mut self) {
        loop {
            if *self.cancelled.borrow_and_update() {
                return;
            }
            if self.cancelled.changed().await.is_err() {
                return;
            }
        }
    }

    /// Moves Loading to Ready or Error. Returns false when the token is stale.
    pub fn finish(&self, outcome: Result<(), String>) -> bool {
        let mut inner = self.lifecycle.lock();
        if inner.generation != self.generation || *self.cancelled.borrow() {
            return false;
        }
        inner.state = match outcome {
            Ok(()) => LifecycleState::Ready,
            Err(message) => LifecycleState::Error(message),
        };
        true
    }
}
