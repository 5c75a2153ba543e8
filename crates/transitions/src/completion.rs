//! Adapter for transitions driven by a completion callback instead of a
//! future.

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::error;

use crate::graph::{TransitionEdge, TransitionOperation};

/// Handed to a callback-driven transition; consuming it signals completion.
pub struct Completion {
    tx: oneshot::Sender<()>,
}

impl Completion {
    pub fn done(self) {
        // The receiver only goes away if the driving task was torn down.
        let _ = self.tx.send(());
    }
}

/// Runs `start(edge, completion)` and waits for `completion.done()`, which
/// may be called synchronously from `start` or later from another task.
pub struct CallbackTransition<F> {
    start: F,
}

impl<F> CallbackTransition<F>
where
    F: Fn(TransitionEdge, Completion) + Send + Sync + 'static,
{
    pub fn new(start: F) -> Self {
        Self { start }
    }
}

#[async_trait]
impl<F> TransitionOperation for CallbackTransition<F>
where
    F: Fn(TransitionEdge, Completion) + Send + Sync + 'static,
{
    async fn run(&self, edge: TransitionEdge) {
        let (tx, rx) = oneshot::channel();
        (self.start)(edge, Completion { tx });
        if rx.await.is_err() {
            error!(edge = %edge, "transition dropped its completion without signalling it");
        }
    }
}
