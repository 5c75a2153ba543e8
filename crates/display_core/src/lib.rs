use std::{collections::VecDeque, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{domain::Screen, error::UnknownScreen};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::{broadcast, Notify},
};
use tracing::{debug, error, info, warn};
use transitions::{TransitionEdge, TransitionGraph};

pub mod channel;
pub mod sponsor;

pub use channel::{dispatch_message, websocket_url, ChannelExit, CommandChannel, Dispatch};
pub use sponsor::{HttpSponsorLoader, SponsorCard, SponsorDeck};

/// Pause between the end of one transition and the start of the next queued one.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("rejected screen request: {0}")]
    InvalidScreen(#[from] UnknownScreen),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    TransitionStarted {
        from: Screen,
        to: Screen,
        hops: usize,
    },
    HopCompleted {
        edge: TransitionEdge,
    },
    ScreenChanged {
        from: Screen,
        to: Screen,
    },
    RequestRejected {
        name: String,
    },
}

/// One-time content preparation for screens that need it before their
/// entrance animation. Invoked fire-and-forget; failures are only logged.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, screen: Screen) -> Result<()>;
}

pub struct NoopContentLoader;

#[async_trait]
impl ContentLoader for NoopContentLoader {
    async fn load(&self, _screen: Screen) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub settle_delay: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

struct QueueState {
    current: Screen,
    pending: VecDeque<Screen>,
    busy: bool,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        !self.busy && self.pending.is_empty()
    }
}

/// Serializes screen change requests and plays them one at a time.
///
/// Requests join a FIFO queue. The head is popped only when no transition is
/// in flight, routed through the graph (directly or via the hub) and its hops
/// run strictly in order. The current screen changes only once the last hop
/// of a route has finished, then the next request is started after the
/// settle delay.
///
/// Transitions run on the runtime the orchestrator was created in, so
/// requests may come from any thread afterwards.
pub struct Orchestrator {
    graph: TransitionGraph,
    runtime: Handle,
    content: Arc<dyn ContentLoader>,
    options: OrchestratorOptions,
    state: Mutex<QueueState>,
    idle: Notify,
    events: broadcast::Sender<DisplayEvent>,
}

impl Orchestrator {
    pub fn new(graph: TransitionGraph, options: OrchestratorOptions) -> Arc<Self> {
        Self::with_content_loader(graph, options, Arc::new(NoopContentLoader))
    }

    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn with_content_loader(
        graph: TransitionGraph,
        options: OrchestratorOptions,
        content: Arc<dyn ContentLoader>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        let hub = graph.hub();
        Arc::new(Self {
            graph,
            runtime: Handle::current(),
            content,
            options,
            state: Mutex::new(QueueState {
                current: hub,
                pending: VecDeque::new(),
                busy: false,
            }),
            idle: Notify::new(),
            events,
        })
    }

    pub fn current_screen(&self) -> Screen {
        self.state.lock().current
    }

    pub fn pending(&self) -> Vec<Screen> {
        self.state.lock().pending.iter().copied().collect()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DisplayEvent> {
        self.events.subscribe()
    }

    /// Queues `target` and kicks the queue. Never waits for the transition.
    pub fn request_screen(self: &Arc<Self>, target: Screen) {
        {
            let mut state = self.state.lock();
            state.pending.push_back(target);
            debug!(target = %target, queued = state.pending.len(), "queued screen request");
        }
        self.execute_queue();
    }

    /// Inbound boundary for screen names received from the server.
    pub fn request_screen_named(self: &Arc<Self>, name: &str) -> Result<Screen, DisplayError> {
        match name.parse::<Screen>() {
            Ok(target) => {
                self.request_screen(target);
                Ok(target)
            }
            Err(err) => {
                warn!(screen = name, "ignoring request for unknown screen");
                let _ = self.events.send(DisplayEvent::RequestRejected {
                    name: name.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Resolves once nothing is queued and no transition is running.
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.state.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn execute_queue(self: &Arc<Self>) {
        let (from, target) = {
            let mut state = self.state.lock();
            if state.busy {
                return;
            }
            let Some(target) = state.pending.pop_front() else {
                self.idle.notify_waiters();
                return;
            };
            state.busy = true;
            (state.current, target)
        };

        let orchestrator = Arc::clone(self);
        self.runtime.spawn(async move {
            orchestrator.run_transition(from, target).await;
        });
    }

    async fn run_transition(self: Arc<Self>, from: Screen, target: Screen) {
        let applied = if target == from {
            debug!(screen = %target, "screen already showing");
            true
        } else {
            if target.requires_content_load() {
                self.load_content(target);
            }
            self.play_route(from, target).await
        };

        {
            let mut state = self.state.lock();
            if applied {
                state.current = target;
            }
            state.busy = false;
            // Idle waiters must observe the change event already sent.
            if applied && from != target {
                info!(from = %from, to = %target, "screen changed");
                let _ = self.events.send(DisplayEvent::ScreenChanged { from, to: target });
            }
            if state.is_idle() {
                self.idle.notify_waiters();
            }
        }

        tokio::time::sleep(self.options.settle_delay).await;
        self.execute_queue();
    }

    async fn play_route(&self, from: Screen, target: Screen) -> bool {
        let route = match self.graph.resolve(from, target) {
            Ok(route) => route,
            Err(err) => {
                error!(from = %from, to = %target, %err, "no route between screens");
                return false;
            }
        };

        debug!(from = %from, to = %target, hops = route.len(), "starting transition");
        let _ = self.events.send(DisplayEvent::TransitionStarted {
            from,
            to: target,
            hops: route.len(),
        });
        for hop in route.hops() {
            hop.operation.run(hop.edge).await;
            debug!(edge = %hop.edge, "transition hop finished");
            let _ = self.events.send(DisplayEvent::HopCompleted { edge: hop.edge });
        }
        true
    }

    fn load_content(&self, screen: Screen) {
        let content = Arc::clone(&self.content);
        self.runtime.spawn(async move {
            if let Err(err) = content.load(screen).await {
                warn!(screen = %screen, %err, "failed to load screen content");
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
