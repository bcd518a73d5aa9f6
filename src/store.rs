// Copyright (c) 2025 - Cowboy AI, Inc.
//! Action/Reducer Store
//!
//! The single source of truth for client state. State is an immutable
//! [`AppState`] snapshot; the only way to change it is to dispatch an
//! [`Action`], which a pure root reducer folds into the next snapshot.
//!
//! # Architecture
//!
//! ```text
//!  Connection manager ──┐
//!  Thunks (requests)  ──┼──> dispatch() ──> mpsc queue ──> dispatcher task
//!  Local UI events    ──┘                                      │
//!                                                  reduce(state, action)
//!                                                              │
//!                                   watch::Sender<Snapshot> <──┤
//!                                                              ▼
//!                                                         listeners
//! ```
//!
//! # Ordering
//!
//! All writers funnel through one unbounded queue drained by one task, so
//! actions are applied strictly in the order they were enqueued and never
//! interleave. [`Store::state`] is synchronous and always returns the last
//! fully reduced snapshot.
//!
//! # Subscriptions
//!
//! [`Store::subscribe`] takes a selector returning a shared branch (or any
//! `Arc` slice). The listener runs at most once per applied action, and only
//! when the selected `Arc` is a different allocation from the one it last
//! saw. Reducers hand back the previous `Arc` when an action does not concern
//! them, so pointer identity is an exact change signal.
//!
//! Listeners run on the dispatcher task. They may dispatch (the action is
//! queued behind the current one) but must not block.

pub mod branch;
pub mod collections;
pub mod datasets;
pub mod plots;
pub mod sharing;
pub mod source;
pub mod state;
pub mod status;

pub use branch::{Branch, Loadable, PanelStatus};
pub use state::AppState;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::action::{Action, ActionEnvelope};
use crate::errors::{SyncError, SyncResult};

/// A reduced snapshot and its revision number
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Number of actions applied since the store was created
    pub revision: u64,
    /// The state after `revision` actions
    pub state: Arc<AppState>,
}

type Listener = Arc<Mutex<dyn FnMut(&Action, &Arc<AppState>) + Send>>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

enum Command {
    Dispatch {
        envelope: ActionEnvelope,
        ack: Option<oneshot::Sender<u64>>,
    },
    Barrier(oneshot::Sender<u64>),
    Shutdown,
}

struct StoreInner {
    queue: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Snapshot>,
    listeners: Arc<Mutex<ListenerRegistry>>,
}

/// Handle to the store; cheap to clone, all clones share one dispatcher
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("revision", &self.revision())
            .finish()
    }
}

impl Store {
    /// Create a store and spawn its dispatcher task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(initial: AppState) -> Self {
        let (queue, commands) = mpsc::unbounded_channel();
        let (publisher, snapshot) = watch::channel(Snapshot {
            revision: 0,
            state: Arc::new(initial),
        });
        let listeners = Arc::new(Mutex::new(ListenerRegistry::default()));

        tokio::spawn(run_dispatcher(commands, publisher, Arc::clone(&listeners)));

        Self {
            inner: Arc::new(StoreInner {
                queue,
                snapshot,
                listeners,
            }),
        }
    }

    /// The last fully reduced state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.inner.snapshot.borrow().state)
    }

    /// The last fully reduced snapshot with its revision
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Number of actions applied so far
    pub fn revision(&self) -> u64 {
        self.inner.snapshot.borrow().revision
    }

    /// A receiver that is notified after every applied action
    pub fn changes(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.clone()
    }

    /// Enqueue an action; it is applied after every action enqueued before it
    pub fn dispatch(&self, action: impl Into<ActionEnvelope>) -> SyncResult<()> {
        self.inner
            .queue
            .send(Command::Dispatch {
                envelope: action.into(),
                ack: None,
            })
            .map_err(|_| SyncError::StoreClosed)
    }

    /// Enqueue an action and wait until it has been applied
    ///
    /// Returns the revision produced by the action.
    pub async fn dispatch_and_wait(&self, action: impl Into<ActionEnvelope>) -> SyncResult<u64> {
        let (ack, applied) = oneshot::channel();
        self.inner
            .queue
            .send(Command::Dispatch {
                envelope: action.into(),
                ack: Some(ack),
            })
            .map_err(|_| SyncError::StoreClosed)?;
        applied.await.map_err(|_| SyncError::StoreClosed)
    }

    /// Wait until every action enqueued before this call has been applied
    pub async fn flush(&self) -> SyncResult<u64> {
        let (ack, applied) = oneshot::channel();
        self.inner
            .queue
            .send(Command::Barrier(ack))
            .map_err(|_| SyncError::StoreClosed)?;
        applied.await.map_err(|_| SyncError::StoreClosed)
    }

    /// Stop the dispatcher after the actions already enqueued
    pub fn shutdown(&self) {
        let _ = self.inner.queue.send(Command::Shutdown);
    }

    /// Register a listener that sees every applied action and the new state
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn on_action<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&Action, &Arc<AppState>) + Send + 'static,
    {
        let mut registry = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.insert(id, Arc::new(Mutex::new(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner.listeners),
        }
    }

    /// Register a listener for one slice of the state
    ///
    /// `listener` runs only when the `Arc` returned by `selector` changes
    /// identity.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<T, S, F>(&self, selector: S, mut listener: F) -> Subscription
    where
        T: ?Sized + Send + Sync + 'static,
        S: Fn(&AppState) -> Arc<T> + Send + 'static,
        F: FnMut(Arc<T>) + Send + 'static,
    {
        let mut last = selector(&self.state());
        self.on_action(move |_, state| {
            let next = selector(state);
            if !Arc::ptr_eq(&last, &next) {
                last = Arc::clone(&next);
                listener(next);
            }
        })
    }
}

/// Registration handle; dropping it unsubscribes
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .remove(&self.id);
        }
    }
}

async fn run_dispatcher(
    mut commands: mpsc::UnboundedReceiver<Command>,
    publisher: watch::Sender<Snapshot>,
    listeners: Arc<Mutex<ListenerRegistry>>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Dispatch { envelope, ack } => {
                let current = publisher.borrow().clone();
                let state = Arc::new(current.state.reduce(&envelope.action));
                let revision = current.revision + 1;

                debug!(
                    kind = envelope.action.kind(),
                    revision,
                    correlation_id = ?envelope.correlation_id,
                    changed = ?state.changed_branches(&current.state),
                    "Applied action"
                );

                publisher.send_replace(Snapshot {
                    revision,
                    state: Arc::clone(&state),
                });
                notify(&listeners, &envelope.action, &state);

                if let Some(ack) = ack {
                    let _ = ack.send(revision);
                }
            }
            Command::Barrier(ack) => {
                let _ = ack.send(publisher.borrow().revision);
            }
            Command::Shutdown => break,
        }
    }
    info!("Store dispatcher stopped");
}

fn notify(listeners: &Mutex<ListenerRegistry>, action: &Action, state: &Arc<AppState>) {
    // Snapshot the registry so listeners may (un)subscribe while being called
    let current: Vec<Listener> = listeners
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .values()
        .cloned()
        .collect();

    for listener in current {
        let mut listener = listener.lock().unwrap_or_else(PoisonError::into_inner);
        (*listener)(action, state);
    }
}
