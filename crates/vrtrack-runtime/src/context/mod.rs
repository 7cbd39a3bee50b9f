//! Actor primitive every entity is built on.
//!
//! A [`Context`] owns one immutable state value behind an `Arc`, a bounded
//! action queue, a [`Reducer`], a broadcast channel of state snapshots, and a
//! [`CancellationToken`].
//!
//! # Ordering
//!
//! A single spawned loop pops actions one at a time, reduces them, publishes
//! the new state, and only then resolves the dispatcher's "applied" signal.
//! Actions to one context are therefore applied strictly in submission order
//! and reducer calls never overlap. Nothing orders actions across contexts.
//!
//! # Initial broadcast
//!
//! The loop's first step publishes the initial state as revision 1. Because
//! the loop runs as a separate task, that happens on the next scheduling tick
//! after [`Context::spawn`] returns, so subscribers registered right after
//! creation still observe it. Revision 0 means "created, not yet broadcast";
//! [`Context::ready`] waits for revision 1.
//!
//! # Destruction
//!
//! [`Context::destroy`] fires the token. The loop stops, closes its queue,
//! and every later dispatch fails with [`RuntimeError::Cancelled`]. Timers and
//! listeners tied to the actor derive child tokens from [`Context::token`].

pub mod reducer;

pub use reducer::{ModuleChain, Reducer, ReducerModule};

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::errors::{Result, RuntimeError};

/// Minimum buffer of the state broadcast channel.
const MIN_BROADCAST_CAPACITY: usize = 64;

/// A published state with its revision number.
#[derive(Debug)]
pub struct Snapshot<S> {
    /// The state value.
    pub state: Arc<S>,
    /// 0 before the initial broadcast, then +1 per applied action.
    pub revision: u64,
}

impl<S> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            revision: self.revision,
        }
    }
}

struct Envelope<S, A> {
    action: A,
    applied: Option<oneshot::Sender<Arc<S>>>,
}

struct Inner<S, A> {
    name: &'static str,
    actions: mpsc::Sender<Envelope<S, A>>,
    snapshot: watch::Receiver<Snapshot<S>>,
    updates: broadcast::Sender<Arc<S>>,
    cancel: CancellationToken,
}

/// Handle to a running actor. Cloning is cheap and shares the actor.
pub struct Context<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for Context<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> std::fmt::Debug for Context<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("revision", &self.inner.snapshot.borrow().revision)
            .field("destroyed", &self.inner.cancel.is_cancelled())
            .finish()
    }
}

impl<S, A> Context<S, A>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create the actor and start its action loop.
    ///
    /// `capacity` bounds the action queue; dispatchers wait while it is full.
    pub fn spawn(
        name: &'static str,
        initial: S,
        reducer: impl Reducer<S, A>,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let (actions_tx, actions_rx) = mpsc::channel(capacity);
        let initial = Arc::new(initial);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            state: Arc::clone(&initial),
            revision: 0,
        });
        let (updates, _) = broadcast::channel(capacity.max(MIN_BROADCAST_CAPACITY));
        let cancel = CancellationToken::new();

        drop(tokio::spawn(run_loop(
            name,
            initial,
            reducer,
            actions_rx,
            snapshot_tx,
            updates.clone(),
            cancel.clone(),
        )));

        Self {
            inner: Arc::new(Inner {
                name,
                actions: actions_tx,
                snapshot: snapshot_rx,
                updates,
                cancel,
            }),
        }
    }

    /// Enqueue an action, waiting for queue space if it is full.
    pub async fn dispatch(&self, action: A) -> Result<()> {
        self.enqueue(Envelope {
            action,
            applied: None,
        })
        .await
    }

    /// Enqueue an action and wait until it has been reduced and broadcast.
    ///
    /// Returns the state that resulted from this action.
    pub async fn dispatch_applied(&self, action: A) -> Result<Arc<S>> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Envelope {
            action,
            applied: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::Cancelled)
    }

    async fn enqueue(&self, envelope: Envelope<S, A>) -> Result<()> {
        if self.inner.cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(RuntimeError::Cancelled),
            sent = self.inner.actions.send(envelope) => sent.map_err(|_| RuntimeError::Cancelled),
        }
    }

    /// The most recently broadcast state.
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.inner.snapshot.borrow().state)
    }

    /// Revision of the most recently broadcast state.
    pub fn revision(&self) -> u64 {
        self.inner.snapshot.borrow().revision
    }

    /// Receive every state broadcast after this call, in dispatch order.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<S>> {
        self.inner.updates.subscribe()
    }

    /// Latest-value view of the state, for consumers that only need the newest.
    pub fn watch(&self) -> watch::Receiver<Snapshot<S>> {
        self.inner.snapshot.clone()
    }

    /// Wait for the initial broadcast.
    pub async fn ready(&self) -> Result<Arc<S>> {
        self.wait_until(|_| true).await
    }

    /// Wait for the first broadcast state matching `predicate`.
    pub async fn wait_until(&self, mut predicate: impl FnMut(&S) -> bool) -> Result<Arc<S>> {
        let mut rx = self.inner.snapshot.clone();
        let snapshot = rx
            .wait_for(|snap| snap.revision > 0 && predicate(&snap.state))
            .await
            .map_err(|_| RuntimeError::Cancelled)?;
        Ok(Arc::clone(&snapshot.state))
    }

    /// Stop the actor. Pending and later dispatches fail with `Cancelled`.
    pub fn destroy(&self) {
        self.inner.cancel.cancel();
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// The actor's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Actor kind, for logs.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Whether two handles refer to the same actor.
    pub fn same_actor(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

async fn run_loop<S, A>(
    name: &'static str,
    mut state: Arc<S>,
    reducer: impl Reducer<S, A>,
    mut actions: mpsc::Receiver<Envelope<S, A>>,
    snapshot: watch::Sender<Snapshot<S>>,
    updates: broadcast::Sender<Arc<S>>,
    cancel: CancellationToken,
) where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    let mut revision = 1;
    publish(&snapshot, &updates, &state, revision);

    loop {
        let envelope = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = actions.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        state = Arc::new(reducer.reduce(&state, &envelope.action));
        revision += 1;
        publish(&snapshot, &updates, &state, revision);

        if let Some(applied) = envelope.applied {
            let _ = applied.send(Arc::clone(&state));
        }
    }

    actions.close();
    trace!(actor = name, revision, "context loop stopped");
}

fn publish<S>(
    snapshot: &watch::Sender<Snapshot<S>>,
    updates: &broadcast::Sender<Arc<S>>,
    state: &Arc<S>,
    revision: u64,
) {
    let _ = snapshot.send_replace(Snapshot {
        state: Arc::clone(state),
        revision,
    });
    // No receivers is fine.
    let _ = updates.send(Arc::clone(state));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
