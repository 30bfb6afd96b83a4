//! Store Commands
//!
//! One async command per mutation, organized by domain. Every command
//! resolves and validates locally, calls the remote, and merges the
//! confirmed response into the store. Its outcome is both returned and
//! recorded in the operation log under its key.

mod attachment;
mod board;
mod card;
mod checklist;
mod comment;
mod drop;
mod label;
mod list;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;

use leptos::prelude::*;

use crate::error::{RemoteError, Result, StoreError};
use crate::remote::RemoteApi;
use crate::status::{OperationKey, OperationKind};
use crate::store::{KanbanState, KanbanStore};

/// How a positional write ended once the server confirmed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The response was merged
    Applied,
    /// A later-issued write to the same container had already been merged,
    /// so this response was dropped
    Superseded,
}

/// Command surface over a store and a remote
pub struct KanbanClient<A> {
    store: KanbanStore,
    api: Arc<A>,
}

impl<A> Clone for KanbanClient<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            api: Arc::clone(&self.api),
        }
    }
}

fn disposed() -> StoreError {
    StoreError::invalid("store", "the store has been disposed")
}

/// Map a remote failure to the command's error
fn rejected(kind: OperationKind) -> impl FnOnce(RemoteError) -> StoreError {
    move |source| StoreError::remote(kind, source)
}

impl<A: RemoteApi> KanbanClient<A> {
    pub fn new(store: KanbanStore, api: A) -> Self {
        Self::with_shared(store, Arc::new(api))
    }

    pub fn with_shared(store: KanbanStore, api: Arc<A>) -> Self {
        Self { store, api }
    }

    pub fn store(&self) -> KanbanStore {
        self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Untracked copy of the current state
    pub fn snapshot(&self) -> Result<KanbanState> {
        self.read(KanbanState::clone)
    }

    pub fn is_loading(&self) -> bool {
        self.read(|state| state.is_loading()).unwrap_or(false)
    }

    pub fn error(&self) -> Option<String> {
        self.read(|state| state.error().map(str::to_string))
            .ok()
            .flatten()
    }

    /// Forget a failure so a retry starts clean
    pub fn clear_error(&self, key: OperationKey) -> Result<()> {
        self.write(|state| state.operations.clear_error(&key))
    }

    // ========================
    // Store access
    // ========================

    fn read<R>(&self, f: impl FnOnce(&KanbanState) -> R) -> Result<R> {
        self.store.try_with_untracked(f).ok_or_else(disposed)
    }

    fn write<R>(&self, f: impl FnOnce(&mut KanbanState) -> R) -> Result<R> {
        self.store.try_update(f).ok_or_else(disposed)
    }

    /// Look something up in local state before any remote call
    fn resolve<R>(&self, f: impl FnOnce(&KanbanState) -> Result<R>) -> Result<R> {
        self.read(f)?
    }

    /// Merge a confirmed response
    fn merge<R>(&self, f: impl FnOnce(&mut KanbanState) -> Result<R>) -> Result<R> {
        self.write(f)?
    }

    // ========================
    // Operation tracking
    // ========================

    fn begin(&self, key: OperationKey) -> Result<()> {
        self.write(|state| state.operations.begin(key))?;
        tracing::debug!(operation = %key, "dispatching");
        Ok(())
    }

    fn settle(&self, key: OperationKey, outcome: std::result::Result<Reconciled, &StoreError>) {
        let recorded = self.write(|state| match outcome {
            Ok(Reconciled::Applied) => state.operations.succeed(key),
            Ok(Reconciled::Superseded) => state.operations.supersede(key),
            Err(_) => state.operations.fail(key, key.kind.failure_message()),
        });
        if recorded.is_err() {
            tracing::warn!(operation = %key, "store disposed before the operation settled");
        }
        match outcome {
            Ok(Reconciled::Applied) => tracing::debug!(operation = %key, "settled"),
            Ok(Reconciled::Superseded) => {
                tracing::warn!(operation = %key, "dropping stale response, a later write was already applied")
            }
            Err(err) => tracing::warn!(operation = %key, error = %err, "{}", key.kind.failure_message()),
        }
    }

    /// Run a command body under its key
    async fn track<T, F>(&self, key: OperationKey, body: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.begin(key)?;
        let outcome = body.await;
        self.settle(key, outcome.as_ref().map(|_| Reconciled::Applied));
        outcome
    }

    /// Run a positional command body; a superseded result is recorded as such
    async fn track_positional<F>(&self, key: OperationKey, body: F) -> Result<Reconciled>
    where
        F: Future<Output = Result<Reconciled>>,
    {
        self.begin(key)?;
        let outcome = body.await;
        self.settle(key, outcome.as_ref().copied());
        outcome
    }

    /// Key targeting the active board, when there is one
    fn board_key(&self, kind: OperationKind) -> OperationKey {
        OperationKey {
            kind,
            target: self.read(|state| state.lists_board_id).ok().flatten(),
        }
    }
}
