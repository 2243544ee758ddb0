//! Write operations with an observable lifecycle.
//!
//! A `MutationRunner` runs one write at a time. Success invalidates the
//! configured query keys before the caller's completion hook runs; failure is
//! recorded and left for the caller to resubmit.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{Invalidate, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<R, E> {
    pub status: MutationStatus,
    pub data: Option<R>,
    pub error: Option<E>,
    /// Identifier of the latest attempt, for correlating log lines.
    pub attempt: Option<Uuid>,
}

impl<R, E> MutationState<R, E> {
    pub fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
            attempt: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError<E> {
    #[error("a submission is already pending")]
    Pending,
    #[error("{0}")]
    Failed(E),
}

pub struct MutationRunner<R, E> {
    name: &'static str,
    state: watch::Sender<MutationState<R, E>>,
    target: Arc<dyn Invalidate>,
    invalidates: Vec<QueryKey>,
}

impl<R, E> MutationRunner<R, E>
where
    R: Clone,
    E: Clone + std::fmt::Display,
{
    pub fn new(
        name: &'static str,
        target: Arc<dyn Invalidate>,
        invalidates: Vec<QueryKey>,
    ) -> Self {
        let (state, _) = watch::channel(MutationState::idle());
        Self {
            name,
            state,
            target,
            invalidates,
        }
    }

    pub fn state(&self) -> MutationState<R, E> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState<R, E>> {
        self.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Return to idle, forgetting the last result. Ignored while pending.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            *state = MutationState::idle();
            true
        });
    }

    /// Run `op` unless another run is still pending.
    pub async fn run<Fut, S>(&self, op: Fut, on_success: S) -> Result<R, MutationError<E>>
    where
        Fut: Future<Output = Result<R, E>>,
        S: FnOnce(&R),
    {
        let attempt = Uuid::new_v4();
        let claimed = self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            *state = MutationState {
                status: MutationStatus::Pending,
                data: None,
                error: None,
                attempt: Some(attempt),
            };
            true
        });
        if !claimed {
            warn!(mutation = self.name, "Rejected submission while another is pending");
            return Err(MutationError::Pending);
        }
        info!(mutation = self.name, %attempt, "Mutation started");

        let mut guard = PendingGuard {
            state: &self.state,
            armed: true,
        };
        let result = op.await;
        guard.armed = false;

        match result {
            Ok(data) => {
                for key in &self.invalidates {
                    self.target.invalidate(key);
                }
                on_success(&data);
                self.state.send_modify(|state| {
                    state.status = MutationStatus::Success;
                    state.data = Some(data.clone());
                });
                info!(mutation = self.name, %attempt, "Mutation succeeded");
                Ok(data)
            }
            Err(err) => {
                warn!(mutation = self.name, %attempt, error = %err, "Mutation failed");
                self.state.send_modify(|state| {
                    state.status = MutationStatus::Error;
                    state.error = Some(err.clone());
                });
                Err(MutationError::Failed(err))
            }
        }
    }
}

/// Puts the runner back to idle if the awaiting caller is dropped mid-run.
struct PendingGuard<'a, R, E> {
    state: &'a watch::Sender<MutationState<R, E>>,
    armed: bool,
}

impl<R, E> Drop for PendingGuard<'_, R, E> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|state| state.status = MutationStatus::Idle);
        }
    }
}
