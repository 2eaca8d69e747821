//! Runs the path engine off the interactive thread.
//!
//! Only the most recent request is ever current. Submitting a new request
//! cancels the previous computation cooperatively and, because a blocking
//! worker cannot be preempted, every completion is checked against the
//! current request under the dispatcher lock before it is delivered. A result
//! for a superseded request never reaches the result channel.

use super::engine::PathEngine;
use super::request::{CancelToken, PathRequest, PathResult, RequestId};
use crate::common::{DomainError, DomainResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

pub const DEFAULT_COMPUTE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Idle,
    Running(RequestId),
}

struct Outstanding {
    request_id: RequestId,
    cancel: CancelToken,
}

struct DispatchState {
    current: Option<Outstanding>,
    results: mpsc::UnboundedSender<PathResult>,
    delivered: u64,
    discarded: u64,
}

#[derive(Clone)]
pub struct ComputationDispatcher {
    engine: Arc<dyn PathEngine>,
    state: Arc<Mutex<DispatchState>>,
    runtime: Handle,
    compute_timeout: Duration,
}

fn lock(state: &Mutex<DispatchState>) -> MutexGuard<'_, DispatchState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn current_runtime() -> DomainResult<Handle> {
    Handle::try_current().map_err(|e| {
        DomainError::InfrastructureError(format!("dispatcher needs a tokio runtime: {}", e))
    })
}

impl ComputationDispatcher {
    /// Create a dispatcher together with the receiving end of its result channel.
    pub fn new(
        engine: Arc<dyn PathEngine>,
        compute_timeout: Duration,
    ) -> DomainResult<(Self, mpsc::UnboundedReceiver<PathResult>)> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok((Self::with_sender(engine, compute_timeout, sender)?, receiver))
    }

    pub fn with_sender(
        engine: Arc<dyn PathEngine>,
        compute_timeout: Duration,
        results: mpsc::UnboundedSender<PathResult>,
    ) -> DomainResult<Self> {
        Ok(Self {
            engine,
            state: Arc::new(Mutex::new(DispatchState {
                current: None,
                results,
                delivered: 0,
                discarded: 0,
            })),
            runtime: current_runtime()?,
            compute_timeout,
        })
    }

    /// Create a dispatcher that hands every delivered result to `callback`.
    pub fn on_result<F>(
        engine: Arc<dyn PathEngine>,
        compute_timeout: Duration,
        mut callback: F,
    ) -> DomainResult<Self>
    where
        F: FnMut(PathResult) + Send + 'static,
    {
        let (dispatcher, mut receiver) = Self::new(engine, compute_timeout)?;
        dispatcher.runtime.spawn(async move {
            while let Some(result) = receiver.recv().await {
                callback(result);
            }
        });
        Ok(dispatcher)
    }

    pub fn status(&self) -> DispatchStatus {
        match &lock(&self.state).current {
            Some(outstanding) => DispatchStatus::Running(outstanding.request_id),
            None => DispatchStatus::Idle,
        }
    }

    /// Number of results delivered and discarded so far.
    pub fn counters(&self) -> (u64, u64) {
        let state = lock(&self.state);
        (state.delivered, state.discarded)
    }

    /// Fire and forget. Replaces any outstanding request and returns immediately.
    pub fn submit(&self, request: PathRequest) {
        let request_id = request.id;
        let cancel = CancelToken::new();
        {
            let mut state = lock(&self.state);
            let previous = state.current.replace(Outstanding {
                request_id,
                cancel: cancel.clone(),
            });
            if let Some(previous) = previous {
                previous.cancel.cancel();
                tracing::debug!(
                    superseded = previous.request_id,
                    by = request_id,
                    "superseding in-flight computation"
                );
            }
        }

        if let Err(e) = request.validate() {
            tracing::warn!(request_id, error = %e, "rejecting request before dispatch");
            deliver(&self.state, PathResult::from_engine(request_id, Err(e)));
            return;
        }

        tracing::debug!(request_id, "dispatching computation");
        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let timeout = self.compute_timeout;
        self.runtime.spawn(async move {
            let worker_cancel = cancel.clone();
            let worker = tokio::task::spawn_blocking(move || engine.compute(&request, &worker_cancel));
            let result = match tokio::time::timeout(timeout, worker).await {
                Ok(Ok(result)) => PathResult::from_engine(request_id, result),
                Ok(Err(join_error)) => {
                    tracing::error!(request_id, error = %join_error, "path computation faulted");
                    PathResult::failed(request_id, "internal error")
                }
                Err(_) => {
                    cancel.cancel();
                    tracing::warn!(request_id, ?timeout, "path computation timed out");
                    PathResult::failed(request_id, format!("timed out after {:?}", timeout))
                }
            };
            deliver(&state, result);
        });
    }
}

/// Forward `result` only if it answers the current request.
fn deliver(state: &Mutex<DispatchState>, result: PathResult) {
    let mut state = lock(state);
    let is_current = matches!(&state.current, Some(o) if o.request_id == result.request_id);
    if !is_current {
        state.discarded += 1;
        tracing::debug!(request_id = result.request_id, "discarding superseded result");
        return;
    }
    state.current = None;
    state.delivered += 1;
    if state.results.send(result).is_err() {
        tracing::warn!("result receiver dropped, nobody is listening for paths");
    }
}
