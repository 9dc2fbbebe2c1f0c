use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::codec::{self, FrameLimits};
use crate::service::InvocationService;
use crate::{FunctionClientError, Result};

// ─── FunctionClient ───────────────────────────────────────────────────────

/// Entry point for calling functions through an [`InvocationService`].
///
/// Cheap to clone; all clones share the same in-flight invocation table.
#[derive(Clone)]
pub struct FunctionClient {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn InvocationService>,
    limits: FrameLimits,
    next_invocation: AtomicI64,
    in_flight: Mutex<HashMap<i64, AbortHandle>>,
}

impl FunctionClient {
    pub fn new(service: Arc<dyn InvocationService>, limits: FrameLimits) -> Self {
        FunctionClient {
            inner: Arc::new(Inner {
                service,
                limits,
                next_invocation: AtomicI64::new(1),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Wrap `function_id`. No round-trip is made; an unknown id surfaces on
    /// the first invocation.
    pub fn get(&self, function_id: i64) -> Function {
        Function {
            function_id,
            client: self.clone(),
        }
    }

    /// Number of invocations that have not yet delivered a result.
    pub fn in_flight(&self) -> usize {
        self.inner.lock_in_flight().len()
    }
}

impl Inner {
    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<i64, AbortHandle>> {
        // A poisoned table only means a panicking thread held the lock; the
        // map itself is still consistent.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─── Function ─────────────────────────────────────────────────────────────

/// Handle for one function id.
#[derive(Clone)]
pub struct Function {
    pub function_id: i64,
    client: FunctionClient,
}

/// Returned immediately by [`Function::invoke`]; the result arrives on
/// `result` once the call completes or is interrupted.
#[derive(Debug)]
pub struct InvocationInfo {
    pub invocation_id: i64,
    pub result: oneshot::Receiver<InvocationResult>,
}

impl InvocationInfo {
    /// Await the completion notification.
    pub async fn wait(self) -> InvocationResult {
        let invocation_id = self.invocation_id;
        self.result.await.unwrap_or_else(|_| InvocationResult {
            invocation_id,
            outcome: Err(FunctionClientError::Task(
                "result channel closed before delivery".into(),
            )),
        })
    }
}

/// Outcome of one invocation: the decoded result blobs or the failure.
#[derive(Debug)]
pub struct InvocationResult {
    pub invocation_id: i64,
    pub outcome: Result<Vec<Bytes>>,
}

impl Function {
    /// Start an invocation with `args` packed as one frame.
    ///
    /// Must be called from within a Tokio runtime: the call itself runs on a
    /// spawned task so the caller can keep working or interrupt it.
    pub fn invoke<B: AsRef<[u8]>>(&self, args: &[B]) -> InvocationInfo {
        let inner = Arc::clone(&self.client.inner);
        let invocation_id = inner.next_invocation.fetch_add(1, Ordering::Relaxed);
        let function_id = self.function_id;
        let frame = codec::encode(args);
        let (tx, rx) = oneshot::channel();

        tracing::debug!(function_id, invocation_id, args = args.len(), "starting invocation");

        // The table stays locked until the abort handle is registered, so the
        // call task always finds its own entry when it settles.
        let call = {
            let mut table = inner.lock_in_flight();
            let task_inner = Arc::clone(&inner);
            let call = tokio::spawn(async move {
                let outcome = task_inner
                    .service
                    .invoke(function_id, frame)
                    .await
                    .and_then(|reply| codec::decode_with(&reply, &task_inner.limits));
                // Whoever removes the entry first decides the outcome: here the
                // call, in `interrupt` the caller.
                if task_inner.lock_in_flight().remove(&invocation_id).is_none() {
                    return Err(FunctionClientError::Interrupted(invocation_id));
                }
                outcome
            });
            table.insert(invocation_id, call.abort_handle());
            call
        };

        tokio::spawn(async move {
            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(FunctionClientError::Interrupted(invocation_id)),
                Err(e) => Err(FunctionClientError::Task(e.to_string())),
            };
            inner.lock_in_flight().remove(&invocation_id);
            let _ = tx.send(InvocationResult {
                invocation_id,
                outcome,
            });
        });

        InvocationInfo {
            invocation_id,
            result: rx,
        }
    }

    /// Abort an in-flight invocation. Its receiver then yields
    /// [`FunctionClientError::Interrupted`].
    pub fn interrupt(&self, invocation_id: i64) -> Result<()> {
        let handle = self
            .client
            .inner
            .lock_in_flight()
            .remove(&invocation_id)
            .ok_or(FunctionClientError::InvocationNotFound(invocation_id))?;
        tracing::debug!(function_id = self.function_id, invocation_id, "interrupting invocation");
        handle.abort();
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
