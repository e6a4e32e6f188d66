//! Sequential memory sweep against one function.
//!
//! `Idle → CapturingBaseline → Sweeping(i) → Restoring → Done`. Once the
//! baseline is known, restoration to the original memory size happens exactly
//! once on every exit path, including cancellation and panics inside the
//! sweep loop.
//!
//! An accepted memory update that never confirmed settling (cancelled or
//! failed wait) is waited out before the next `set_memory`, because the
//! platform rejects configuration changes while one is still in progress.

use serde::Serialize;
use thiserror::Error;

use crate::cancel::CancellationFlag;
use crate::client::{RemoteError, RemoteExecutionClient};
use crate::contract::{Architecture, FunctionIdentity, SweepResult};
use crate::lock::{FunctionLock, LockError, NoLock};
use crate::metrics::extract_duration_ms;
use crate::pricing::{PricingCatalog, PricingTable};
use crate::settle::{Settle, SettleError};

static NO_LOCK: NoLock = NoLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepRequest {
    pub identity: FunctionIdentity,
    /// `None` sweeps every size of the function's pricing table.
    pub candidate_sizes: Option<Vec<u32>>,
    pub payload: Option<Vec<u8>>,
}

impl SweepRequest {
    pub fn new(identity: FunctionIdentity) -> Self {
        Self {
            identity,
            candidate_sizes: None,
            payload: None,
        }
    }

    pub fn with_candidate_sizes(mut self, sizes: Vec<u32>) -> Self {
        self.candidate_sizes = Some(sizes);
        self
    }

    pub fn with_payload(mut self, payload: Option<Vec<u8>>) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    CapturingBaseline,
    Sweeping(usize),
    Restoring,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    NotPriced,
    Reconfiguration(String),
    Settle(String),
    Invocation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    pub memory_size: u32,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RestorationOutcome {
    Restored { memory_size: u32 },
    Failed { memory_size: u32, message: String },
}

impl RestorationOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub function: FunctionIdentity,
    pub architecture: Architecture,
    pub original_memory: u32,
    pub results: Vec<SweepResult>,
    pub skipped: Vec<SkippedCandidate>,
    pub restoration: RestorationOutcome,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum SweepProgress<'a> {
    Planned { candidates: usize },
    CandidateStarted { index: usize, memory_size: u32 },
    CandidateSkipped(&'a SkippedCandidate),
    CandidateMeasured(&'a SweepResult),
    Restoring { memory_size: u32 },
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to capture baseline configuration for {function}: {source}")]
    BaselineCapture {
        function: String,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    LockUnavailable(#[from] LockError),
}

enum CandidateFailure {
    Skipped(SkipReason),
    Cancelled,
}

pub struct SweepEngine<'a> {
    client: &'a dyn RemoteExecutionClient,
    pricing: &'a PricingCatalog,
    settle: &'a dyn Settle,
    lock: &'a dyn FunctionLock,
    cancel: CancellationFlag,
}

impl<'a> SweepEngine<'a> {
    pub fn new(
        client: &'a dyn RemoteExecutionClient,
        pricing: &'a PricingCatalog,
        settle: &'a dyn Settle,
    ) -> Self {
        Self {
            client,
            pricing,
            settle,
            lock: &NO_LOCK,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_lock(mut self, lock: &'a dyn FunctionLock) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(
        &self,
        request: &SweepRequest,
        on_progress: &mut dyn FnMut(SweepProgress<'_>),
    ) -> Result<SweepReport, SweepError> {
        let identity = &request.identity;
        let mut state = SweepState::Idle;

        self.lock.acquire(identity)?;
        let lease = LeaseGuard {
            lock: self.lock,
            identity,
        };

        advance(&mut state, SweepState::CapturingBaseline);
        let baseline = self.client.get_configuration(identity).map_err(|source| {
            tracing::error!(function = %identity, error = %source, "baseline capture failed");
            SweepError::BaselineCapture {
                function: identity.to_string(),
                source,
            }
        })?;

        let architecture = baseline.architecture();
        let original_memory = baseline.memory_size;
        let table = self.pricing.table(architecture);
        tracing::info!(
            function = %identity,
            architecture = %architecture,
            original_memory_mb = original_memory,
            "captured baseline configuration"
        );

        let restore = RestoreGuard::new(self.client, identity, original_memory);

        let (candidates, mut skipped) = plan_candidates(request.candidate_sizes.as_deref(), table);
        for entry in &skipped {
            on_progress(SweepProgress::CandidateSkipped(entry));
        }
        on_progress(SweepProgress::Planned {
            candidates: candidates.len(),
        });

        let mut results: Vec<SweepResult> = Vec::with_capacity(candidates.len());
        let mut cancelled = false;
        let mut unsettled = false;

        for (index, &(memory_size, price_per_ms)) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            if unsettled {
                self.wait_for_pending_update(identity);
                unsettled = false;
            }

            advance(&mut state, SweepState::Sweeping(index));
            on_progress(SweepProgress::CandidateStarted { index, memory_size });

            let measured = self.measure_candidate(
                identity,
                memory_size,
                price_per_ms,
                request.payload.as_deref(),
            );
            match measured {
                Ok(result) => {
                    results.push(result);
                    if let Some(result) = results.last() {
                        on_progress(SweepProgress::CandidateMeasured(result));
                    }
                }
                Err(CandidateFailure::Skipped(reason)) => {
                    unsettled = matches!(reason, SkipReason::Settle(_));
                    skipped.push(SkippedCandidate {
                        memory_size,
                        reason,
                    });
                    if let Some(entry) = skipped.last() {
                        on_progress(SweepProgress::CandidateSkipped(entry));
                    }
                }
                Err(CandidateFailure::Cancelled) => {
                    cancelled = true;
                    unsettled = true;
                    break;
                }
            }
        }

        if cancelled {
            tracing::warn!(
                function = %identity,
                measured = results.len(),
                "sweep cancelled, restoring original configuration"
            );
        }

        advance(&mut state, SweepState::Restoring);
        on_progress(SweepProgress::Restoring {
            memory_size: original_memory,
        });
        if unsettled {
            self.wait_for_pending_update(identity);
        }
        let restoration = restore.restore();
        drop(lease);

        advance(&mut state, SweepState::Done);
        Ok(SweepReport {
            function: identity.clone(),
            architecture,
            original_memory,
            results,
            skipped,
            restoration,
            cancelled,
        })
    }

    /// Waits for the last accepted update with a fresh settle pass that
    /// ignores cancellation. A failure here is logged; the caller still
    /// attempts its next update.
    fn wait_for_pending_update(&self, identity: &FunctionIdentity) {
        tracing::info!(function = %identity, "waiting for in-flight configuration update");
        if let Err(error) = self.settle.settle(self.client, identity, &CancellationFlag::new()) {
            tracing::warn!(function = %identity, error = %error, "in-flight configuration update did not settle");
        }
    }

    fn measure_candidate(
        &self,
        identity: &FunctionIdentity,
        memory_size: u32,
        price_per_ms: f64,
        payload: Option<&[u8]>,
    ) -> Result<SweepResult, CandidateFailure> {
        if let Err(error) = self.client.set_memory(identity, memory_size) {
            tracing::warn!(memory_mb = memory_size, error = %error, "reconfiguration failed, skipping");
            return Err(CandidateFailure::Skipped(SkipReason::Reconfiguration(
                error.to_string(),
            )));
        }

        match self.settle.settle(self.client, identity, &self.cancel) {
            Ok(()) => {}
            Err(SettleError::Cancelled) => return Err(CandidateFailure::Cancelled),
            Err(error) => {
                tracing::warn!(memory_mb = memory_size, error = %error, "configuration did not settle, skipping");
                return Err(CandidateFailure::Skipped(SkipReason::Settle(error.to_string())));
            }
        }

        let outcome = match self.client.invoke(identity, payload) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(memory_mb = memory_size, error = %error, "invocation failed, skipping");
                return Err(CandidateFailure::Skipped(SkipReason::Invocation(
                    error.to_string(),
                )));
            }
        };

        if let Some(function_error) = &outcome.function_error {
            tracing::warn!(memory_mb = memory_size, function_error = %function_error, "function reported an error");
        }

        match extract_duration_ms(&outcome.log_result) {
            Ok(duration_ms) => {
                let result =
                    SweepResult::measured(memory_size, duration_ms, price_per_ms, outcome.log_result);
                tracing::info!(
                    memory_mb = memory_size,
                    duration_ms,
                    cost = result.cost(),
                    "measured candidate"
                );
                Ok(result)
            }
            Err(error) => {
                tracing::warn!(memory_mb = memory_size, error = %error, "could not extract duration");
                Ok(SweepResult::degraded(
                    memory_size,
                    price_per_ms,
                    outcome.log_result,
                    error.to_string(),
                ))
            }
        }
    }
}

/// Runs a sweep without locking, cancellation or progress reporting.
pub fn run_sweep(
    request: &SweepRequest,
    client: &dyn RemoteExecutionClient,
    pricing: &PricingCatalog,
    settle: &dyn Settle,
) -> Result<SweepReport, SweepError> {
    SweepEngine::new(client, pricing, settle).run(request, &mut |_: SweepProgress<'_>| {})
}

fn advance(state: &mut SweepState, next: SweepState) {
    tracing::debug!(from = ?*state, to = ?next, "sweep state transition");
    *state = next;
}

/// Ascending, de-duplicated candidates paired with their price. Sizes missing
/// from the table are reported as skipped.
fn plan_candidates(
    requested: Option<&[u32]>,
    table: &PricingTable,
) -> (Vec<(u32, f64)>, Vec<SkippedCandidate>) {
    let mut sizes = match requested {
        Some(sizes) => sizes.to_vec(),
        None => table.memory_sizes(),
    };
    sizes.sort_unstable();
    sizes.dedup();

    let mut candidates = Vec::with_capacity(sizes.len());
    let mut skipped = Vec::new();
    for memory_size in sizes {
        match table.price_per_ms(memory_size) {
            Some(price) => candidates.push((memory_size, price)),
            None => {
                tracing::warn!(memory_mb = memory_size, "no price for memory size, skipping");
                skipped.push(SkippedCandidate {
                    memory_size,
                    reason: SkipReason::NotPriced,
                });
            }
        }
    }

    (candidates, skipped)
}

struct LeaseGuard<'a> {
    lock: &'a dyn FunctionLock,
    identity: &'a FunctionIdentity,
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.identity);
    }
}

struct RestoreGuard<'a> {
    client: &'a dyn RemoteExecutionClient,
    identity: &'a FunctionIdentity,
    original_memory: u32,
    done: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(
        client: &'a dyn RemoteExecutionClient,
        identity: &'a FunctionIdentity,
        original_memory: u32,
    ) -> Self {
        Self {
            client,
            identity,
            original_memory,
            done: false,
        }
    }

    fn restore(mut self) -> RestorationOutcome {
        self.done = true;
        restore_memory(self.client, self.identity, self.original_memory)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.done = true;
            restore_memory(self.client, self.identity, self.original_memory);
        }
    }
}

fn restore_memory(
    client: &dyn RemoteExecutionClient,
    identity: &FunctionIdentity,
    original_memory: u32,
) -> RestorationOutcome {
    tracing::info!(function = %identity, memory_mb = original_memory, "restoring original memory size");
    match client.set_memory(identity, original_memory) {
        Ok(()) => RestorationOutcome::Restored {
            memory_size: original_memory,
        },
        Err(error) => {
            tracing::error!(
                function = %identity,
                memory_mb = original_memory,
                error = %error,
                "failed to restore original memory size"
            );
            RestorationOutcome::Failed {
                memory_size: original_memory,
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PricingTable {
        PricingTable::from_entries([(128, 0.1), (512, 0.4), (1024, 0.8)])
    }

    #[test]
    fn plan_defaults_to_every_priced_size() {
        let (candidates, skipped) = plan_candidates(None, &table());
        assert_eq!(candidates, vec![(128, 0.1), (512, 0.4), (1024, 0.8)]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn plan_sorts_dedups_and_skips_unpriced_sizes() {
        let (candidates, skipped) = plan_candidates(Some(&[1024, 256, 128, 1024]), &table());

        assert_eq!(candidates, vec![(128, 0.1), (1024, 0.8)]);
        assert_eq!(
            skipped,
            vec![SkippedCandidate {
                memory_size: 256,
                reason: SkipReason::NotPriced,
            }]
        );
    }
}
