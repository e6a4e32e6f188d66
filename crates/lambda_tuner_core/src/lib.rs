//! Memory sweep domain for tuning a serverless function.
//!
//! This crate owns the deterministic sweep behavior: pricing, duration
//! extraction, the reconfigure/invoke/measure state machine and sweet-spot
//! selection. It intentionally excludes AWS SDK and runtime concerns, which
//! live behind [`client::RemoteExecutionClient`].

pub mod cancel;
pub mod client;
pub mod contract;
pub mod lock;
pub mod metrics;
pub mod orchestrator;
pub mod pricing;
pub mod selector;
pub mod settle;

pub use cancel::CancellationFlag;
pub use client::{RemoteError, RemoteExecutionClient};
pub use contract::{
    normalize_payload, Architecture, FunctionConfiguration, FunctionIdentity, InvocationOutcome,
    SweepResult, UpdateStatus, ValidationError,
};
pub use metrics::{extract_duration_ms, ExtractError};
pub use orchestrator::{
    run_sweep, RestorationOutcome, SkipReason, SkippedCandidate, SweepEngine, SweepError,
    SweepProgress, SweepReport, SweepRequest,
};
pub use pricing::{PricingCatalog, PricingError, PricingTable};
pub use selector::{select_best, select_best_measured, SelectError, SweetSpots};
pub use settle::{FixedDelay, PollUntilActive, Settle, SettleError};
