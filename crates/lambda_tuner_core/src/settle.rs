//! Strategies for waiting until a memory update is live.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cancel::CancellationFlag;
use crate::client::{RemoteError, RemoteExecutionClient};
use crate::contract::{FunctionIdentity, UpdateStatus};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(8);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

const SLEEP_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    #[error("sweep cancelled while waiting for configuration update")]
    Cancelled,
    #[error("configuration update failed: {0}")]
    UpdateFailed(String),
    #[error("configuration update still in progress after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub trait Settle {
    fn settle(
        &self,
        client: &dyn RemoteExecutionClient,
        identity: &FunctionIdentity,
        cancel: &CancellationFlag,
    ) -> Result<(), SettleError>;
}

/// Fixed pause after each reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn none() -> Self {
        Self(Duration::ZERO)
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_SETTLE_DELAY)
    }
}

impl Settle for FixedDelay {
    fn settle(
        &self,
        _client: &dyn RemoteExecutionClient,
        _identity: &FunctionIdentity,
        cancel: &CancellationFlag,
    ) -> Result<(), SettleError> {
        sleep_unless_cancelled(self.0, cancel)
    }
}

/// Polls the function's last update status until it reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollUntilActive {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollUntilActive {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl Settle for PollUntilActive {
    fn settle(
        &self,
        client: &dyn RemoteExecutionClient,
        identity: &FunctionIdentity,
        cancel: &CancellationFlag,
    ) -> Result<(), SettleError> {
        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return Err(SettleError::Cancelled);
            }

            match client.update_status(identity)? {
                UpdateStatus::Successful => return Ok(()),
                UpdateStatus::Failed(reason) => return Err(SettleError::UpdateFailed(reason)),
                UpdateStatus::InProgress => {
                    tracing::debug!(function = %identity, "configuration update in progress");
                }
            }

            if started.elapsed() >= self.timeout {
                return Err(SettleError::TimedOut(self.timeout));
            }
            sleep_unless_cancelled(self.interval, cancel)?;
        }
    }
}

fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationFlag) -> Result<(), SettleError> {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return Err(SettleError::Cancelled);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::contract::{FunctionConfiguration, InvocationOutcome};

    struct StatusSequence {
        statuses: Mutex<VecDeque<UpdateStatus>>,
        polls: Mutex<usize>,
    }

    impl StatusSequence {
        fn new(statuses: Vec<UpdateStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> usize {
            *self.polls.lock().expect("poisoned mutex")
        }
    }

    impl RemoteExecutionClient for StatusSequence {
        fn get_configuration(
            &self,
            _identity: &FunctionIdentity,
        ) -> Result<FunctionConfiguration, RemoteError> {
            *self.polls.lock().expect("poisoned mutex") += 1;
            let status = self
                .statuses
                .lock()
                .expect("poisoned mutex")
                .pop_front()
                .unwrap_or(UpdateStatus::InProgress);
            Ok(FunctionConfiguration::new(128, Vec::new())
                .expect("config")
                .with_update_status(status))
        }

        fn set_memory(&self, _identity: &FunctionIdentity, _memory: u32) -> Result<(), RemoteError> {
            Ok(())
        }

        fn invoke(
            &self,
            _identity: &FunctionIdentity,
            _payload: Option<&[u8]>,
        ) -> Result<InvocationOutcome, RemoteError> {
            Ok(InvocationOutcome::default())
        }
    }

    fn identity() -> FunctionIdentity {
        FunctionIdentity::parse("arn:aws:lambda:eu-west-1:123456789012:function:f")
            .expect("identity")
    }

    fn fast_poll(timeout: Duration) -> PollUntilActive {
        PollUntilActive {
            interval: Duration::ZERO,
            timeout,
        }
    }

    #[test]
    fn zero_delay_returns_immediately() {
        let client = StatusSequence::new(Vec::new());
        let result = FixedDelay::none().settle(&client, &identity(), &CancellationFlag::new());
        assert_eq!(result, Ok(()));
        assert_eq!(client.polls(), 0);
    }

    #[test]
    fn fixed_delay_observes_cancellation() {
        let client = StatusSequence::new(Vec::new());
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let started = Instant::now();
        let result = FixedDelay(Duration::from_secs(30)).settle(&client, &identity(), &cancel);

        assert_eq!(result, Err(SettleError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn polling_waits_for_successful_status() {
        let client = StatusSequence::new(vec![
            UpdateStatus::InProgress,
            UpdateStatus::InProgress,
            UpdateStatus::Successful,
        ]);

        let result = fast_poll(Duration::from_secs(5)).settle(
            &client,
            &identity(),
            &CancellationFlag::new(),
        );

        assert_eq!(result, Ok(()));
        assert_eq!(client.polls(), 3);
    }

    #[test]
    fn polling_surfaces_failed_updates() {
        let client = StatusSequence::new(vec![UpdateStatus::Failed("quota".to_string())]);
        let result = fast_poll(Duration::from_secs(5)).settle(
            &client,
            &identity(),
            &CancellationFlag::new(),
        );
        assert_eq!(result, Err(SettleError::UpdateFailed("quota".to_string())));
    }

    #[test]
    fn polling_times_out() {
        let client = StatusSequence::new(Vec::new());
        let result =
            fast_poll(Duration::ZERO).settle(&client, &identity(), &CancellationFlag::new());
        assert_eq!(result, Err(SettleError::TimedOut(Duration::ZERO)));
    }
}
