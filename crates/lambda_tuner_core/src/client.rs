use thiserror::Error;

use crate::contract::{FunctionConfiguration, FunctionIdentity, InvocationOutcome, UpdateStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct RemoteError {
    pub operation: &'static str,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// The compute platform as seen by the sweep.
///
/// `set_memory` returning `Ok` only means the update was accepted; the new
/// size may not be active for the next invocation yet.
pub trait RemoteExecutionClient {
    fn get_configuration(
        &self,
        identity: &FunctionIdentity,
    ) -> Result<FunctionConfiguration, RemoteError>;

    fn set_memory(&self, identity: &FunctionIdentity, memory_size: u32)
        -> Result<(), RemoteError>;

    fn invoke(
        &self,
        identity: &FunctionIdentity,
        payload: Option<&[u8]>,
    ) -> Result<InvocationOutcome, RemoteError>;

    fn update_status(&self, identity: &FunctionIdentity) -> Result<UpdateStatus, RemoteError> {
        self.get_configuration(identity)
            .map(|configuration| configuration.last_update_status)
    }
}
