//! Advisory mutual exclusion between sweeps targeting the same function.

use std::collections::BTreeSet;
use std::sync::Mutex;

use thiserror::Error;

use crate::contract::FunctionIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("another sweep holds the lock for {0}")]
    Held(String),
    #[error("failed to acquire lock for {function}: {message}")]
    Unavailable { function: String, message: String },
}

pub trait FunctionLock {
    fn acquire(&self, identity: &FunctionIdentity) -> Result<(), LockError>;

    fn release(&self, identity: &FunctionIdentity);
}

/// Assumes the caller guarantees exclusivity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl FunctionLock for NoLock {
    fn acquire(&self, _identity: &FunctionIdentity) -> Result<(), LockError> {
        Ok(())
    }

    fn release(&self, _identity: &FunctionIdentity) {}
}

/// Locks shared by sweeps running inside one process.
#[derive(Debug, Default)]
pub struct InProcessLocks {
    held: Mutex<BTreeSet<String>>,
}

impl InProcessLocks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FunctionLock for InProcessLocks {
    fn acquire(&self, identity: &FunctionIdentity) -> Result<(), LockError> {
        let mut held = self.held.lock().map_err(|error| LockError::Unavailable {
            function: identity.to_string(),
            message: error.to_string(),
        })?;

        if !held.insert(identity.as_str().to_string()) {
            return Err(LockError::Held(identity.to_string()));
        }
        Ok(())
    }

    fn release(&self, identity: &FunctionIdentity) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(identity.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> FunctionIdentity {
        FunctionIdentity::parse(&format!(
            "arn:aws:lambda:eu-west-1:123456789012:function:{name}"
        ))
        .expect("identity")
    }

    #[test]
    fn second_acquire_for_same_function_is_rejected() {
        let locks = InProcessLocks::new();
        let checkout = identity("checkout");

        locks.acquire(&checkout).expect("first acquire");
        let error = locks.acquire(&checkout).expect_err("second acquire should fail");

        assert!(matches!(error, LockError::Held(_)));
        assert!(locks.acquire(&identity("billing")).is_ok());
    }

    #[test]
    fn release_allows_reacquire() {
        let locks = InProcessLocks::new();
        let checkout = identity("checkout");

        locks.acquire(&checkout).expect("acquire");
        locks.release(&checkout);

        assert!(locks.acquire(&checkout).is_ok());
    }
}
