use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use lambda_tuner_core::{
    CancellationFlag, FunctionConfiguration, FunctionIdentity, InvocationOutcome, RemoteError,
    RemoteExecutionClient, UpdateStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetConfiguration,
    SetMemory(u32),
    Invoke { memory_size: u32 },
}

/// Fake platform driven by per-memory-size scripts. Every call is recorded.
///
/// With `with_update_conflicts`, an accepted update stays in flight until a
/// configuration read reports a status other than `InProgress`, and any
/// `set_memory` in the meantime is rejected like the real platform does.
pub struct ScriptedClient {
    baseline: Result<FunctionConfiguration, RemoteError>,
    logs: BTreeMap<u32, String>,
    failing_reconfigurations: BTreeSet<u32>,
    failing_invocations: BTreeSet<u32>,
    fail_restore: bool,
    panic_on_invoke: Option<u32>,
    cancel_on_invoke: Option<(u32, CancellationFlag)>,
    cancel_on_set_memory: Option<(u32, CancellationFlag)>,
    update_conflicts: bool,
    pending_status: UpdateStatus,
    update_in_flight: Mutex<bool>,
    current_memory: Mutex<u32>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(original_memory: u32, architectures: &[&str]) -> Self {
        let baseline = FunctionConfiguration::new(
            original_memory,
            architectures.iter().map(|label| label.to_string()).collect(),
        )
        .expect("baseline config");
        Self {
            baseline: Ok(baseline),
            logs: BTreeMap::new(),
            failing_reconfigurations: BTreeSet::new(),
            failing_invocations: BTreeSet::new(),
            fail_restore: false,
            panic_on_invoke: None,
            cancel_on_invoke: None,
            cancel_on_set_memory: None,
            update_conflicts: false,
            pending_status: UpdateStatus::Successful,
            update_in_flight: Mutex::new(false),
            current_memory: Mutex::new(original_memory),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_baseline(message: &str) -> Self {
        let mut client = Self::new(128, &[]);
        client.baseline = Err(RemoteError::new("GetFunctionConfiguration", message));
        client
    }

    pub fn with_log(mut self, memory_size: u32, log_result: impl Into<String>) -> Self {
        self.logs.insert(memory_size, log_result.into());
        self
    }

    pub fn with_failing_reconfiguration(mut self, memory_size: u32) -> Self {
        self.failing_reconfigurations.insert(memory_size);
        self
    }

    pub fn with_failing_invocation(mut self, memory_size: u32) -> Self {
        self.failing_invocations.insert(memory_size);
        self
    }

    pub fn with_failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn with_panic_on_invoke(mut self, memory_size: u32) -> Self {
        self.panic_on_invoke = Some(memory_size);
        self
    }

    pub fn with_cancel_on_invoke(mut self, memory_size: u32, flag: CancellationFlag) -> Self {
        self.cancel_on_invoke = Some((memory_size, flag));
        self
    }

    pub fn with_cancel_on_set_memory(mut self, memory_size: u32, flag: CancellationFlag) -> Self {
        self.cancel_on_set_memory = Some((memory_size, flag));
        self
    }

    pub fn with_update_conflicts(mut self) -> Self {
        self.update_conflicts = true;
        self
    }

    /// Status reported while an accepted update is in flight.
    pub fn with_pending_status(mut self, status: UpdateStatus) -> Self {
        self.pending_status = status;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn set_memory_calls(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetMemory(memory_size) => Some(memory_size),
                _ => None,
            })
            .collect()
    }

    pub fn current_memory(&self) -> u32 {
        *self.current_memory.lock().expect("poisoned mutex")
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }

    fn original_memory(&self) -> Option<u32> {
        self.baseline.as_ref().ok().map(|config| config.memory_size)
    }
}

impl RemoteExecutionClient for ScriptedClient {
    fn get_configuration(
        &self,
        _identity: &FunctionIdentity,
    ) -> Result<FunctionConfiguration, RemoteError> {
        self.record(Call::GetConfiguration);
        let baseline = self.baseline.clone()?;

        let mut in_flight = self.update_in_flight.lock().expect("poisoned mutex");
        if !*in_flight {
            return Ok(baseline);
        }
        if self.pending_status != UpdateStatus::InProgress {
            *in_flight = false;
        }
        Ok(baseline.with_update_status(self.pending_status.clone()))
    }

    fn set_memory(&self, _identity: &FunctionIdentity, memory_size: u32) -> Result<(), RemoteError> {
        self.record(Call::SetMemory(memory_size));

        let mut in_flight = self.update_in_flight.lock().expect("poisoned mutex");
        if self.update_conflicts && *in_flight {
            return Err(RemoteError::new(
                "UpdateFunctionConfiguration",
                "ResourceConflictException: an update is in progress",
            ));
        }

        let is_restore = self.original_memory() == Some(memory_size);
        if (is_restore && self.fail_restore)
            || (!is_restore && self.failing_reconfigurations.contains(&memory_size))
        {
            return Err(RemoteError::new(
                "UpdateFunctionConfiguration",
                format!("ResourceConflictException at {memory_size} MB"),
            ));
        }

        *self.current_memory.lock().expect("poisoned mutex") = memory_size;
        *in_flight = true;
        if let Some((at, flag)) = &self.cancel_on_set_memory {
            if *at == memory_size {
                flag.cancel();
            }
        }
        Ok(())
    }

    fn invoke(
        &self,
        _identity: &FunctionIdentity,
        _payload: Option<&[u8]>,
    ) -> Result<InvocationOutcome, RemoteError> {
        let memory_size = self.current_memory();
        self.record(Call::Invoke { memory_size });

        if self.panic_on_invoke == Some(memory_size) {
            panic!("scripted panic at {memory_size} MB");
        }
        if let Some((at, flag)) = &self.cancel_on_invoke {
            if *at == memory_size {
                flag.cancel();
            }
        }
        if self.failing_invocations.contains(&memory_size) {
            return Err(RemoteError::new("Invoke", "TooManyRequestsException"));
        }

        Ok(InvocationOutcome {
            log_result: self.logs.get(&memory_size).cloned().unwrap_or_default(),
            payload: b"{\"ok\":true}".to_vec(),
            function_error: None,
        })
    }
}

pub fn identity() -> FunctionIdentity {
    FunctionIdentity::parse("arn:aws:lambda:eu-west-1:123456789012:function:checkout")
        .expect("identity")
}
