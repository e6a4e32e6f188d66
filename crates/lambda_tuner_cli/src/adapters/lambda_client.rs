use std::future::Future;

use aws_sdk_lambda::config::Region;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{InvocationType, LastUpdateStatus, LogType};
use lambda_tuner_core::{
    FunctionConfiguration, FunctionIdentity, InvocationOutcome, RemoteError,
    RemoteExecutionClient, UpdateStatus,
};

const GET_CONFIGURATION: &str = "GetFunctionConfiguration";
const UPDATE_CONFIGURATION: &str = "UpdateFunctionConfiguration";
const INVOKE: &str = "Invoke";

/// Lambda control and data plane calls bound to one region.
///
/// The calls are synchronous from the sweep's point of view and must run on a
/// thread that has a multi-threaded tokio runtime in context.
#[derive(Clone)]
pub struct AwsLambdaClient {
    lambda_client: aws_sdk_lambda::Client,
}

impl AwsLambdaClient {
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::from_client(aws_sdk_lambda::Client::new(&config))
    }

    pub fn from_client(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

impl RemoteExecutionClient for AwsLambdaClient {
    fn get_configuration(
        &self,
        identity: &FunctionIdentity,
    ) -> Result<FunctionConfiguration, RemoteError> {
        let client = self.lambda_client.clone();
        let function_name = identity.as_str().to_string();

        let output = block_on(async move {
            client
                .get_function_configuration()
                .function_name(function_name)
                .send()
                .await
        })
        .map_err(|error| sdk_error(GET_CONFIGURATION, error))?;

        let memory_size = output
            .memory_size()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| {
                RemoteError::new(GET_CONFIGURATION, "response carried no memory size")
            })?;
        let architectures = output
            .architectures()
            .iter()
            .map(|architecture| architecture.as_str().to_string())
            .collect();
        let status = match output.last_update_status() {
            Some(LastUpdateStatus::InProgress) => UpdateStatus::InProgress,
            Some(LastUpdateStatus::Failed) => UpdateStatus::Failed(
                output
                    .last_update_status_reason()
                    .unwrap_or("no reason reported")
                    .to_string(),
            ),
            _ => UpdateStatus::Successful,
        };

        FunctionConfiguration::new(memory_size, architectures)
            .map(|configuration| configuration.with_update_status(status))
            .map_err(|error| RemoteError::new(GET_CONFIGURATION, error.message()))
    }

    fn set_memory(&self, identity: &FunctionIdentity, memory_size: u32) -> Result<(), RemoteError> {
        let memory_size = i32::try_from(memory_size).map_err(|_| {
            RemoteError::new(
                UPDATE_CONFIGURATION,
                format!("memory size {memory_size} MB is out of range"),
            )
        })?;
        let client = self.lambda_client.clone();
        let function_name = identity.as_str().to_string();

        block_on(async move {
            client
                .update_function_configuration()
                .function_name(function_name)
                .memory_size(memory_size)
                .send()
                .await
        })
        .map(|_| ())
        .map_err(|error| sdk_error(UPDATE_CONFIGURATION, error))
    }

    fn invoke(
        &self,
        identity: &FunctionIdentity,
        payload: Option<&[u8]>,
    ) -> Result<InvocationOutcome, RemoteError> {
        let client = self.lambda_client.clone();
        let function_name = identity.as_str().to_string();
        let request_payload = payload.map(|bytes| Blob::new(bytes.to_vec()));

        let output = block_on(async move {
            client
                .invoke()
                .function_name(function_name)
                .invocation_type(InvocationType::RequestResponse)
                .log_type(LogType::Tail)
                .set_payload(request_payload)
                .send()
                .await
        })
        .map_err(|error| sdk_error(INVOKE, error))?;

        Ok(InvocationOutcome {
            log_result: output.log_result().unwrap_or_default().to_string(),
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
            function_error: output.function_error().map(str::to_string),
        })
    }
}

fn sdk_error(operation: &'static str, error: impl std::error::Error) -> RemoteError {
    RemoteError::new(operation, DisplayErrorContext(error).to_string())
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
