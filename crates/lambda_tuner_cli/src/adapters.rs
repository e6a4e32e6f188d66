//! Runtime integrations: the AWS Lambda client and lock files.

pub mod lambda_client;
pub mod lock_file;
