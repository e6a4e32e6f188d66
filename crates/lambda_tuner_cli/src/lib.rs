//! Command-line front end for the Lambda memory tuner.
//!
//! Owns everything that touches the outside world: the AWS Lambda client,
//! lock files, flags and prompts, the printed summary and result exports.
//! The sweep itself lives in `lambda_tuner_core`.

pub mod adapters;
pub mod config;
pub mod export;
pub mod handlers;
pub mod logging;
pub mod prompts;
pub mod summary;
