use std::io::{self, IsTerminal};

use anyhow::{bail, Context};
use clap::Parser;
use lambda_tuner_cli::adapters::lambda_client::AwsLambdaClient;
use lambda_tuner_cli::adapters::lock_file::LockFileLease;
use lambda_tuner_cli::config::{PayloadChoice, TunerArgs, TunerConfig, VisualizeChoice};
use lambda_tuner_cli::handlers::tune::{handle_tuning_session, write_visualization, SessionSettings};
use lambda_tuner_cli::logging;
use lambda_tuner_cli::prompts::{Prompter, VISUALIZE_PROMPT};
use lambda_tuner_core::lock::{FunctionLock, NoLock};
use lambda_tuner_core::{CancellationFlag, RestorationOutcome, SweepRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = TunerArgs::parse();
    logging::init(&args.log_level);

    let config =
        TunerConfig::from_args(&args, io::stdin().is_terminal()).context("invalid arguments")?;

    let (identity, payload) = {
        let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
        let identity = match config.function.clone() {
            Some(identity) => identity,
            None => prompter
                .ask_function_arn()
                .context("failed to read the function ARN")?,
        };
        let payload = match &config.payload {
            PayloadChoice::Decided(payload) => payload.clone(),
            PayloadChoice::Ask => prompter
                .ask_payload()
                .context("failed to read the test event")?,
        };
        (identity, payload)
    };
    println!("Using region: {}", identity.region());

    let client = AwsLambdaClient::connect(identity.region()).await;

    let cancel = CancellationFlag::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing the current size and restoring");
            interrupt.cancel();
        }
    });

    let mut request = SweepRequest::new(identity).with_payload(payload);
    if let Some(sizes) = config.candidate_sizes.clone() {
        request = request.with_candidate_sizes(sizes);
    }

    let show_progress = io::stderr().is_terminal();
    let session_config = config.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let settle = session_config.settle.strategy();
        let lock: Box<dyn FunctionLock> = match &session_config.lock_dir {
            Some(dir) => Box::new(LockFileLease::new(dir)),
            None => Box::new(NoLock),
        };
        let settings = SessionSettings {
            pricing: &session_config.pricing,
            settle: settle.as_ref(),
            lock: lock.as_ref(),
            cancel,
            output_dir: &session_config.output_dir,
            exports: &session_config.exports,
            show_progress,
        };
        handle_tuning_session(&client, &request, &settings)
    })
    .await
    .context("sweep task panicked")?
    .context("sweep failed")?;

    println!();
    print!("{}", outcome.summary);
    for path in &outcome.exported {
        println!("Results written to {}", path.display());
    }

    if !outcome.report.results.is_empty() {
        let visualize = match config.visualize {
            VisualizeChoice::Yes => true,
            VisualizeChoice::No => false,
            VisualizeChoice::Ask => Prompter::new(io::stdin().lock(), io::stdout())
                .ask_yes_no(VISUALIZE_PROMPT)
                .context("failed to read the visualization answer")?,
        };
        if visualize {
            match write_visualization(&outcome.report, &config.output_dir) {
                Ok(path) => println!("Visualization saved as {}", path.display()),
                Err(error) => tracing::error!(error = %error, "failed to generate visualization"),
            }
        }
    }

    if let RestorationOutcome::Failed {
        memory_size,
        message,
    } = &outcome.report.restoration
    {
        bail!(
            "function was left unrestored; set its memory back to {memory_size} MB manually ({message})"
        );
    }

    Ok(())
}
