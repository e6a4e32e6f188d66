use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use lambda_tuner_core::lock::FunctionLock;
use lambda_tuner_core::{
    CancellationFlag, PricingCatalog, RemoteExecutionClient, Settle, SkipReason, SweepEngine,
    SweepError, SweepProgress, SweepReport, SweepRequest,
};

use crate::config::ExportFormat;
use crate::export;
use crate::summary::format_summary;

/// Everything a tuning session needs besides the platform client.
pub struct SessionSettings<'a> {
    pub pricing: &'a PricingCatalog,
    pub settle: &'a dyn Settle,
    pub lock: &'a dyn FunctionLock,
    pub cancel: CancellationFlag,
    pub output_dir: &'a Path,
    pub exports: &'a [ExportFormat],
    pub show_progress: bool,
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub report: SweepReport,
    pub summary: String,
    pub exported: Vec<PathBuf>,
}

/// Runs one sweep, then writes the requested export files.
///
/// A failed export is logged and does not fail the session; the sweep
/// results are already final at that point.
pub fn handle_tuning_session(
    client: &dyn RemoteExecutionClient,
    request: &SweepRequest,
    settings: &SessionSettings<'_>,
) -> Result<SessionOutcome, SweepError> {
    let engine = SweepEngine::new(client, settings.pricing, settings.settle)
        .with_lock(settings.lock)
        .with_cancellation(settings.cancel.clone());

    let pb = settings.show_progress.then(new_progress_bar);
    let report = engine.run(request, &mut |event: SweepProgress<'_>| {
        if let Some(ref progress_bar) = pb {
            track_progress(progress_bar, &event);
        }
    })?;
    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    let mut exported = Vec::new();
    for format in settings.exports {
        let path = settings.output_dir.join(format.file_name());
        match write_export(*format, &report, &path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "exported results");
                exported.push(path);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "result export failed");
            }
        }
    }

    Ok(SessionOutcome {
        summary: format_summary(&report),
        report,
        exported,
    })
}

/// Writes `visualization.html` into `output_dir`.
pub fn write_visualization(
    report: &SweepReport,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = output_dir.join(export::VISUALIZATION_FILE_NAME);
    export::render_visualization(&report.results, &path)?;
    Ok(path)
}

fn write_export(
    format: ExportFormat,
    report: &SweepReport,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        ExportFormat::Csv => export::export_to_csv(&report.results, path),
        ExportFormat::Json => export::export_to_json(&report.results, path),
        ExportFormat::Parquet => export::export_to_parquet(&report.results, path),
    }
}

fn new_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

fn track_progress(bar: &ProgressBar, event: &SweepProgress<'_>) {
    match event {
        SweepProgress::Planned { candidates } => bar.set_length(*candidates as u64),
        SweepProgress::CandidateStarted { memory_size, .. } => {
            bar.set_message(format!("testing {memory_size} MB"));
        }
        SweepProgress::CandidateMeasured(result) => {
            bar.println(format!(
                "{} MB: {:.2} ms",
                result.memory_size(),
                result.duration_ms()
            ));
            bar.inc(1);
        }
        SweepProgress::CandidateSkipped(skipped) => {
            bar.println(format!("{} MB: skipped", skipped.memory_size));
            // unpriced sizes are dropped before the plan is counted
            if skipped.reason != SkipReason::NotPriced {
                bar.inc(1);
            }
        }
        SweepProgress::Restoring { memory_size } => {
            bar.set_message(format!("restoring {memory_size} MB"));
        }
    }
}
