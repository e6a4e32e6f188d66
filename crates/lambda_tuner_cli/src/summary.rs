use std::fmt::Write;

use lambda_tuner_core::{select_best_measured, RestorationOutcome, SkipReason, SweepReport};

pub const NO_RESULTS_MESSAGE: &str = "No test results were collected.";
pub const NO_MEASUREMENTS_MESSAGE: &str = "No duration could be measured at any memory size.";

/// Human-readable end-of-sweep summary printed on stdout.
pub fn format_summary(report: &SweepReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Test Summary ---");
    let _ = writeln!(
        out,
        "Function: {} ({}, original memory {} MB)",
        report.function, report.architecture, report.original_memory
    );

    for skipped in &report.skipped {
        let _ = writeln!(
            out,
            "Skipped {} MB: {}",
            skipped.memory_size,
            describe_skip(&skipped.reason)
        );
    }
    for result in report.results.iter().filter(|result| result.is_degraded()) {
        let _ = writeln!(
            out,
            "No duration at {} MB: {}",
            result.memory_size(),
            result.extraction_error().unwrap_or_default()
        );
    }
    if report.cancelled {
        let _ = writeln!(out, "Sweep was interrupted; remaining sizes were not tested.");
    }
    if let RestorationOutcome::Failed {
        memory_size,
        message,
    } = &report.restoration
    {
        let _ = writeln!(
            out,
            "WARNING: failed to restore memory size {memory_size} MB: {message}"
        );
    }

    if report.results.is_empty() {
        let _ = writeln!(out, "{NO_RESULTS_MESSAGE}");
        return out;
    }

    // zero-duration records would always win both spots
    match select_best_measured(&report.results) {
        Ok(spots) => {
            let _ = writeln!(
                out,
                "Performance Sweet Spot: {} MB with duration {:.2} ms",
                spots.performance.memory_size(),
                spots.performance.duration_ms()
            );
            let _ = writeln!(
                out,
                "Cost Effective Sweet Spot: {} MB with cost ${:.10}",
                spots.cost.memory_size(),
                spots.cost.cost()
            );
        }
        Err(_) => {
            let _ = writeln!(out, "{NO_MEASUREMENTS_MESSAGE}");
        }
    }

    out
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NotPriced => "no price for this size".to_string(),
        SkipReason::Reconfiguration(message) => format!("memory update failed: {message}"),
        SkipReason::Settle(message) => format!("update did not settle: {message}"),
        SkipReason::Invocation(message) => format!("invocation failed: {message}"),
    }
}
