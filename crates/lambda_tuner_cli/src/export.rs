//! Result export.
//!
//! Writes sweep results, ordered by memory size, to CSV, JSON, Parquet and a
//! self-contained HTML chart page.

use std::path::Path;

use lambda_tuner_core::SweepResult;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/html.rs"]
mod html;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

pub const VISUALIZATION_FILE_NAME: &str = "visualization.html";

/// Export sweep results to Parquet format.
///
/// Columns: `memory_mb`, `duration_ms`, `cost_usd`, `price_per_ms` and a
/// nullable `extraction_error`.
///
/// # Errors
///
/// Returns an error if `results` is empty or file creation or Parquet writing fails.
pub fn export_to_parquet(
    results: &[SweepResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export sweep results to JSON format, as an array of result objects.
///
/// # Errors
///
/// Returns an error if `results` is empty or file creation or serialization fails.
pub fn export_to_json(
    results: &[SweepResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export sweep results to CSV format. Cost is written with ten decimals.
///
/// # Errors
///
/// Returns an error if `results` is empty or file creation or CSV writing fails.
pub fn export_to_csv(
    results: &[SweepResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, file)
}

/// Render the duration, cost and combined dual-axis charts into one HTML page.
///
/// The page loads ECharts from a CDN; the data is embedded.
pub fn render_visualization(
    results: &[SweepResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    html::render_visualization_impl(results, file)
}
