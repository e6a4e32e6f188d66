use lambda_tuner_core::SweepResult;

pub(crate) fn export_to_csv_impl(
    results: &[SweepResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "memory_mb",
        "duration_ms",
        "cost_usd",
        "price_per_ms",
        "extraction_error",
    ])?;

    for result in results {
        wtr.write_record([
            result.memory_size().to_string(),
            result.duration_ms().to_string(),
            format!("{:.10}", result.cost()),
            result.price_per_ms().to_string(),
            result.extraction_error().unwrap_or_default().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
