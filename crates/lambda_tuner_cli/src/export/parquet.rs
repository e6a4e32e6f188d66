use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use lambda_tuner_core::SweepResult;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

pub(crate) fn export_to_parquet_impl(
    results: &[SweepResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(results: &[SweepResult]) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    RecordBatch::try_new(schema, build_arrays(results))
}

fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("memory_mb", DataType::UInt32, false),
        Field::new("duration_ms", DataType::Float64, false),
        Field::new("cost_usd", DataType::Float64, false),
        Field::new("price_per_ms", DataType::Float64, false),
        Field::new("extraction_error", DataType::Utf8, true),
    ])
}

fn build_arrays(results: &[SweepResult]) -> Vec<ArrayRef> {
    vec![
        Arc::new(UInt32Array::from(
            results.iter().map(|r| r.memory_size()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.duration_ms()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.cost()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.price_per_ms()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            results
                .iter()
                .map(|r| r.extraction_error())
                .collect::<Vec<_>>(),
        )),
    ]
}
