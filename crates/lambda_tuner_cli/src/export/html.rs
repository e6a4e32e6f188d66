use std::io::Write;

use lambda_tuner_core::SweepResult;
use serde_json::json;

const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";

pub(crate) fn render_visualization_impl(
    results: &[SweepResult],
    mut file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    file.write_all(render_page(results)?.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Page with three line charts sharing the memory axis.
pub(crate) fn render_page(results: &[SweepResult]) -> Result<String, serde_json::Error> {
    let memory: Vec<String> = results.iter().map(|r| r.memory_size().to_string()).collect();
    let durations: Vec<f64> = results.iter().map(SweepResult::duration_ms).collect();
    let costs: Vec<f64> = results.iter().map(SweepResult::cost).collect();

    let x_axis = json!({ "type": "category", "name": "Memory (MB)", "data": memory });
    let tooltip = json!({ "trigger": "axis" });

    let performance = json!({
        "title": { "text": "Lambda Performance (Duration vs Memory)" },
        "tooltip": tooltip,
        "xAxis": x_axis,
        "yAxis": { "type": "value", "name": "Duration (ms)" },
        "series": [{ "name": "Duration", "type": "line", "data": durations }],
    });
    let cost = json!({
        "title": { "text": "Lambda Cost (Cost vs Memory)" },
        "tooltip": tooltip,
        "xAxis": x_axis,
        "yAxis": { "type": "value", "name": "Cost ($)" },
        "series": [{ "name": "Cost", "type": "line", "data": costs }],
    });
    let combined = json!({
        "title": { "text": "Balanced Sweet Spot (Cost & Performance)" },
        "tooltip": tooltip,
        "legend": { "data": ["Duration", "Cost"] },
        "xAxis": x_axis,
        "yAxis": [
            { "type": "value", "name": "Duration (ms)" },
            { "type": "value", "name": "Cost ($)", "position": "right" },
        ],
        "series": [
            { "name": "Duration", "type": "line", "yAxisIndex": 0, "data": durations },
            { "name": "Cost", "type": "line", "yAxisIndex": 1, "data": costs },
        ],
    });

    let charts = [
        ("performance", performance),
        ("cost", cost),
        ("combined", combined),
    ];

    let mut containers = String::new();
    let mut scripts = String::new();
    for (id, option) in &charts {
        containers.push_str(&format!(
            "  <div id=\"{id}\" style=\"width:900px;height:500px;\"></div>\n"
        ));
        scripts.push_str(&format!(
            "  echarts.init(document.getElementById(\"{id}\")).setOption({});\n",
            serde_json::to_string(option)?
        ));
    }

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  \
         <title>Lambda memory sweep</title>\n  <script src=\"{ECHARTS_CDN}\"></script>\n\
         </head>\n<body>\n{containers}<script>\n{scripts}</script>\n</body>\n</html>\n"
    ))
}
