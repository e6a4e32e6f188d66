use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub fn tail_log(duration_ms: f64) -> String {
    STANDARD.encode(format!(
        "START RequestId: 5d1b Version: $LATEST\n\
         END RequestId: 5d1b\n\
         REPORT RequestId: 5d1b\tDuration: {duration_ms} ms\tBilled Duration: {} ms\t\
         Memory Size: 128 MB\tMax Memory Used: 64 MB\n",
        duration_ms.ceil()
    ))
}

pub fn tail_log_without_report() -> String {
    STANDARD.encode("START RequestId: 5d1b Version: $LATEST\nEND RequestId: 5d1b\n")
}
