//! Command-line flags and their resolution into a validated configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use lambda_tuner_core::settle::DEFAULT_POLL_INTERVAL;
use lambda_tuner_core::{
    normalize_payload, FixedDelay, FunctionIdentity, PollUntilActive, PricingCatalog, Settle,
    ValidationError,
};

pub const DEFAULT_SETTLE_SECS: u64 = 8;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Parser)]
#[command(
    name = "lambda_tuner",
    version,
    about = "Find the performance and cost sweet spots of an AWS Lambda function",
    long_about = "Sweeps a Lambda function across memory sizes, invoking it once per size,\n\
                  then reports the fastest and the cheapest configuration. The function's\n\
                  original memory size is restored when the sweep ends."
)]
pub struct TunerArgs {
    /// Lambda function ARN (arn:aws:lambda:<region>:<account>:function:<name>)
    #[arg(long, env = "LAMBDA_TUNER_FUNCTION_ARN")]
    pub function_arn: Option<String>,
    /// Inline JSON test event sent with every invocation
    #[arg(long, conflicts_with = "payload_file")]
    pub payload: Option<String>,
    /// File holding the JSON test event
    #[arg(long)]
    pub payload_file: Option<PathBuf>,
    /// Comma-separated memory sizes (MB) to test instead of the whole pricing table
    #[arg(long, value_delimiter = ',')]
    pub memory: Vec<u32>,
    /// How to wait for a memory update to become active
    #[arg(long, value_enum, default_value_t = SettleMode::Fixed)]
    pub settle_mode: SettleMode,
    /// Pause after each memory update in fixed mode
    #[arg(long, env = "LAMBDA_TUNER_SETTLE_SECS", default_value_t = DEFAULT_SETTLE_SECS)]
    pub settle_secs: u64,
    /// Upper bound on status polling in poll mode
    #[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    pub poll_timeout_secs: u64,
    /// JSON pricing catalog overriding the built-in prices
    #[arg(long, env = "LAMBDA_TUNER_PRICING_FILE")]
    pub pricing_file: Option<PathBuf>,
    /// Directory receiving exported results and the visualization
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
    /// Result files to write (csv, json, parquet)
    #[arg(long = "export", value_enum, value_delimiter = ',')]
    pub exports: Vec<ExportFormat>,
    /// Write visualization.html without asking
    #[arg(long, conflicts_with = "no_visualize")]
    pub visualize: bool,
    /// Skip the visualization without asking
    #[arg(long)]
    pub no_visualize: bool,
    /// Never prompt; missing input is an error
    #[arg(long)]
    pub no_input: bool,
    /// Directory for advisory lock files (no locking when unset)
    #[arg(long, env = "LAMBDA_TUNER_LOCK_DIR")]
    pub lock_dir: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettleMode {
    /// Sleep a fixed number of seconds
    Fixed,
    /// Poll the function until the update reports success
    Poll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "results.csv",
            Self::Json => "results.json",
            Self::Parquet => "results.parquet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleConfig {
    Fixed(Duration),
    Poll { interval: Duration, timeout: Duration },
}

impl SettleConfig {
    pub fn strategy(&self) -> Box<dyn Settle + Send + Sync> {
        match *self {
            Self::Fixed(delay) => Box::new(FixedDelay(delay)),
            Self::Poll { interval, timeout } => Box::new(PollUntilActive { interval, timeout }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadChoice {
    /// Settled by flags: `None` invokes without a payload.
    Decided(Option<Vec<u8>>),
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizeChoice {
    Yes,
    No,
    Ask,
}

#[derive(Debug, Clone)]
pub struct TunerConfig {
    pub function: Option<FunctionIdentity>,
    pub payload: PayloadChoice,
    pub candidate_sizes: Option<Vec<u32>>,
    pub settle: SettleConfig,
    pub pricing: PricingCatalog,
    pub output_dir: PathBuf,
    pub exports: Vec<ExportFormat>,
    pub visualize: VisualizeChoice,
    pub interactive: bool,
    pub lock_dir: Option<PathBuf>,
}

impl TunerConfig {
    /// Validates flags. `terminal` tells whether prompting is possible at all.
    pub fn from_args(args: &TunerArgs, terminal: bool) -> Result<Self, ValidationError> {
        let interactive = terminal && !args.no_input;

        let function = args
            .function_arn
            .as_deref()
            .map(FunctionIdentity::parse)
            .transpose()?;
        if function.is_none() && !interactive {
            return Err(ValidationError::new(
                "--function-arn is required when prompts are disabled",
            ));
        }

        let payload = match (&args.payload, &args.payload_file) {
            (Some(inline), _) => PayloadChoice::Decided(normalize_payload(Some(inline))?),
            (None, Some(path)) => {
                let text = fs::read_to_string(path).map_err(|error| {
                    ValidationError::new(format!(
                        "failed to read payload file {}: {error}",
                        path.display()
                    ))
                })?;
                PayloadChoice::Decided(normalize_payload(Some(&text))?)
            }
            (None, None) if interactive => PayloadChoice::Ask,
            (None, None) => PayloadChoice::Decided(None),
        };

        let candidate_sizes = if args.memory.is_empty() {
            None
        } else {
            if args.memory.contains(&0) {
                return Err(ValidationError::new(
                    "--memory sizes must be positive integers",
                ));
            }
            Some(args.memory.clone())
        };

        let settle = match args.settle_mode {
            SettleMode::Fixed => SettleConfig::Fixed(Duration::from_secs(args.settle_secs)),
            SettleMode::Poll => SettleConfig::Poll {
                interval: DEFAULT_POLL_INTERVAL,
                timeout: Duration::from_secs(args.poll_timeout_secs),
            },
        };

        let pricing = match &args.pricing_file {
            Some(path) => PricingCatalog::from_json_file(path)
                .map_err(|error| ValidationError::new(error.to_string()))?,
            None => PricingCatalog::default(),
        };

        let visualize = if args.visualize {
            VisualizeChoice::Yes
        } else if args.no_visualize || !interactive {
            VisualizeChoice::No
        } else {
            VisualizeChoice::Ask
        };

        let mut exports = Vec::with_capacity(args.exports.len());
        for format in &args.exports {
            if !exports.contains(format) {
                exports.push(*format);
            }
        }

        Ok(Self {
            function,
            payload,
            candidate_sizes,
            settle,
            pricing,
            output_dir: args.output_dir.clone(),
            exports,
            visualize,
            interactive,
            lock_dir: args.lock_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:checkout";

    fn parse(extra: &[&str]) -> TunerArgs {
        let mut argv = vec!["lambda_tuner"];
        argv.extend_from_slice(extra);
        TunerArgs::try_parse_from(argv).expect("args should parse")
    }

    #[test]
    fn defaults_match_the_production_sweep() {
        let config = TunerConfig::from_args(&parse(&["--function-arn", ARN]), false)
            .expect("config should pass");

        assert_eq!(config.function.as_ref().map(|f| f.region()), Some("eu-west-1"));
        assert_eq!(config.settle, SettleConfig::Fixed(Duration::from_secs(8)));
        assert_eq!(config.payload, PayloadChoice::Decided(None));
        assert_eq!(config.visualize, VisualizeChoice::No);
        assert_eq!(config.candidate_sizes, None);
        assert_eq!(config.pricing, PricingCatalog::default());
        assert!(!config.interactive);
    }

    #[test]
    fn missing_arn_requires_prompting() {
        let error = TunerConfig::from_args(&parse(&[]), false).expect_err("config should fail");
        assert_eq!(
            error.message(),
            "--function-arn is required when prompts are disabled"
        );

        let config = TunerConfig::from_args(&parse(&[]), true).expect("interactive passes");
        assert!(config.function.is_none());
        assert_eq!(config.payload, PayloadChoice::Ask);
        assert_eq!(config.visualize, VisualizeChoice::Ask);
    }

    #[test]
    fn malformed_arn_is_rejected_before_any_call() {
        let error = TunerConfig::from_args(&parse(&["--function-arn", "checkout"]), false)
            .expect_err("config should fail");
        assert!(error.message().starts_with("Invalid Lambda ARN format"));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let error = TunerConfig::from_args(
            &parse(&["--function-arn", ARN, "--payload", "{\"id\":"]),
            false,
        )
        .expect_err("config should fail");
        assert!(error.message().starts_with("Invalid JSON payload"));
    }

    #[test]
    fn payload_file_is_loaded_and_validated() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{\"order_id\": 7}}").expect("write payload");
        let path = file.path().to_string_lossy().to_string();

        let config = TunerConfig::from_args(
            &parse(&["--function-arn", ARN, "--payload-file", &path]),
            true,
        )
        .expect("config should pass");

        assert_eq!(
            config.payload,
            PayloadChoice::Decided(Some(b"{\"order_id\": 7}".to_vec()))
        );
    }

    #[test]
    fn memory_subset_and_poll_mode_are_parsed() {
        let config = TunerConfig::from_args(
            &parse(&[
                "--function-arn",
                ARN,
                "--memory",
                "1024,128",
                "--settle-mode",
                "poll",
                "--poll-timeout-secs",
                "30",
                "--export",
                "csv,json",
            ]),
            false,
        )
        .expect("config should pass");

        assert_eq!(config.candidate_sizes, Some(vec![1024, 128]));
        assert_eq!(
            config.settle,
            SettleConfig::Poll {
                interval: DEFAULT_POLL_INTERVAL,
                timeout: Duration::from_secs(30),
            }
        );
        assert_eq!(config.exports, vec![ExportFormat::Csv, ExportFormat::Json]);
    }

    #[test]
    fn zero_memory_is_rejected() {
        let error = TunerConfig::from_args(&parse(&["--function-arn", ARN, "--memory", "0"]), false)
            .expect_err("config should fail");
        assert_eq!(error.message(), "--memory sizes must be positive integers");
    }

    #[test]
    fn pricing_file_overrides_builtin_prices() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"x86_64": {{"128": 0.000000003}}, "arm64": {{"128": 0.000000002}}}}"#
        )
        .expect("write pricing");
        let path = file.path().to_string_lossy().to_string();

        let config = TunerConfig::from_args(
            &parse(&["--function-arn", ARN, "--pricing-file", &path]),
            false,
        )
        .expect("config should pass");

        assert_eq!(config.pricing.x86_64.memory_sizes(), vec![128]);
    }
}
