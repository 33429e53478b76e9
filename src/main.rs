//! APK Inspect CLI
//!
//! Command-line tool for reading version, package and SDK metadata from APK
//! files and deriving their Wear OS compatibility.

use anyhow::Context;
use apk_inspect::formatter::{HumanFormatter, JsonFormatter, ReportFormatter, ShortFormatter};
use apk_inspect::strategies::binary_xml::NoDecoder;
use apk_inspect::{validate_input, ErrorReport, InspectError, InspectOptions, Inspector};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// APK metadata resolver.
///
/// Prints the version, package name, SDK bounds and minimum Wear OS release
/// of an APK. Uses `aapt` when installed, then falls back to reading the
/// compiled manifest directly.
#[derive(Parser, Debug)]
#[command(name = "apk-inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// APK file to inspect
    file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Badging tool to try before the default candidates
    #[arg(long, value_name = "PATH", env = "APK_INSPECT_AAPT")]
    aapt: Option<PathBuf>,

    /// Badging tool timeout in seconds
    #[arg(long, value_name = "SECS", default_value = "30")]
    timeout: u64,

    /// Largest manifest entry that will be read, in bytes
    #[arg(long, value_name = "BYTES", default_value = "8388608")]
    max_manifest_size: u64,

    /// Skip the external badging tool
    #[arg(long)]
    no_tool: bool,

    /// Skip structured binary XML decoding
    #[arg(long)]
    no_decoder: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbose output (diagnostics on stderr)
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// JSON report
    Json,
    /// Human-readable output
    Human,
    /// Compact single-line output
    Short,
}

impl Args {
    fn options(&self) -> InspectOptions {
        let mut options = if self.no_tool {
            InspectOptions::offline()
        } else {
            InspectOptions::new()
        };
        if let Some(tool) = &self.aapt {
            options = options.with_tool(tool.clone());
        }
        options
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_manifest_size(self.max_manifest_size)
    }

    fn formatter(&self) -> Box<dyn ReportFormatter> {
        match self.format {
            OutputFormat::Json if self.pretty => Box::new(JsonFormatter::pretty()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Human => Box::new(HumanFormatter::new()),
            OutputFormat::Short => Box::new(ShortFormatter::new()),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging if verbose
    if args.verbose {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("apk_inspect=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let path = match validate_input(args.file.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            let payload = error_payload(&e).context("failed to serialize error report")?;
            eprintln!("{payload}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut inspector = Inspector::new(args.options());
    if args.no_decoder {
        inspector = inspector.with_decoder(NoDecoder);
    }

    let inspection = inspector.inspect(path);
    let output = args.formatter().format_inspection(&inspection, path);
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }

    Ok(ExitCode::SUCCESS)
}

/// JSON object reported on stderr for invalid invocations.
fn error_payload(err: &InspectError) -> serde_json::Result<String> {
    serde_json::to_string(&ErrorReport {
        error: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from(["apk-inspect", "face.apk"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("face.apk")));
        assert!(matches!(args.format, OutputFormat::Json));
        assert_eq!(args.timeout, 30);
        assert_eq!(args.max_manifest_size, 8 * 1024 * 1024);
        assert!(!args.verbose);
    }

    #[test]
    fn test_missing_file_still_parses() {
        let args = Args::try_parse_from(["apk-inspect"]).unwrap();
        assert!(args.file.is_none());
        assert!(validate_input(args.file.as_deref()).unwrap_err().is_usage());
    }

    #[test]
    fn test_error_payloads() {
        let missing = validate_input(None).unwrap_err();
        assert_eq!(
            error_payload(&missing).unwrap(),
            r#"{"error":"APK path required"}"#
        );

        let absent = validate_input(Some(std::path::Path::new("/nonexistent/face.apk")))
            .unwrap_err();
        assert_eq!(
            error_payload(&absent).unwrap(),
            r#"{"error":"APK file not found"}"#
        );
    }

    #[test]
    fn test_format_options() {
        let args = Args::try_parse_from(["apk-inspect", "-f", "short", "face.apk"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Short));
    }

    #[test]
    fn test_options_from_flags() {
        let args = Args::try_parse_from([
            "apk-inspect",
            "--aapt",
            "/opt/sdk/aapt2",
            "--timeout",
            "5",
            "--max-manifest-size",
            "1024",
            "face.apk",
        ])
        .unwrap();
        let options = args.options();
        assert!(options.use_badging_tool);
        assert_eq!(options.tool_candidates[0], PathBuf::from("/opt/sdk/aapt2"));
        assert_eq!(options.tool_timeout, Duration::from_secs(5));
        assert_eq!(options.max_manifest_size, 1024);
    }

    #[test]
    fn test_no_tool() {
        let args = Args::try_parse_from(["apk-inspect", "--no-tool", "face.apk"]).unwrap();
        assert!(!args.options().use_badging_tool);
    }
}
