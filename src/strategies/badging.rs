//! External badging tool strategy.
//!
//! Runs `<tool> dump badging <apk>` for the first candidate tool that exists
//! and exits cleanly with output, then pulls fields out of the text with
//! independent patterns:
//!
//! ```text
//! package: name='com.example.app' versionCode='7' versionName='1.2.0'
//! sdkVersion:'30'
//! targetSdkVersion:'34'
//! ```

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use wait_timeout::ChildExt;

use crate::error::{InspectError, Result};
use crate::strategies::Attempt;
use crate::types::{parse_sdk, ExtractionResult, InspectOptions};

static VERSION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"versionName=['"]([^'"]+)['"]"#).expect("static pattern"));

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"package: name=['"]([^'"]+)['"]"#).expect("static pattern"));

static MIN_SDK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:minSdkVersion|sdkVersion):['"](\d+)['"]"#).expect("static pattern")
});

static TARGET_SDK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"targetSdkVersion:['"](\d+)['"]"#).expect("static pattern"));

static MAX_SDK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"maxSdkVersion:['"](\d+)['"]"#).expect("static pattern"));

/// Source of badging dump text for an APK.
pub trait BadgingSource: fmt::Debug {
    /// Produce the badging dump for `apk`.
    fn dump_badging(&self, apk: &Path) -> Result<String>;
}

/// Runs `aapt`/`aapt2` as a subprocess.
#[derive(Debug, Clone)]
pub struct AaptTool {
    candidates: Vec<PathBuf>,
    timeout: Duration,
}

impl AaptTool {
    /// Create a runner over `candidates`, tried in order.
    pub fn new(candidates: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            candidates,
            timeout,
        }
    }

    /// Create a runner from inspection options.
    pub fn from_options(options: &InspectOptions) -> Self {
        Self::new(options.tool_candidates.clone(), options.tool_timeout)
    }

    /// Resolve a candidate to an executable path.
    ///
    /// Bare names are searched on `PATH`; anything with a directory
    /// component must exist as given.
    fn resolve(candidate: &Path) -> Result<PathBuf> {
        let unavailable = || InspectError::ToolUnavailable {
            tool: candidate.display().to_string(),
        };
        if candidate.components().count() == 1 {
            which::which(candidate).map_err(|_| unavailable())
        } else if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(unavailable())
        }
    }

    fn run(&self, tool: &Path, apk: &Path) -> Result<String> {
        let name = tool.display().to_string();
        let timed_out = || InspectError::ToolTimedOut {
            tool: name.clone(),
            timeout: self.timeout,
        };
        let started = Instant::now();
        let mut child = Command::new(tool)
            .arg("dump")
            .arg("badging")
            .arg(apk)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Drain stdout concurrently so a chatty tool cannot fill the pipe
        // and stall until the timeout.
        let mut stdout = child.stdout.take().ok_or_else(|| InspectError::ToolFailed {
            tool: name.clone(),
            reason: "stdout not captured".to_string(),
        })?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let Some(status) = child.wait_timeout(self.timeout)? else {
            // Best effort; the child may have exited between the two calls.
            let _ = child.kill();
            let _ = child.wait();
            return Err(timed_out());
        };

        // A background process spawned by the tool can keep the pipe open
        // after the tool itself exits; the deadline covers the drain too.
        let remaining = self.timeout.saturating_sub(started.elapsed());
        let output = match rx.recv_timeout(remaining) {
            Ok(read) => read?,
            Err(RecvTimeoutError::Timeout) => return Err(timed_out()),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(InspectError::ToolFailed {
                    tool: name,
                    reason: "stdout reader panicked".to_string(),
                })
            }
        };

        if !status.success() {
            return Err(InspectError::ToolFailed {
                tool: name,
                reason: status.to_string(),
            });
        }
        if output.is_empty() {
            return Err(InspectError::ToolFailed {
                tool: name,
                reason: "no output".to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

impl BadgingSource for AaptTool {
    fn dump_badging(&self, apk: &Path) -> Result<String> {
        let mut last_error = InspectError::ToolUnavailable {
            tool: "aapt".to_string(),
        };

        for candidate in &self.candidates {
            let attempt = Self::resolve(candidate).and_then(|tool| self.run(&tool, apk));
            match attempt {
                Ok(output) => {
                    tracing::debug!(tool = %candidate.display(), "badging dump succeeded");
                    return Ok(output);
                }
                Err(e) => {
                    tracing::debug!(tool = %candidate.display(), error = %e, "badging candidate failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Run the badging strategy for `apk` using `source`.
pub fn attempt(source: &dyn BadgingSource, apk: &Path) -> Attempt {
    let output = source.dump_badging(apk)?;
    Ok(parse_badging(&output).into_found())
}

/// Parse badging dump text. Each field is extracted independently.
pub fn parse_badging(output: &str) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    result.version = capture(&VERSION_NAME, output).map(str::to_string);
    result.package_name = capture(&PACKAGE_NAME, output).map(str::to_string);
    if let Some(min_sdk) = capture(&MIN_SDK, output).and_then(parse_sdk) {
        result.set_min_sdk(min_sdk);
    }
    result.target_sdk = capture(&TARGET_SDK, output).and_then(parse_sdk);
    result.max_sdk = capture(&MAX_SDK, output).and_then(parse_sdk);

    result
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
