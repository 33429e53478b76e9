//! APK Inspect - Android Package Metadata Resolution
//!
//! This library reads the version, package name and SDK bounds of an APK
//! and derives the oldest Wear OS release the package runs on, without
//! requiring an Android toolchain.
//!
//! # Features
//!
//! - **Layered Strategies**: `aapt dump badging` when installed, then a
//!   structured binary XML decode of the manifest, then a raw byte scan
//! - **Graceful Degradation**: every strategy failure is absorbed; the worst
//!   case is an all-defaults report, never an error
//! - **Built-in Decoder**: a bounds-checked Android binary XML parser
//! - **Injectable Capabilities**: the badging tool and the binary XML decoder
//!   are traits, so either can be replaced or disabled
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use apk_inspect::inspect_apk;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = inspect_apk("path/to/watchface.apk")?;
//!     println!("Version: {}", report.version);
//!     println!("Wear OS: {}", report.wear_os_version);
//!     println!("Min SDK: {:?}", report.min_sdk);
//!     Ok(())
//! }
//! ```
//!
//! # Defaults
//!
//! Fields no strategy resolved are reported as:
//!
//! - `version`: `"1.0.0"`
//! - `wear_os_version`: `"Wear OS 5.0+"`
//! - `package_name`, `min_sdk`, `target_sdk`, `max_sdk`: `null`

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]

pub mod archive;
pub mod axml;
pub mod error;
pub mod formatter;
pub mod inspector;
pub mod strategies;
pub mod types;
pub mod wear_os;

pub use error::{InspectError, Result};
pub use inspector::Inspector;
pub use types::{
    ErrorReport, ExtractionResult, ExtractionSource, FinalReport, InspectOptions, Inspection,
};

use std::path::Path;

/// Check the invocation preconditions: a path was given and names a file.
///
/// # Errors
///
/// Returns [`InspectError::Usage`] when `path` is `None` or does not name an
/// existing file.
pub fn validate_input(path: Option<&Path>) -> Result<&Path> {
    let path = path.ok_or_else(|| InspectError::usage(error::MISSING_PATH_MESSAGE))?;
    if !path.is_file() {
        return Err(InspectError::usage(error::FILE_NOT_FOUND_MESSAGE));
    }
    Ok(path)
}

/// Inspect an APK file by path with default options.
///
/// This is the primary entry point. Only invalid input is an error; an APK
/// nothing could be read from yields the all-defaults report.
///
/// # Example
///
/// ```rust,no_run
/// use apk_inspect::inspect_apk;
///
/// let report = inspect_apk("app.apk")?;
/// assert!(report.success);
/// # Ok::<(), apk_inspect::InspectError>(())
/// ```
pub fn inspect_apk<P: AsRef<Path>>(path: P) -> Result<FinalReport> {
    inspect_apk_with_options(path, &InspectOptions::new()).map(|i| i.report())
}

/// Inspect an APK file with custom options.
///
/// # Example
///
/// ```rust,no_run
/// use apk_inspect::{inspect_apk_with_options, InspectOptions};
///
/// let options = InspectOptions::offline();
/// let inspection = inspect_apk_with_options("app.apk", &options)?;
/// println!("resolved by {}", inspection.source);
/// # Ok::<(), apk_inspect::InspectError>(())
/// ```
pub fn inspect_apk_with_options<P: AsRef<Path>>(
    path: P,
    options: &InspectOptions,
) -> Result<Inspection> {
    let path = validate_input(Some(path.as_ref()))?;
    Ok(Inspector::new(options.clone()).inspect(path))
}

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
    }

    #[test]
    fn test_missing_path_is_usage_error() {
        let err = validate_input(None).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "APK path required");
    }

    #[test]
    fn test_nonexistent_path_is_usage_error() {
        let err = inspect_apk("/nonexistent/dir/watchface.apk").unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "APK file not found");
    }

    #[test]
    fn test_directory_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(inspect_apk(dir.path()).unwrap_err().is_usage());
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.apk");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let inspection = inspect_apk_with_options(&path, &InspectOptions::offline()).unwrap();
        assert_eq!(inspection.source, ExtractionSource::Defaults);
        assert_eq!(inspection.report(), FinalReport::defaults());
    }
}
