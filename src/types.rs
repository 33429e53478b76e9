//! Core types for APK metadata resolution.
//!
//! This module defines the per-strategy accumulator, the output-boundary
//! report, and the options that configure an inspection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::wear_os::map_sdk_to_wear_os;

/// Version reported when no strategy resolved one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Wear OS label reported when no strategy resolved a minimum SDK.
pub const DEFAULT_WEAR_OS_VERSION: &str = "Wear OS 5.0+";

// =============================================================================
// Extraction accumulator
// =============================================================================

/// Fields resolved by a single strategy attempt.
///
/// `wear_os_version` has no public setter; it is derived whenever
/// [`set_min_sdk`](Self::set_min_sdk) is called, so a result can never carry
/// a Wear OS label without the minimum SDK it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Human-readable version string, unvalidated.
    pub version: Option<String>,
    /// Application package identifier.
    pub package_name: Option<String>,
    min_sdk: Option<u32>,
    /// Target SDK level.
    pub target_sdk: Option<u32>,
    /// Maximum SDK level.
    pub max_sdk: Option<u32>,
    wear_os_version: Option<String>,
}

impl ExtractionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the minimum SDK and derive the Wear OS label from it.
    pub fn set_min_sdk(&mut self, min_sdk: u32) {
        self.min_sdk = Some(min_sdk);
        self.wear_os_version = Some(map_sdk_to_wear_os(min_sdk).to_string());
    }

    /// Builder form of [`set_min_sdk`](Self::set_min_sdk).
    pub fn with_min_sdk(mut self, min_sdk: u32) -> Self {
        self.set_min_sdk(min_sdk);
        self
    }

    /// Builder setter for the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builder setter for the package name.
    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    /// Builder setter for the target SDK.
    pub fn with_target_sdk(mut self, target_sdk: u32) -> Self {
        self.target_sdk = Some(target_sdk);
        self
    }

    /// Builder setter for the maximum SDK.
    pub fn with_max_sdk(mut self, max_sdk: u32) -> Self {
        self.max_sdk = Some(max_sdk);
        self
    }

    /// Minimum SDK level, if resolved.
    pub fn min_sdk(&self) -> Option<u32> {
        self.min_sdk
    }

    /// Derived Wear OS label, present exactly when `min_sdk` is.
    pub fn wear_os_version(&self) -> Option<&str> {
        self.wear_os_version.as_deref()
    }

    /// True when no field was resolved.
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.package_name.is_none()
            && self.min_sdk.is_none()
            && self.target_sdk.is_none()
            && self.max_sdk.is_none()
            && self.wear_os_version.is_none()
    }

    /// Convert into a strategy outcome: `None` when nothing was resolved.
    pub fn into_found(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Parse an SDK level, dropping anything that is not a non-negative integer.
pub(crate) fn parse_sdk(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}

// =============================================================================
// Output boundary
// =============================================================================

/// Final report emitted on standard output.
///
/// Field order matches the serialized JSON key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Always true on normal completion; missing data is not failure.
    pub success: bool,
    /// Resolved version or [`DEFAULT_VERSION`].
    pub version: String,
    /// Derived Wear OS label or [`DEFAULT_WEAR_OS_VERSION`].
    pub wear_os_version: String,
    /// Package identifier, if resolved.
    pub package_name: Option<String>,
    /// Minimum SDK, if resolved.
    pub min_sdk: Option<u32>,
    /// Maximum SDK, if resolved.
    pub max_sdk: Option<u32>,
    /// Target SDK, if resolved.
    pub target_sdk: Option<u32>,
}

impl FinalReport {
    /// Report used when every strategy came up empty.
    pub fn defaults() -> Self {
        Self::from_extraction(None)
    }

    /// Fill defaults over whatever the accepted strategy resolved.
    pub fn from_extraction(result: Option<&ExtractionResult>) -> Self {
        let Some(result) = result else {
            return Self {
                success: true,
                version: DEFAULT_VERSION.to_string(),
                wear_os_version: DEFAULT_WEAR_OS_VERSION.to_string(),
                package_name: None,
                min_sdk: None,
                max_sdk: None,
                target_sdk: None,
            };
        };

        Self {
            success: true,
            version: result
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            wear_os_version: result
                .wear_os_version()
                .unwrap_or(DEFAULT_WEAR_OS_VERSION)
                .to_string(),
            package_name: result.package_name.clone(),
            min_sdk: result.min_sdk(),
            max_sdk: result.max_sdk,
            target_sdk: result.target_sdk,
        }
    }
}

/// Boundary-level error payload written to standard error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable reason.
    pub error: String,
}

// =============================================================================
// Inspection outcome
// =============================================================================

/// Which strategy produced the accepted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// External `aapt dump badging` output
    Badging,
    /// Structured binary XML decode of the manifest
    BinaryXml,
    /// Regular-expression scan over raw manifest bytes
    ByteScan,
    /// Nothing resolved; report is all defaults
    Defaults,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Badging => "badging tool",
            Self::BinaryXml => "binary XML",
            Self::ByteScan => "byte scan",
            Self::Defaults => "defaults",
        };
        write!(f, "{name}")
    }
}

/// Accepted strategy result plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// First non-empty strategy result, if any.
    pub result: Option<ExtractionResult>,
    /// Strategy that produced `result`.
    pub source: ExtractionSource,
}

impl Inspection {
    /// An inspection where no strategy resolved anything.
    pub fn empty() -> Self {
        Self {
            result: None,
            source: ExtractionSource::Defaults,
        }
    }

    /// An inspection accepted from `source`.
    pub fn found(result: ExtractionResult, source: ExtractionSource) -> Self {
        Self {
            result: Some(result),
            source,
        }
    }

    /// Build the output-boundary report, filling defaults.
    pub fn report(&self) -> FinalReport {
        FinalReport::from_extraction(self.result.as_ref())
    }
}

// =============================================================================
// Options
// =============================================================================

/// Default badging tool timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on the manifest entry size.
pub const DEFAULT_MAX_MANIFEST_SIZE: u64 = 8 * 1024 * 1024; // 8MB

/// Badging tool candidates tried in order after any user-supplied tool.
pub const DEFAULT_TOOL_CANDIDATES: [&str; 4] =
    ["aapt", "aapt2", "/usr/bin/aapt", "/usr/local/bin/aapt"];

/// Options controlling an inspection.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Run the external badging tool strategy
    pub use_badging_tool: bool,
    /// Hard timeout for one badging tool invocation
    pub tool_timeout: Duration,
    /// Badging tool candidates, in priority order
    pub tool_candidates: Vec<PathBuf>,
    /// Largest manifest entry that will be read
    pub max_manifest_size: u64,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            use_badging_tool: true,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            tool_candidates: DEFAULT_TOOL_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .collect(),
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
        }
    }

    /// Create options that never spawn the badging tool.
    pub fn offline() -> Self {
        Self {
            use_badging_tool: false,
            ..Self::new()
        }
    }

    /// Put a tool ahead of the default candidates.
    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.tool_candidates.insert(0, tool.into());
        self
    }

    /// Set the badging tool timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set the manifest size cap.
    pub fn with_max_manifest_size(mut self, bytes: u64) -> Self {
        self.max_manifest_size = bytes;
        self
    }
}
