//! Output formatters for inspection results.
//!
//! This module provides trait-based formatters for rendering an inspection
//! in various output formats (JSON report, human-readable, compact).

use crate::types::{ExtractionSource, FinalReport, Inspection};
use std::path::Path;

/// Trait for formatting inspections.
///
/// Implementors provide methods for rendering each part of the report, plus
/// a method to render the complete inspection.
pub trait ReportFormatter {
    /// Format the file path header.
    fn format_file(&self, path: &Path) -> String;

    /// Format version and package identity.
    fn format_identity(&self, report: &FinalReport) -> Option<String>;

    /// Format SDK bounds and Wear OS compatibility.
    fn format_compatibility(&self, report: &FinalReport) -> Option<String>;

    /// Format which strategy produced the result.
    fn format_source(&self, source: ExtractionSource) -> Option<String>;

    /// Format the complete inspection.
    ///
    /// Default implementation concatenates all component outputs.
    fn format_inspection(&self, inspection: &Inspection, path: &Path) -> String {
        let report = inspection.report();
        let mut parts = vec![self.format_file(path)];

        if let Some(s) = self.format_identity(&report) {
            parts.push(s);
        }
        if let Some(s) = self.format_compatibility(&report) {
            parts.push(s);
        }
        if let Some(s) = self.format_source(inspection.source) {
            parts.push(s);
        }

        parts.join("")
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Human-readable output formatter.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter.
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for HumanFormatter {
    fn format_file(&self, path: &Path) -> String {
        format!("File: {}\n", path.display())
    }

    fn format_identity(&self, report: &FinalReport) -> Option<String> {
        let mut s = format!("  Version:     {}\n", report.version);
        s.push_str(&format!("  Package:     {}\n", or_dash(report.package_name.as_deref())));
        Some(s)
    }

    fn format_compatibility(&self, report: &FinalReport) -> Option<String> {
        let mut s = format!("  Wear OS:     {}\n", report.wear_os_version);
        s.push_str(&format!("  Min SDK:     {}\n", or_dash(report.min_sdk)));
        s.push_str(&format!("  Target SDK:  {}\n", or_dash(report.target_sdk)));
        s.push_str(&format!("  Max SDK:     {}\n", or_dash(report.max_sdk)));
        Some(s)
    }

    fn format_source(&self, source: ExtractionSource) -> Option<String> {
        Some(format!("  Source:      {source}\n"))
    }
}

/// JSON report formatter.
///
/// Emits exactly the [`FinalReport`] object and nothing else.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Pretty-print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a compact JSON formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pretty-printing JSON formatter.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_file(&self, _path: &Path) -> String {
        String::new() // Handled in format_inspection
    }

    fn format_identity(&self, _report: &FinalReport) -> Option<String> {
        None // Handled in format_inspection
    }

    fn format_compatibility(&self, _report: &FinalReport) -> Option<String> {
        None // Handled in format_inspection
    }

    fn format_source(&self, _source: ExtractionSource) -> Option<String> {
        None // Not part of the report
    }

    fn format_inspection(&self, inspection: &Inspection, _path: &Path) -> String {
        let report = inspection.report();
        if self.pretty {
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Compact single-line output formatter.
#[derive(Debug, Clone, Default)]
pub struct ShortFormatter;

impl ShortFormatter {
    /// Create a new short formatter.
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for ShortFormatter {
    fn format_file(&self, path: &Path) -> String {
        format!("{}\t", path.display())
    }

    fn format_identity(&self, report: &FinalReport) -> Option<String> {
        Some(format!(
            "{}\t{}\t",
            report.version,
            or_dash(report.package_name.as_deref())
        ))
    }

    fn format_compatibility(&self, report: &FinalReport) -> Option<String> {
        Some(format!(
            "{}\t{}\t{}\t{}",
            report.wear_os_version,
            or_dash(report.min_sdk),
            or_dash(report.target_sdk),
            or_dash(report.max_sdk)
        ))
    }

    fn format_source(&self, _source: ExtractionSource) -> Option<String> {
        Some("\n".to_string())
    }
}
