//! Strategy coordinator.
//!
//! The pipeline is linear:
//!
//! ```text
//! badging tool ──found──▶ done
//!      │ nothing / error
//!      ▼
//! open archive ──unreadable / no manifest──▶ done (defaults)
//!      │
//!      ▼
//! binary XML ──found──▶ done
//!      │ nothing / unavailable / error
//!      ▼
//! byte scan ──▶ done
//! ```
//!
//! The first strategy that resolves any field wins as a unit; later
//! strategies never fill gaps in an earlier result.

use std::path::Path;

use crate::archive;
use crate::axml::AxmlDecoder;
use crate::error::InspectError;
use crate::strategies::badging::{self, AaptTool, BadgingSource};
use crate::strategies::binary_xml::{self, ManifestDecoder};
use crate::strategies::{byte_scan, Attempt};
use crate::types::{ExtractionResult, ExtractionSource, InspectOptions, Inspection};

/// Runs the extraction strategies in priority order.
#[derive(Debug)]
pub struct Inspector {
    options: InspectOptions,
    badging: Option<Box<dyn BadgingSource>>,
    decoder: Box<dyn ManifestDecoder>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(InspectOptions::new())
    }
}

impl Inspector {
    /// Create an inspector with the built-in tool runner and decoder.
    pub fn new(options: InspectOptions) -> Self {
        let badging: Option<Box<dyn BadgingSource>> = if options.use_badging_tool {
            Some(Box::new(AaptTool::from_options(&options)))
        } else {
            None
        };
        Self {
            options,
            badging,
            decoder: Box::new(AxmlDecoder),
        }
    }

    /// Replace the badging tool runner.
    pub fn with_badging(mut self, source: impl BadgingSource + 'static) -> Self {
        self.badging = Some(Box::new(source));
        self
    }

    /// Skip the badging tool strategy.
    pub fn without_badging(mut self) -> Self {
        self.badging = None;
        self
    }

    /// Replace the binary XML decoding capability.
    pub fn with_decoder(mut self, decoder: impl ManifestDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Options this inspector was built with.
    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    /// Inspect the APK at `path`.
    ///
    /// Never fails: every strategy failure is absorbed, and an inspection
    /// with nothing resolved reports [`ExtractionSource::Defaults`].
    pub fn inspect(&self, path: &Path) -> Inspection {
        if let Some(source) = &self.badging {
            let attempt = badging::attempt(source.as_ref(), path);
            if let Some(result) = accept(ExtractionSource::Badging, attempt) {
                return Inspection::found(result, ExtractionSource::Badging);
            }
        }

        let manifest = match archive::read_manifest(path, self.options.max_manifest_size) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "manifest unavailable");
                return Inspection::empty();
            }
        };

        self.inspect_manifest(&manifest)
    }

    /// Run the manifest strategies over already-extracted manifest bytes.
    pub fn inspect_manifest(&self, manifest: &[u8]) -> Inspection {
        let decoded = binary_xml::attempt(self.decoder.as_ref(), manifest);
        if let Err(e) = &decoded {
            if !matches!(e, InspectError::DecoderUnavailable) {
                tracing::warn!(error = %e, "binary XML decode failed");
            }
        }
        if let Some(result) = accept(ExtractionSource::BinaryXml, decoded) {
            return Inspection::found(result, ExtractionSource::BinaryXml);
        }

        match byte_scan::scan(manifest).into_found() {
            Some(result) => Inspection::found(result, ExtractionSource::ByteScan),
            None => {
                tracing::debug!("no strategy resolved any field");
                Inspection::empty()
            }
        }
    }
}

/// Absorb a strategy attempt into "use this result" or "move on".
fn accept(source: ExtractionSource, attempt: Attempt) -> Option<ExtractionResult> {
    match attempt {
        Ok(Some(result)) => {
            tracing::debug!(%source, "strategy resolved metadata");
            Some(result)
        }
        Ok(None) => {
            tracing::debug!(%source, "strategy found nothing");
            None
        }
        Err(e) => {
            tracing::debug!(%source, error = %e, "strategy unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testutil::zip_bytes;
    use crate::archive::MANIFEST_ENTRY;
    use crate::axml::testutil::sample_manifest;
    use crate::axml::XmlElement;
    use crate::error::Result;
    use crate::strategies::binary_xml::NoDecoder;
    use crate::types::FinalReport;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    #[derive(Debug)]
    struct FakeBadging(&'static str);

    impl BadgingSource for FakeBadging {
        fn dump_badging(&self, _apk: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct MissingTool;

    impl BadgingSource for MissingTool {
        fn dump_badging(&self, _apk: &Path) -> Result<String> {
            Err(InspectError::ToolUnavailable {
                tool: "aapt".into(),
            })
        }
    }

    #[derive(Debug)]
    struct BrokenDecoder;

    impl ManifestDecoder for BrokenDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<XmlElement> {
            Err(InspectError::decode(0, "corrupt"))
        }
    }

    fn write_apk(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("app.apk");
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    fn offline() -> Inspector {
        Inspector::new(InspectOptions::offline())
    }

    #[test]
    fn test_badging_wins_as_a_unit() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, manifest.as_slice())]);

        let inspector = offline().with_badging(FakeBadging("package: name='from.tool'\n"));
        let inspection = inspector.inspect(&apk);
        assert_eq!(inspection.source, ExtractionSource::Badging);

        // Nothing from the decoded manifest leaks into the tool's result.
        let report = inspection.report();
        assert_eq!(report.package_name.as_deref(), Some("from.tool"));
        assert_eq!(report.version, "1.0.0");
        assert_eq!(report.min_sdk, None);
        assert_eq!(report.wear_os_version, "Wear OS 5.0+");
    }

    #[test]
    fn test_tool_failure_falls_through_to_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, manifest.as_slice())]);

        let inspection = offline().with_badging(MissingTool).inspect(&apk);
        assert_eq!(inspection.source, ExtractionSource::BinaryXml);
        assert_eq!(
            inspection.report(),
            FinalReport {
                success: true,
                version: "2.3.1".into(),
                wear_os_version: "Wear OS 4.0+".into(),
                package_name: Some("com.example.watchface".into()),
                min_sdk: Some(30),
                max_sdk: None,
                target_sdk: Some(34),
            }
        );
    }

    #[test]
    fn test_empty_tool_output_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, manifest.as_slice())]);

        let inspection = offline()
            .with_badging(FakeBadging("ERROR: dump failed because no manifest found"))
            .inspect(&apk);
        assert_eq!(inspection.source, ExtractionSource::BinaryXml);
    }

    #[test]
    fn test_decoder_failure_falls_through_to_byte_scan() {
        let manifest = b"\x00versionName\x00\x001.9\x00minSdkVersion\x00\x1c23";
        let inspectors = [
            offline().with_decoder(BrokenDecoder),
            offline().with_decoder(NoDecoder),
        ];
        for inspector in inspectors {
            let inspection = inspector.inspect_manifest(manifest);
            assert_eq!(inspection.source, ExtractionSource::ByteScan);
            let expected = ExtractionResult::new().with_version("1.9").with_min_sdk(23);
            assert_eq!(inspection.result, Some(expected));
        }
    }

    #[test]
    fn test_min_sdk_only_keeps_derived_wear_os() {
        let inspection = offline().inspect_manifest(b"minSdkVersion 35");
        let report = inspection.report();
        assert_eq!(report.version, "1.0.0");
        assert_eq!(report.wear_os_version, "Wear OS 5.1+");
        assert_eq!(report.min_sdk, Some(35));
    }

    #[test]
    fn test_malformed_archive_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("broken.apk");
        fs::write(&apk, b"this is not a zip archive").unwrap();

        let inspection = offline().inspect(&apk);
        assert_eq!(inspection, Inspection::empty());
        assert_eq!(inspection.report(), FinalReport::defaults());
    }

    #[test]
    fn test_missing_manifest_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let apk = write_apk(dir.path(), &[("classes.dex", b"dex\n035\0")]);
        assert_eq!(offline().inspect(&apk).report(), FinalReport::defaults());
    }

    #[test]
    fn test_oversized_manifest_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, manifest.as_slice())]);
        let inspector = Inspector::new(InspectOptions::offline().with_max_manifest_size(16));
        assert_eq!(inspector.inspect(&apk).source, ExtractionSource::Defaults);
    }

    #[test]
    fn test_nothing_anywhere_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, b"\x01\x02\x03\x04")]);
        let inspection = offline().with_badging(MissingTool).inspect(&apk);
        assert_eq!(inspection.source, ExtractionSource::Defaults);
        assert_eq!(inspection.report(), FinalReport::defaults());
    }

    #[test]
    fn test_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample_manifest();
        let apk = write_apk(dir.path(), &[(MANIFEST_ENTRY, manifest.as_slice())]);
        let inspector = offline();
        let first = serde_json::to_string(&inspector.inspect(&apk).report()).unwrap();
        let second = serde_json::to_string(&inspector.inspect(&apk).report()).unwrap();
        assert_eq!(first, second);
    }
}
