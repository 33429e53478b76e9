//! Raw byte-pattern strategy.
//!
//! Used when structured decoding is unavailable or fails. The manifest bytes
//! are read as Latin-1 text, so any input decodes, and each field is matched
//! against an ordered list of patterns; the first pattern that matches wins.
//!
//! Package names are not extracted here. The compiled manifest stores them
//! in the UTF-16 string pool with nothing adjacent to anchor a pattern on, so
//! this path leaves `package_name` unset.

use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;

use crate::types::{parse_sdk, ExtractionResult};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
}

static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"versionName[\x00-\x20]*([0-9]+\.[0-9]+(?:\.[0-9]+)?(?:\.[0-9]+)?)",
        r#"versionName["']([^"']+)["']"#,
    ])
});

static MIN_SDK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"minSdkVersion[\x00-\x20]*(\d+)",
        r#"minSdkVersion["'](\d+)["']"#,
    ])
});

static TARGET_SDK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"targetSdkVersion[\x00-\x20]*(\d+)",
        r#"targetSdkVersion["'](\d+)["']"#,
    ])
});

static MAX_SDK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"maxSdkVersion[\x00-\x20]*(\d+)",
        r#"maxSdkVersion["'](\d+)["']"#,
    ])
});

/// Decode bytes as Latin-1: every byte becomes the code point of equal value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Scan raw manifest bytes. Never fails; may return an empty result.
pub fn scan(manifest: &[u8]) -> ExtractionResult {
    let text = latin1(manifest);
    let mut result = ExtractionResult::new();

    if memmem::find(manifest, b"versionName").is_some() {
        result.version = first_match(&VERSION_PATTERNS, &text, |s| Some(s.to_string()));
    }
    if memmem::find(manifest, b"minSdkVersion").is_some() {
        if let Some(min_sdk) = first_match(&MIN_SDK_PATTERNS, &text, parse_sdk) {
            result.set_min_sdk(min_sdk);
        }
    }
    if memmem::find(manifest, b"targetSdkVersion").is_some() {
        result.target_sdk = first_match(&TARGET_SDK_PATTERNS, &text, parse_sdk);
    }
    if memmem::find(manifest, b"maxSdkVersion").is_some() {
        result.max_sdk = first_match(&MAX_SDK_PATTERNS, &text, parse_sdk);
    }

    result
}

/// First pattern whose capture converts successfully.
fn first_match<T>(
    patterns: &[Regex],
    text: &str,
    convert: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    patterns
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| convert(caps.get(1)?.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_separated_values() {
        let mut data = b"\x03\x00\x08\x00garbage".to_vec();
        data.extend_from_slice(b"versionName\x00\x05\x001.4.2\x00");
        data.extend_from_slice(b"minSdkVersion\x00\x1e30\x00");
        data.extend_from_slice(b"targetSdkVersion 34");
        let result = scan(&data);
        assert_eq!(result.version.as_deref(), Some("1.4.2"));
        assert_eq!(result.min_sdk(), Some(30));
        assert_eq!(result.wear_os_version(), Some("Wear OS 4.0+"));
        assert_eq!(result.target_sdk, Some(34));
        assert_eq!(result.max_sdk, None);
        assert_eq!(result.package_name, None);
    }

    #[test]
    fn test_quoted_forms() {
        let data = br#"<manifest versionName"beta-7" minSdkVersion'26' maxSdkVersion"33">"#;
        let result = scan(data);
        assert_eq!(result.version.as_deref(), Some("beta-7"));
        assert_eq!(result.min_sdk(), Some(26));
        assert_eq!(result.max_sdk, Some(33));
    }

    #[test]
    fn test_dotted_form_wins_over_quoted() {
        let data = b"versionName\"q\" ... versionName\x002.0";
        assert_eq!(scan(data).version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_version_needs_two_components() {
        assert_eq!(scan(b"versionName 7 and nothing else").version, None);
        assert_eq!(scan(b"versionName1.2.3.4.5").version.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn test_arbitrary_bytes_do_not_fail() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert!(scan(&data).is_empty());
        assert!(scan(&[]).is_empty());
    }

    #[test]
    fn test_high_bytes_decode_as_latin1() {
        assert_eq!(latin1(&[0x41, 0xE9, 0xFF]), "A\u{e9}\u{ff}");
    }

    #[test]
    fn test_overflowing_sdk_falls_through() {
        let data = b"minSdkVersion 99999999999999 minSdkVersion'31'";
        assert_eq!(scan(data).min_sdk(), Some(31));
    }
}
