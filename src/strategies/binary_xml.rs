//! Binary manifest decoder adapter.
//!
//! Decoding is a capability: a [`ManifestDecoder`] may be unavailable in a
//! given configuration, or may fail on malformed input. Both cases surface
//! as an `Err` from [`attempt`], which the inspector treats as a soft
//! failure before falling back to the byte scan.

use std::fmt;

use crate::axml::XmlElement;
use crate::error::{InspectError, Result};
use crate::strategies::Attempt;
use crate::types::{parse_sdk, ExtractionResult};

/// Android resource namespace URI.
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

/// Structured binary XML decoding capability.
pub trait ManifestDecoder: fmt::Debug {
    /// Whether the capability can be used at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Decode compiled manifest bytes into an element tree.
    fn decode(&self, bytes: &[u8]) -> Result<XmlElement>;
}

/// The "capability absent" decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecoder;

impl ManifestDecoder for NoDecoder {
    fn is_available(&self) -> bool {
        false
    }

    fn decode(&self, _bytes: &[u8]) -> Result<XmlElement> {
        Err(InspectError::DecoderUnavailable)
    }
}

/// Decode `manifest` with `decoder` and extract metadata from the tree.
///
/// Returns `Ok(None)` when the tree carries none of the fields.
pub fn attempt(decoder: &dyn ManifestDecoder, manifest: &[u8]) -> Attempt {
    if !decoder.is_available() {
        return Err(InspectError::DecoderUnavailable);
    }
    let root = decoder.decode(manifest)?;
    Ok(extract(&root).into_found())
}

/// Extract metadata from a decoded manifest tree.
pub fn extract(root: &XmlElement) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    result.version = lookup(root, "versionName").map(str::to_string);
    result.package_name = lookup(root, "package").map(str::to_string);

    // Some manifests carry the SDK attributes on the root itself.
    let uses_sdk = root
        .find_descendant("uses-sdk")
        .or_else(|| (root.name == "manifest").then_some(root));

    if let Some(uses_sdk) = uses_sdk {
        if let Some(min_sdk) = lookup(uses_sdk, "minSdkVersion").and_then(parse_sdk) {
            result.set_min_sdk(min_sdk);
        }
        result.target_sdk = lookup(uses_sdk, "targetSdkVersion").and_then(parse_sdk);
        result.max_sdk = lookup(uses_sdk, "maxSdkVersion").and_then(parse_sdk);
    }

    result
}

/// Namespace-tolerant attribute lookup.
///
/// Tries `{namespace}name`, then `android:name`, then bare `name`; the first
/// non-empty value wins.
pub fn lookup<'a>(element: &'a XmlElement, name: &str) -> Option<&'a str> {
    let qualified = format!("{{{ANDROID_NAMESPACE}}}{name}");
    let prefixed = format!("android:{name}");
    let found = [qualified.as_str(), prefixed.as_str(), name]
        .into_iter()
        .filter_map(|key| element.attribute(key))
        .find(|value| !value.is_empty());
    found
}
