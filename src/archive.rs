//! APK container access.
//!
//! An APK is a ZIP archive; the compiled manifest lives at the fixed entry
//! name [`MANIFEST_ENTRY`].

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{InspectError, Result};

/// Manifest entry name inside an APK.
pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Read the manifest entry from the APK at `path`.
pub fn read_manifest(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    read_manifest_from(BufReader::new(file), max_size)
}

/// Read the manifest entry from any seekable ZIP stream.
///
/// Entries larger than `max_size` are rejected, whether the archive declares
/// the size honestly or not.
pub fn read_manifest_from<R: Read + Seek>(reader: R, max_size: u64) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(reader)?;
    let entry = match archive.by_name(MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(InspectError::EntryMissing {
                entry: MANIFEST_ENTRY.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let declared = entry.size();
    if declared > max_size {
        return Err(InspectError::ManifestTooLarge {
            size: declared,
            limit: max_size,
        });
    }

    let mut data = Vec::with_capacity(declared as usize);
    entry.take(max_size.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > max_size {
        return Err(InspectError::ManifestTooLarge {
            size: data.len() as u64,
            limit: max_size,
        });
    }

    Ok(data)
}


#[cfg(test)]
mod tests {
    use super::testutil::zip_bytes;
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_manifest_entry() {
        let zip = zip_bytes(&[
            ("classes.dex", b"dex\n035\0"),
            (MANIFEST_ENTRY, b"\x03\x00\x08\x00manifest"),
        ]);
        let data = read_manifest_from(Cursor::new(zip), 1024).unwrap();
        assert_eq!(data, b"\x03\x00\x08\x00manifest");
    }

    #[test]
    fn test_missing_entry() {
        let zip = zip_bytes(&[("res/layout/main.xml", b"<x/>")]);
        let err = read_manifest_from(Cursor::new(zip), 1024).unwrap_err();
        assert!(matches!(err, InspectError::EntryMissing { .. }));
    }

    #[test]
    fn test_entry_name_is_exact() {
        let zip = zip_bytes(&[("assets/AndroidManifest.xml", b"nested")]);
        assert!(read_manifest_from(Cursor::new(zip), 1024).is_err());
    }

    #[test]
    fn test_not_a_zip() {
        let err = read_manifest_from(Cursor::new(b"definitely not a zip".to_vec()), 1024)
            .unwrap_err();
        assert!(matches!(err, InspectError::ArchiveUnreadable(_)));
    }

    #[test]
    fn test_size_cap() {
        let big = vec![b'x'; 4096];
        let zip = zip_bytes(&[(MANIFEST_ENTRY, big.as_slice())]);
        let err = read_manifest_from(Cursor::new(zip), 1024).unwrap_err();
        assert!(matches!(
            err,
            InspectError::ManifestTooLarge {
                size: 4096,
                limit: 1024
            }
        ));
    }

    #[test]
    fn test_unbounded_cap_reads_whole_entry() {
        let zip = zip_bytes(&[(MANIFEST_ENTRY, b"minSdkVersion 30")]);
        let data = read_manifest_from(Cursor::new(zip), u64::MAX).unwrap();
        assert_eq!(data, b"minSdkVersion 30");
    }

    #[test]
    fn test_missing_file() {
        let err = read_manifest(Path::new("/nonexistent/app.apk"), 1024).unwrap_err();
        assert!(matches!(err, InspectError::Io(_)));
    }
}
