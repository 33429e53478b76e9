//! Metadata extraction strategies.
//!
//! Each strategy is one self-contained technique, attempted in a fixed
//! priority order by the [`Inspector`](crate::Inspector):
//!
//! 1. [`badging`]: parse `aapt dump badging` output
//! 2. [`binary_xml`]: decode the compiled manifest into an element tree
//! 3. [`byte_scan`]: pattern-match the raw manifest bytes
//!
//! A strategy attempt yields an [`Attempt`]: `Ok(Some(_))` when at least one
//! field was resolved, `Ok(None)` when it ran but found nothing, and `Err(_)`
//! for exceptional soft failures the inspector logs and absorbs.

pub mod badging;
pub mod binary_xml;
pub mod byte_scan;

use crate::error::Result;
use crate::types::ExtractionResult;

/// Outcome of one strategy attempt.
pub type Attempt = Result<Option<ExtractionResult>>;
