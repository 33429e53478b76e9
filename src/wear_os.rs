//! Minimum SDK level to Wear OS release mapping.
//!
//! This is the only place the compatibility thresholds live. Every strategy
//! reaches it through [`crate::types::ExtractionResult::set_min_sdk`].

/// Label for SDK levels below the first Wear OS release.
pub const NOT_COMPATIBLE: &str = "Not compatible";

/// Thresholds ordered from newest to oldest; first match wins.
///
/// | min SDK | Android        | Wear OS |
/// |---------|----------------|---------|
/// | 35+     | 15+            | 5.1+    |
/// | 34      | 14             | 5.0+    |
/// | 30-33   | 11-13          | 4.0+    |
/// | 28-29   | 9-10           | 3.0+    |
/// | 25-27   | 7.1-8.1        | 2.0+    |
/// | 23-24   | 6.0-7.0        | 1.0+    |
pub const WEAR_OS_TIERS: [(u32, &str); 6] = [
    (35, "Wear OS 5.1+"),
    (34, "Wear OS 5.0+"),
    (30, "Wear OS 4.0+"),
    (28, "Wear OS 3.0+"),
    (25, "Wear OS 2.0+"),
    (23, "Wear OS 1.0+"),
];

/// Map a minimum SDK level to the oldest compatible Wear OS release.
///
/// Total over all inputs; levels below 23 map to [`NOT_COMPATIBLE`].
///
/// # Example
///
/// ```rust
/// use apk_inspect::wear_os::map_sdk_to_wear_os;
///
/// assert_eq!(map_sdk_to_wear_os(30), "Wear OS 4.0+");
/// assert_eq!(map_sdk_to_wear_os(21), "Not compatible");
/// ```
pub fn map_sdk_to_wear_os(min_sdk: u32) -> &'static str {
    WEAR_OS_TIERS
        .iter()
        .find(|&&(threshold, _)| min_sdk >= threshold)
        .map_or(NOT_COMPATIBLE, |&(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 for incompatible, increasing with newer releases.
    fn tier_rank(label: &str) -> usize {
        WEAR_OS_TIERS
            .iter()
            .rev()
            .position(|(_, l)| *l == label)
            .map_or(0, |i| i + 1)
    }

    #[test]
    fn test_below_first_release() {
        for sdk in 0..=22 {
            assert_eq!(map_sdk_to_wear_os(sdk), NOT_COMPATIBLE, "sdk {sdk}");
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(map_sdk_to_wear_os(23), "Wear OS 1.0+");
        assert_eq!(map_sdk_to_wear_os(24), "Wear OS 1.0+");
        assert_eq!(map_sdk_to_wear_os(25), "Wear OS 2.0+");
        assert_eq!(map_sdk_to_wear_os(28), "Wear OS 3.0+");
        assert_eq!(map_sdk_to_wear_os(30), "Wear OS 4.0+");
        assert_eq!(map_sdk_to_wear_os(33), "Wear OS 4.0+");
        assert_eq!(map_sdk_to_wear_os(34), "Wear OS 5.0+");
        assert_eq!(map_sdk_to_wear_os(35), "Wear OS 5.1+");
    }

    #[test]
    fn test_future_levels_do_not_fail() {
        assert_eq!(map_sdk_to_wear_os(99), "Wear OS 5.1+");
        assert_eq!(map_sdk_to_wear_os(u32::MAX), "Wear OS 5.1+");
    }

    #[test]
    fn test_monotonic() {
        let mut previous = tier_rank(map_sdk_to_wear_os(0));
        for sdk in 1..=64 {
            let rank = tier_rank(map_sdk_to_wear_os(sdk));
            assert!(rank >= previous, "sdk {sdk} dropped a tier");
            previous = rank;
        }
    }
}
