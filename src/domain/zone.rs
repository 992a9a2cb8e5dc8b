//! Destination postal code to pricing zone.

use super::entities::Zone;

const ASSAM_RANGE: std::ops::RangeInclusive<u32> = 780_000..=788_999;
const NORTH_EAST_RANGE: std::ops::RangeInclusive<u32> = 790_000..=799_999;

/// Classify a destination postal code into its pricing zone.
///
/// Malformed (non-numeric) codes classify as RestOfIndia; step validation
/// rejects them before a booking can be submitted.
pub fn classify(postal_code: &str) -> Zone {
    match postal_code.trim().parse::<u32>() {
        Ok(code) if ASSAM_RANGE.contains(&code) => Zone::Assam,
        Ok(code) if NORTH_EAST_RANGE.contains(&code) => Zone::NorthEast,
        _ => Zone::RestOfIndia,
    }
}
