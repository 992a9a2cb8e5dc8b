//! Billable-weight derivation: volumetric and chargeable weight.

use super::entities::{DimensionSet, DimensionUnit};

const CM_PER_INCH: f64 = 2.54;
const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Round to two decimals; the resolution every weight and price carries.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a form-entered numeric string; malformed or non-positive input
/// counts as absent.
pub fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn dimension_volumetric(set: &DimensionSet) -> f64 {
    let (Some(length), Some(breadth), Some(height)) = (
        parse_positive(&set.length),
        parse_positive(&set.breadth),
        parse_positive(&set.height),
    ) else {
        return 0.0;
    };

    let scale = match set.unit {
        DimensionUnit::Cm => 1.0,
        DimensionUnit::In => CM_PER_INCH,
    };

    let volumetric =
        (length * scale) * (breadth * scale) * (height * scale) / VOLUMETRIC_DIVISOR;
    if volumetric.is_finite() {
        volumetric
    } else {
        0.0
    }
}

/// Total volumetric weight across all dimension sets, in kilograms.
pub fn volumetric_weight(sets: &[DimensionSet]) -> f64 {
    round2(sets.iter().map(dimension_volumetric).sum())
}

/// Chargeable weight: the greater of actual and volumetric weight, zero when
/// neither yields a positive value.
pub fn chargeable_weight(actual_weight: &str, volumetric: f64) -> f64 {
    let actual = parse_positive(actual_weight).unwrap_or(0.0);
    let weight = round2(actual.max(volumetric));
    if weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(length: &str, breadth: &str, height: &str, unit: DimensionUnit) -> DimensionSet {
        DimensionSet {
            id: "dim-test".to_string(),
            length: length.to_string(),
            breadth: breadth.to_string(),
            height: height.to_string(),
            unit,
        }
    }

    #[test]
    fn volumetric_from_cm_dimensions() {
        let sets = [dims("30", "20", "10", DimensionUnit::Cm)];
        assert_eq!(volumetric_weight(&sets), 1.2);
    }

    #[test]
    fn chargeable_is_max_of_actual_and_volumetric() {
        let sets = [dims("30", "20", "10", DimensionUnit::Cm)];
        let volumetric = volumetric_weight(&sets);
        assert_eq!(chargeable_weight("2", volumetric), 2.0);
        assert_eq!(chargeable_weight("0.5", volumetric), 1.2);
    }

    #[test]
    fn inches_are_converted_before_the_formula() {
        let inches = [dims("10", "10", "10", DimensionUnit::In)];
        let cm = [dims("25.4", "25.4", "25.4", DimensionUnit::Cm)];
        assert_eq!(volumetric_weight(&inches), volumetric_weight(&cm));
    }

    #[test]
    fn missing_or_malformed_dimensions_yield_zero() {
        assert_eq!(volumetric_weight(&[dims("30", "", "10", DimensionUnit::Cm)]), 0.0);
        assert_eq!(volumetric_weight(&[dims("30", "abc", "10", DimensionUnit::Cm)]), 0.0);
        assert_eq!(volumetric_weight(&[dims("-5", "20", "10", DimensionUnit::Cm)]), 0.0);
        assert_eq!(volumetric_weight(&[]), 0.0);
    }

    #[test]
    fn multiple_dimension_sets_are_summed() {
        let sets = [
            dims("30", "20", "10", DimensionUnit::Cm),
            dims("50", "10", "10", DimensionUnit::Cm),
        ];
        assert_eq!(volumetric_weight(&sets), 2.2);
    }

    #[test]
    fn non_positive_inputs_charge_nothing() {
        assert_eq!(chargeable_weight("", 0.0), 0.0);
        assert_eq!(chargeable_weight("-3", 0.0), 0.0);
        assert_eq!(chargeable_weight("junk", 0.0), 0.0);
    }

    #[test]
    fn results_are_rounded_to_two_decimals() {
        let sets = [dims("11", "11", "11", DimensionUnit::Cm)];
        // 1331 / 5000 = 0.2662
        assert_eq!(volumetric_weight(&sets), 0.27);
    }
}
