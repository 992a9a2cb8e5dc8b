//! Deterministic price quoting.
//!
//! - Standard pricing: DOX slab rates or NON-DOX per-kg rates by zone.
//! - Reverse pricing: per-kg rates with enforced minimum weights, active
//!   when a NON-DOX shipment leaves a non-default origin address.

use serde::{Deserialize, Serialize};

use super::entities::{Quote, ServiceTier, ShipmentNature, TransportMode, Zone};
use super::weight::round2;
use super::zone;

pub const TAX_RATE: f64 = 0.18;

const GRAMS_PER_KG: f64 = 1000.0;
const DOX_SLAB_GRAMS: f64 = 500.0;
const DOX_STANDARD_FIRST_SLAB_GRAMS: f64 = 250.0;

/// Weight bands for DOX slab pricing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoxSlab {
    /// First standard-service band, up to 250 g.
    UpTo250g,
    /// Single priority band / second standard band, up to 500 g.
    UpTo500g,
    /// Fixed component for shipments over 500 g.
    Base500g,
    /// Added once per started 500 g above the base band.
    Add500g,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoxRate {
    pub zone: Zone,
    pub tier: ServiceTier,
    pub slab: DoxSlab,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerKgRate {
    pub zone: Zone,
    pub mode: TransportMode,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReverseRate {
    pub zone: Zone,
    pub mode: TransportMode,
    pub tier: ServiceTier,
    pub amount: f64,
}

/// The tariff as flat, typed rows. Tables are small (a handful of rows per
/// shape), so lookups scan rather than hash.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub dox: Vec<DoxRate>,
    pub per_kg: Vec<PerKgRate>,
    pub reverse: Vec<ReverseRate>,
}

impl RateTable {
    pub fn is_empty(&self) -> bool {
        self.dox.is_empty() && self.per_kg.is_empty() && self.reverse.is_empty()
    }

    pub fn dox_rate(&self, zone: Zone, tier: ServiceTier, slab: DoxSlab) -> Option<f64> {
        self.dox
            .iter()
            .find(|row| row.zone == zone && row.tier == tier && row.slab == slab)
            .map(|row| row.amount)
    }

    pub fn per_kg_rate(&self, zone: Zone, mode: TransportMode) -> Option<f64> {
        self.per_kg
            .iter()
            .find(|row| row.zone == zone && row.mode == mode)
            .map(|row| row.amount)
    }

    pub fn reverse_rate(
        &self,
        zone: Zone,
        mode: TransportMode,
        tier: ServiceTier,
    ) -> Option<f64> {
        self.reverse
            .iter()
            .find(|row| row.zone == zone && row.mode == mode && row.tier == tier)
            .map(|row| row.amount)
    }
}

/// Minimum chargeable weight per mode in reverse mode, in the unit the rate
/// table is configured in.
pub fn reverse_minimum(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Road => 500.0,
        TransportMode::Surface => 100.0,
        TransportMode::Air => 25.0,
    }
}

/// Everything the rating engine needs for one computation.
#[derive(Clone, Copy, Debug)]
pub struct RatingInput<'a> {
    pub nature: Option<ShipmentNature>,
    pub tier: Option<ServiceTier>,
    pub mode: Option<TransportMode>,
    pub destination_postal: &'a str,
    pub chargeable_weight: f64,
    pub origin_is_default: bool,
}

/// Compute a quote, or `None` while the draft is not quotable: destination
/// or weight missing, a required selector unset, or no matching rate row.
pub fn compute(table: &RateTable, input: &RatingInput<'_>) -> Option<Quote> {
    if input.destination_postal.trim().is_empty() || input.chargeable_weight <= 0.0 {
        return None;
    }

    let nature = input.nature?;
    let zone = zone::classify(input.destination_postal);

    if nature == ShipmentNature::NonDox && !input.origin_is_default {
        return compute_reverse(table, input, zone);
    }

    match nature {
        ShipmentNature::Dox => {
            let tier = input.tier?;
            let base = dox_price(table, zone, tier, input.chargeable_weight)?;
            // DOX travels by slab, not by mode.
            Some(build_quote(base, zone, None, input.chargeable_weight))
        }
        ShipmentNature::NonDox => {
            let mode = input.mode?;
            input.tier?;
            let rate = table.per_kg_rate(zone, mode)?;
            Some(build_quote(
                rate * input.chargeable_weight,
                zone,
                Some(mode),
                input.chargeable_weight,
            ))
        }
    }
}

fn compute_reverse(table: &RateTable, input: &RatingInput<'_>, zone: Zone) -> Option<Quote> {
    // Reverse tariffs cover Assam and the North East only.
    if zone == Zone::RestOfIndia {
        return None;
    }

    let mode = input.mode?;
    let tier = input.tier?;
    let final_weight = round2(input.chargeable_weight.max(reverse_minimum(mode)));
    let rate = table.reverse_rate(zone, mode, tier)?;

    Some(build_quote(rate * final_weight, zone, Some(mode), final_weight))
}

fn dox_price(table: &RateTable, zone: Zone, tier: ServiceTier, weight_kg: f64) -> Option<f64> {
    let grams = weight_kg * GRAMS_PER_KG;

    match tier {
        ServiceTier::Priority => {
            if grams <= DOX_SLAB_GRAMS {
                table.dox_rate(zone, tier, DoxSlab::UpTo500g)
            } else {
                dox_over_500(table, zone, tier, grams)
            }
        }
        ServiceTier::Standard => {
            if grams <= DOX_STANDARD_FIRST_SLAB_GRAMS {
                table.dox_rate(zone, tier, DoxSlab::UpTo250g)
            } else if grams <= DOX_SLAB_GRAMS {
                table.dox_rate(zone, tier, DoxSlab::UpTo500g)
            } else {
                dox_over_500(table, zone, tier, grams)
            }
        }
    }
}

fn dox_over_500(table: &RateTable, zone: Zone, tier: ServiceTier, grams: f64) -> Option<f64> {
    let base = table.dox_rate(zone, tier, DoxSlab::Base500g)?;
    let add = table.dox_rate(zone, tier, DoxSlab::Add500g)?;
    let extra_slabs = ((grams - DOX_SLAB_GRAMS) / DOX_SLAB_GRAMS).ceil();
    Some(base + extra_slabs * add)
}

fn build_quote(base: f64, zone: Zone, mode: Option<TransportMode>, weight: f64) -> Quote {
    let base_price = round2(base);
    let tax = round2(base_price * TAX_RATE);
    Quote {
        base_price,
        tax,
        final_price: round2(base_price + tax),
        zone,
        transport_mode_used: mode,
        chargeable_weight_used: weight,
    }
}
