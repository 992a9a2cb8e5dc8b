use serde::{Deserialize, Serialize};

use crate::util::generate_id;

/// Shipment nature, wire-encoded the way the booking API expects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentNature {
    #[serde(rename = "DOX")]
    Dox,
    #[serde(rename = "NON-DOX")]
    NonDox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTier {
    Standard,
    Priority,
}

/// Transport mode; meaningful only when the service tier is Standard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    Air,
    Surface,
    Road,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionUnit {
    #[default]
    #[serde(rename = "cm")]
    Cm,
    #[serde(rename = "in")]
    In,
}

/// Freight-Paid vs To-Pay settlement tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "FP")]
    FreightPaid,
    #[serde(rename = "TP")]
    ToPay,
}

/// Geographic pricing bucket derived from the destination postal code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Assam,
    NorthEast,
    RestOfIndia,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsuranceChoice {
    #[serde(rename = "With insurance")]
    WithInsurance,
    #[serde(rename = "Without insurance")]
    WithoutInsurance,
}

impl InsuranceChoice {
    /// Risk coverage is a pure function of the insurance choice.
    pub fn risk_coverage(&self) -> RiskCoverage {
        match self {
            InsuranceChoice::WithInsurance => RiskCoverage::Carrier,
            InsuranceChoice::WithoutInsurance => RiskCoverage::Owner,
        }
    }
}

/// Derived from [`InsuranceChoice`]; never an independent user choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCoverage {
    Carrier,
    Owner,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    Home,
    Office,
    Other,
}

/// City/state/district plus area choices returned by postal-code resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostalArea {
    pub city: String,
    pub state: String,
    pub district: String,
    pub areas: Vec<String>,
}

/// One side of the booking: sender or receiver contact and address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub company: String,
    pub email: String,
    pub mobile: String,
    pub postal_code: String,
    pub area: String,
    pub street: String,
    pub building: String,
    pub tax_id: String,
    pub website: String,
    pub address_type: AddressType,
    /// Filled once the postal code resolves; area selection is gated on it.
    pub resolved: Option<PostalArea>,
}

/// One length/breadth/height row as entered on the form. Values stay raw
/// strings; the weight calculator parses them and treats malformed input
/// as zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionSet {
    pub id: String,
    pub length: String,
    pub breadth: String,
    pub height: String,
    pub unit: DimensionUnit,
}

impl DimensionSet {
    pub fn new(unit: DimensionUnit) -> Self {
        Self {
            id: generate_id("dim"),
            length: String::new(),
            breadth: String::new(),
            height: String::new(),
            unit,
        }
    }
}

/// Reference to a file already pushed through the upload collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsuranceDetails {
    pub company: String,
    pub policy_number: String,
    pub policy_date: String,
    pub valid_upto: String,
    pub document: Option<UploadedFile>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub nature: Option<ShipmentNature>,
    pub dimensions: Vec<DimensionSet>,
    pub actual_weight: String,
    pub package_count: String,
    pub package_type: String,
    /// Free-text description, required when `package_type` is "Others".
    pub package_type_other: String,
    pub declared_value: String,
    pub insurance: Option<InsuranceChoice>,
    pub insurance_details: InsuranceDetails,
    pub declaration_document: Option<UploadedFile>,
    pub package_images: Vec<UploadedFile>,
}

impl Default for ShipmentDetails {
    fn default() -> Self {
        Self {
            nature: None,
            dimensions: vec![DimensionSet::new(DimensionUnit::Cm)],
            actual_weight: String::new(),
            package_count: String::new(),
            package_type: String::new(),
            package_type_other: String::new(),
            declared_value: String::new(),
            insurance: None,
            insurance_details: InsuranceDetails::default(),
            declaration_document: None,
            package_images: Vec::new(),
        }
    }
}

impl ShipmentDetails {
    pub fn risk_coverage(&self) -> Option<RiskCoverage> {
        self.insurance.map(|choice| choice.risk_coverage())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub tier: Option<ServiceTier>,
    pub mode: Option<TransportMode>,
    pub payment: Option<PaymentType>,
}

/// Deterministic price quote. Derived and recomputed by the rating engine,
/// never hand-edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub base_price: f64,
    pub tax: f64,
    pub final_price: f64,
    pub zone: Zone,
    /// Mode the rating actually used; absent for DOX quotes, which price
    /// by slab regardless of mode.
    pub transport_mode_used: Option<TransportMode>,
    /// Post-minimum weight in reverse mode, plain chargeable weight otherwise.
    pub chargeable_weight_used: f64,
}

/// The single mutable aggregate for one booking session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub origin: Party,
    pub destination: Party,
    /// Whether the origin is still the caller's default address; reverse
    /// pricing activates when it is not.
    pub origin_is_default: bool,
    pub shipment: ShipmentDetails,
    pub service: ServiceSelection,
    pub quote: Option<Quote>,
}

impl BookingDraft {
    /// New draft pre-filled from the caller's default origin address.
    pub fn with_default_origin(origin: Party) -> Self {
        Self {
            origin,
            destination: Party::default(),
            origin_is_default: true,
            shipment: ShipmentDetails::default(),
            service: ServiceSelection::default(),
            quote: None,
        }
    }
}

/// A receiver the caller has shipped to before, keyed by phone lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub name: String,
    pub company: String,
    pub email: String,
    pub mobile: String,
    pub postal_code: String,
    pub area: String,
    pub street: String,
    pub building: String,
}

impl DestinationRecord {
    pub fn into_party(self) -> Party {
        Party {
            name: self.name,
            company: self.company,
            email: self.email,
            mobile: self.mobile,
            postal_code: self.postal_code,
            area: self.area,
            street: self.street,
            building: self.building,
            ..Party::default()
        }
    }
}

/// Capacity snapshot from the consignment-availability collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentAvailability {
    pub has_assignment: bool,
    pub available_count: u32,
    pub message: Option<String>,
}

/// Successful booking response.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingConfirmation {
    pub booking_reference: String,
    pub consignment_number: String,
}
