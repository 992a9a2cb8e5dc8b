//! Domain logic for shipment booking lives here.

pub mod entities;
pub mod rating;
pub mod weight;
pub mod zone;

pub use entities::{
    AddressType, BookingConfirmation, BookingDraft, ConsignmentAvailability, DestinationRecord,
    DimensionSet, DimensionUnit, InsuranceChoice, InsuranceDetails, Party, PaymentType,
    PostalArea, Quote, RiskCoverage, ServiceSelection, ServiceTier, ShipmentDetails,
    ShipmentNature, TransportMode, UploadedFile, Zone,
};
pub use rating::{
    compute, reverse_minimum, DoxRate, DoxSlab, PerKgRate, RateTable, RatingInput, ReverseRate,
    TAX_RATE,
};
pub use weight::{chargeable_weight, round2, volumetric_weight};
pub use zone::classify;
