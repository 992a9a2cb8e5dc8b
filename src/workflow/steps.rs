//! The ordered data-collection steps and their validation rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{BookingDraft, InsuranceChoice, Party, ServiceTier, ShipmentDetails};

use super::validate;

/// Workflow position, 1..6. Linear except for the previous-destination jump
/// after Origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    Origin,
    Destination,
    ShipmentNature,
    PackageDetails,
    ServicePayment,
    Preview,
}

impl Step {
    pub fn index(&self) -> u8 {
        match self {
            Step::Origin => 1,
            Step::Destination => 2,
            Step::ShipmentNature => 3,
            Step::PackageDetails => 4,
            Step::ServicePayment => 5,
            Step::Preview => 6,
        }
    }

    pub fn from_index(index: u8) -> Option<Step> {
        match index {
            1 => Some(Step::Origin),
            2 => Some(Step::Destination),
            3 => Some(Step::ShipmentNature),
            4 => Some(Step::PackageDetails),
            5 => Some(Step::ServicePayment),
            6 => Some(Step::Preview),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Step> {
        Step::from_index(self.index().saturating_sub(1))
    }
}

/// Field path → message. Ordered so error listings are stable.
pub type StepErrors = BTreeMap<String, String>;

/// Validate the fields a step collects. Empty map means the step may advance.
pub fn validate_step(draft: &BookingDraft, step: Step) -> StepErrors {
    let mut errors = StepErrors::new();
    match step {
        Step::Origin => validate_party("origin", &draft.origin, &mut errors),
        Step::Destination => validate_party("destination", &draft.destination, &mut errors),
        Step::ShipmentNature => validate_nature(&draft.shipment, &mut errors),
        Step::PackageDetails => validate_package(&draft.shipment, &mut errors),
        Step::ServicePayment => validate_service(draft, &mut errors),
        // Review only.
        Step::Preview => {}
    }
    errors
}

fn require(errors: &mut StepErrors, field: String, value: &str, message: &str) {
    if validate::is_blank(value) {
        errors.insert(field, message.to_string());
    }
}

fn validate_party(prefix: &str, party: &Party, errors: &mut StepErrors) {
    require(errors, format!("{prefix}.name"), &party.name, "name is required");

    if !validate::is_valid_email(&party.email) {
        errors.insert(format!("{prefix}.email"), "valid email is required".to_string());
    }
    if !validate::is_valid_mobile(&party.mobile) {
        errors.insert(
            format!("{prefix}.mobile"),
            "10-digit mobile number starting with 6-9 is required".to_string(),
        );
    }
    if !validate::is_valid_postal_code(&party.postal_code) {
        errors.insert(
            format!("{prefix}.postal_code"),
            "6-digit postal code is required".to_string(),
        );
    }

    // Area only becomes selectable once the postal code has resolved.
    if party.resolved.is_some() {
        require(errors, format!("{prefix}.area"), &party.area, "area is required");
    }
    require(errors, format!("{prefix}.street"), &party.street, "street/locality is required");
    require(
        errors,
        format!("{prefix}.building"),
        &party.building,
        "building/flat number is required",
    );

    if !validate::is_valid_tax_id(&party.tax_id) {
        errors.insert(
            format!("{prefix}.tax_id"),
            "tax id must be 15 characters in the positional format".to_string(),
        );
    }
    if !validate::is_valid_website(&party.website) {
        errors.insert(format!("{prefix}.website"), "website must be a URL or domain".to_string());
    }
}

fn validate_nature(shipment: &ShipmentDetails, errors: &mut StepErrors) {
    if shipment.nature.is_none() {
        errors.insert("shipment.nature".to_string(), "shipment nature is required".to_string());
    }
    let Some(insurance) = shipment.insurance else {
        errors.insert(
            "shipment.insurance".to_string(),
            "insurance choice is required".to_string(),
        );
        return;
    };
    // Risk coverage derives from the insurance choice, so it is present by now.

    if insurance == InsuranceChoice::WithInsurance {
        let details = &shipment.insurance_details;
        require(
            errors,
            "insurance.company".to_string(),
            &details.company,
            "insurance company is required",
        );
        require(
            errors,
            "insurance.policy_number".to_string(),
            &details.policy_number,
            "policy number is required",
        );
        if !validate::is_valid_date(&details.policy_date) {
            errors.insert(
                "insurance.policy_date".to_string(),
                "policy date is required".to_string(),
            );
        }
        if !validate::is_valid_date(&details.valid_upto) {
            errors.insert(
                "insurance.valid_upto".to_string(),
                "valid-upto date is required".to_string(),
            );
        } else if let (Some(from), Some(upto)) = (
            validate::parse_date(&details.policy_date),
            validate::parse_date(&details.valid_upto),
        ) {
            if upto < from {
                errors.insert(
                    "insurance.valid_upto".to_string(),
                    "valid-upto cannot precede the policy date".to_string(),
                );
            }
        }
        if details.document.is_none() {
            errors.insert(
                "insurance.document".to_string(),
                "insurance document is required".to_string(),
            );
        }
    }
}

fn validate_package(shipment: &ShipmentDetails, errors: &mut StepErrors) {
    if crate::domain::weight::parse_positive(&shipment.package_count)
        .filter(|count| count.fract() == 0.0)
        .is_none()
    {
        errors.insert(
            "shipment.package_count".to_string(),
            "package count is required".to_string(),
        );
    }
    require(
        errors,
        "shipment.package_type".to_string(),
        &shipment.package_type,
        "package type is required",
    );
    if shipment.package_type.trim() == "Others" && validate::is_blank(&shipment.package_type_other)
    {
        errors.insert(
            "shipment.package_type_other".to_string(),
            "describe the package type".to_string(),
        );
    }
    require(
        errors,
        "shipment.declared_value".to_string(),
        &shipment.declared_value,
        "declared value is required",
    );
    if crate::domain::weight::parse_positive(&shipment.actual_weight).is_none() {
        errors.insert(
            "shipment.actual_weight".to_string(),
            "actual weight is required".to_string(),
        );
    }
    if shipment.package_images.is_empty() {
        errors.insert(
            "shipment.package_images".to_string(),
            "at least one package image is required".to_string(),
        );
    }
    // Declaration document travels with a declared value.
    if !validate::is_blank(&shipment.declared_value) && shipment.declaration_document.is_none() {
        errors.insert(
            "shipment.declaration_document".to_string(),
            "declaration document is required".to_string(),
        );
    }
}

fn validate_service(draft: &BookingDraft, errors: &mut StepErrors) {
    let Some(tier) = draft.service.tier else {
        errors.insert("service.tier".to_string(), "service tier is required".to_string());
        return;
    };
    // NON-DOX prices per kg by mode, so a mode is needed on every tier.
    // DOX only carries one for Standard service.
    let mode_required = tier == ServiceTier::Standard
        || draft.shipment.nature == Some(crate::domain::ShipmentNature::NonDox);
    if mode_required && draft.service.mode.is_none() {
        errors.insert("service.mode".to_string(), "transport mode is required".to_string());
    }
    if draft.service.payment.is_none() {
        errors.insert("service.payment".to_string(), "payment type is required".to_string());
    }
}
