//! Final payload assembly and the submission handshake.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    AddressType, BookingConfirmation, BookingDraft, InsuranceChoice, Party, PaymentType,
    RiskCoverage, ServiceTier, ShipmentNature, TransportMode, Zone,
};
use crate::infra::api::{BookingApiClient, BookingApiError};

use super::engine::{BookingWorkflow, Phase};
use super::gate::GateState;
use super::steps::Step;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("workflow is not at the preview step")]
    NotAtPreview,
    #[error("no consignment assignment; booking is disabled")]
    WorkflowDisabled,
    #[error("consignment capacity exhausted: {0}")]
    CapacityExhausted(String),
    #[error("a submission is already in flight for this draft")]
    AlreadyInFlight,
    #[error("draft incomplete: missing {0}")]
    Incomplete(&'static str),
    #[error(transparent)]
    Api(#[from] BookingApiError),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub origin_data: PartyData,
    pub destination_data: PartyData,
    pub shipment_data: ShipmentData,
    pub invoice_data: InvoiceData,
    pub payment_data: PaymentData,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyData {
    pub name: String,
    pub company: String,
    pub email: String,
    pub mobile: String,
    pub postal_code: String,
    pub area: String,
    pub street: String,
    pub building: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub address_type: AddressType,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentData {
    pub nature: ShipmentNature,
    pub service: ServiceTier,
    /// Absent only for DOX priority, which prices by slab alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TransportMode>,
    pub package_count: String,
    pub package_type: String,
    pub declared_value: String,
    pub actual_weight: String,
    pub volumetric_weight: f64,
    pub chargeable_weight: f64,
    pub insurance: InsuranceChoice,
    /// Derived from the insurance choice; never a user input.
    pub risk_coverage: RiskCoverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_document_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_document_url: Option<String>,
    pub package_image_urls: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub base_price: f64,
    pub tax: f64,
    pub final_price: f64,
    pub zone: Zone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
    pub chargeable_weight: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub payment_type: PaymentType,
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn party_data(party: &Party) -> PartyData {
    PartyData {
        name: party.name.clone(),
        company: party.company.clone(),
        email: party.email.clone(),
        mobile: party.mobile.clone(),
        postal_code: party.postal_code.clone(),
        area: party.area.clone(),
        street: party.street.clone(),
        building: party.building.clone(),
        tax_id: optional(&party.tax_id),
        website: optional(&party.website),
        address_type: party.address_type,
    }
}

/// Assemble the submission payload from a finalized draft. Fails with the
/// first missing piece; the workflow's step validation normally guarantees
/// none are.
pub fn assemble_payload(draft: &BookingDraft) -> Result<BookingPayload, SubmitError> {
    let nature = draft.shipment.nature.ok_or(SubmitError::Incomplete("shipment nature"))?;
    let service = draft.service.tier.ok_or(SubmitError::Incomplete("service tier"))?;
    let payment = draft.service.payment.ok_or(SubmitError::Incomplete("payment type"))?;
    let insurance = draft.shipment.insurance.ok_or(SubmitError::Incomplete("insurance choice"))?;
    let quote = draft.quote.as_ref().ok_or(SubmitError::Incomplete("price quote"))?;

    let mode = if service == ServiceTier::Standard || nature == ShipmentNature::NonDox {
        Some(draft.service.mode.ok_or(SubmitError::Incomplete("transport mode"))?)
    } else {
        None
    };

    let volumetric = crate::domain::volumetric_weight(&draft.shipment.dimensions);
    let chargeable =
        crate::domain::chargeable_weight(&draft.shipment.actual_weight, volumetric);

    Ok(BookingPayload {
        origin_data: party_data(&draft.origin),
        destination_data: party_data(&draft.destination),
        shipment_data: ShipmentData {
            nature,
            service,
            mode,
            package_count: draft.shipment.package_count.clone(),
            package_type: draft.shipment.package_type.clone(),
            declared_value: draft.shipment.declared_value.clone(),
            actual_weight: draft.shipment.actual_weight.clone(),
            volumetric_weight: volumetric,
            chargeable_weight: chargeable,
            insurance,
            risk_coverage: insurance.risk_coverage(),
            declaration_document_url: draft
                .shipment
                .declaration_document
                .as_ref()
                .map(|file| file.url.clone()),
            insurance_document_url: draft
                .shipment
                .insurance_details
                .document
                .as_ref()
                .map(|file| file.url.clone()),
            package_image_urls: draft
                .shipment
                .package_images
                .iter()
                .map(|file| file.url.clone())
                .collect(),
        },
        invoice_data: InvoiceData {
            base_price: quote.base_price,
            tax: quote.tax,
            final_price: quote.final_price,
            zone: quote.zone,
            transport_mode: quote.transport_mode_used,
            chargeable_weight: quote.chargeable_weight_used,
        },
        payment_data: PaymentData { payment_type: payment },
    })
}

/// Hands a completed draft to the external booking endpoint, honoring the
/// capacity gate and the single in-flight-submit guard.
pub struct BookingSubmitter {
    client: BookingApiClient,
}

impl BookingSubmitter {
    pub fn new(client: BookingApiClient) -> Self {
        Self { client }
    }

    pub async fn submit(
        &self,
        workflow: &mut BookingWorkflow,
    ) -> Result<BookingConfirmation, SubmitError> {
        let payload = begin_submit(workflow)?;

        match self.client.submit_booking(&payload).await {
            Ok(confirmation) => {
                tracing::debug!(
                    consignment = %confirmation.consignment_number,
                    "booking submitted"
                );
                workflow.mark_submit_succeeded(confirmation.clone());
                Ok(confirmation)
            }
            Err(error) => {
                // Draft stays untouched for correction and resubmission.
                workflow.mark_submit_failed();
                Err(error.into())
            }
        }
    }
}

/// Run every pre-flight check and assemble the payload; marks the workflow
/// in-flight on success. Internal so the in-flight flag can only be set by
/// a submitter that also clears it.
pub(crate) fn begin_submit(
    workflow: &mut BookingWorkflow,
) -> Result<BookingPayload, SubmitError> {
    if !matches!(workflow.phase(), Phase::Collecting(Step::Preview)) {
        return Err(SubmitError::NotAtPreview);
    }
    match workflow.gate().state() {
        GateState::Ready { .. } => {}
        GateState::Disabled => return Err(SubmitError::WorkflowDisabled),
        GateState::Exhausted | GateState::Unknown => {
            return Err(SubmitError::CapacityExhausted(workflow.gate().exhausted_message()));
        }
    }
    if workflow.submit_in_flight() {
        return Err(SubmitError::AlreadyInFlight);
    }

    let payload = assemble_payload(workflow.draft())?;
    workflow.mark_submit_started();
    Ok(payload)
}

#[cfg(test)]
pub(crate) fn tests_payload() -> BookingPayload {
    match assemble_payload(&tests::completed_draft()) {
        Ok(payload) => payload,
        Err(error) => panic!("fixture draft should assemble: {error}"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{
        DimensionSet, DimensionUnit, PaymentType, Quote, ShipmentNature, UploadedFile,
    };

    fn party(postal_code: &str) -> Party {
        Party {
            name: "Asha Gogoi".to_string(),
            company: "Gogoi Traders".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9812345678".to_string(),
            postal_code: postal_code.to_string(),
            area: "Paltan Bazaar".to_string(),
            street: "MG Road".to_string(),
            building: "12A".to_string(),
            tax_id: String::new(),
            website: String::new(),
            address_type: AddressType::Office,
            resolved: None,
        }
    }

    pub(crate) fn completed_draft() -> BookingDraft {
        let mut draft = BookingDraft::with_default_origin(party("781001"));
        draft.destination = party("795001");
        draft.shipment.nature = Some(ShipmentNature::NonDox);
        draft.shipment.insurance = Some(InsuranceChoice::WithoutInsurance);
        draft.shipment.package_count = "2".to_string();
        draft.shipment.package_type = "Carton".to_string();
        draft.shipment.declared_value = "1500".to_string();
        draft.shipment.actual_weight = "4".to_string();
        draft.shipment.dimensions = vec![DimensionSet {
            id: "dim-1".to_string(),
            length: "30".to_string(),
            breadth: "20".to_string(),
            height: "10".to_string(),
            unit: DimensionUnit::Cm,
        }];
        draft.shipment.declaration_document = Some(UploadedFile {
            url: "https://files.example/declaration.pdf".to_string(),
        });
        draft.shipment.package_images = vec![UploadedFile {
            url: "https://files.example/pkg.jpg".to_string(),
        }];
        draft.service.tier = Some(ServiceTier::Standard);
        draft.service.mode = Some(TransportMode::Surface);
        draft.service.payment = Some(PaymentType::FreightPaid);
        draft.quote = Some(Quote {
            base_price: 180.0,
            tax: 32.4,
            final_price: 212.4,
            zone: Zone::NorthEast,
            transport_mode_used: Some(TransportMode::Surface),
            chargeable_weight_used: 4.0,
        });
        draft
    }

    #[test]
    fn assembles_every_payload_group() {
        let payload = assemble_payload(&completed_draft()).unwrap();

        assert_eq!(payload.origin_data.postal_code, "781001");
        assert_eq!(payload.destination_data.postal_code, "795001");
        assert_eq!(payload.shipment_data.chargeable_weight, 4.0);
        assert_eq!(payload.shipment_data.volumetric_weight, 1.2);
        assert_eq!(payload.invoice_data.final_price, 212.4);
        assert_eq!(payload.payment_data.payment_type, PaymentType::FreightPaid);
    }

    #[test]
    fn payload_serializes_with_camel_case_groups() {
        let payload = assemble_payload(&completed_draft()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("originData").is_some());
        assert!(json.get("destinationData").is_some());
        assert!(json.get("shipmentData").is_some());
        assert!(json.get("invoiceData").is_some());
        assert!(json.get("paymentData").is_some());
        assert_eq!(json["shipmentData"]["nature"], "NON-DOX");
        assert_eq!(json["shipmentData"]["riskCoverage"], "Owner");
        assert_eq!(json["paymentData"]["paymentType"], "FP");
    }

    #[test]
    fn dox_priority_omits_the_transport_mode() {
        let mut draft = completed_draft();
        draft.shipment.nature = Some(ShipmentNature::Dox);
        draft.service.tier = Some(ServiceTier::Priority);
        draft.service.mode = None;
        draft.quote = Some(Quote {
            base_price: 40.0,
            tax: 7.2,
            final_price: 47.2,
            zone: Zone::NorthEast,
            transport_mode_used: None,
            chargeable_weight_used: 4.0,
        });

        let payload = assemble_payload(&draft).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert!(payload.shipment_data.mode.is_none());
        assert!(json["shipmentData"].get("mode").is_none());
    }

    #[test]
    fn non_dox_priority_keeps_its_transport_mode() {
        let mut draft = completed_draft();
        draft.service.tier = Some(ServiceTier::Priority);

        let payload = assemble_payload(&draft).unwrap();
        assert_eq!(payload.shipment_data.mode, Some(TransportMode::Surface));

        draft.service.mode = None;
        let error = assemble_payload(&draft).unwrap_err();
        assert!(matches!(error, SubmitError::Incomplete("transport mode")));
    }

    #[test]
    fn standard_service_requires_a_transport_mode() {
        let mut draft = completed_draft();
        draft.service.mode = None;

        let error = assemble_payload(&draft).unwrap_err();
        assert!(matches!(error, SubmitError::Incomplete("transport mode")));
    }

    #[test]
    fn missing_quote_blocks_assembly() {
        let mut draft = completed_draft();
        draft.quote = None;

        let error = assemble_payload(&draft).unwrap_err();
        assert!(matches!(error, SubmitError::Incomplete("price quote")));
    }

    #[test]
    fn blank_tax_id_and_website_are_omitted() {
        let payload = assemble_payload(&completed_draft()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert!(payload.origin_data.tax_id.is_none());
        assert!(json["originData"].get("taxId").is_none());
    }
}
