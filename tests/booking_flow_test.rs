//! End-to-end run of the booking wizard against a mocked back end.

use httpmock::prelude::*;

use shipbook::domain::{
    ConsignmentAvailability, DimensionUnit, InsuranceChoice, Party, PaymentType, ServiceTier,
    ShipmentNature, TransportMode, UploadedFile, Zone,
};
use shipbook::infra::BookingApiClient;
use shipbook::workflow::{
    Advance, BookingSubmitter, BookingWorkflow, Phase, Step, SubmitError,
};

fn default_origin() -> Party {
    Party {
        name: "Asha Gogoi".to_string(),
        company: "Gogoi Traders".to_string(),
        email: "asha@example.com".to_string(),
        mobile: "9812345678".to_string(),
        postal_code: "781001".to_string(),
        area: String::new(),
        street: "MG Road".to_string(),
        building: "12A".to_string(),
        tax_id: String::new(),
        website: String::new(),
        address_type: Default::default(),
        resolved: None,
    }
}

fn rate_table_body() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "data": {
            "tariffVersion": "2026-08",
            "nonDox": {
                "northEast": { "air": 60.0, "surface": 30.0 }
            }
        }
    })
}

/// Drive a fresh workflow all the way to Preview with a complete NON-DOX
/// draft destined for Manipur.
fn reach_preview(workflow: &mut BookingWorkflow) {
    workflow.set_availability(ConsignmentAvailability {
        has_assignment: true,
        available_count: 3,
        message: None,
    });

    assert_eq!(workflow.next(), Advance::LookupStarted);
    workflow.destination_lookup_completed(Vec::new());
    workflow.dismiss_lookup();
    assert_eq!(workflow.step(), Some(Step::Destination));

    workflow.set_destination_postal("795001");
    workflow.edit_destination(|party| {
        party.name = "Ravi Singh".to_string();
        party.email = "ravi@example.com".to_string();
        party.mobile = "9876543210".to_string();
        party.street = "Bazar Road".to_string();
        party.building = "4".to_string();
    });
    assert_eq!(workflow.next(), Advance::Moved(Step::ShipmentNature));

    workflow.set_nature(ShipmentNature::NonDox);
    workflow.set_insurance(InsuranceChoice::WithoutInsurance);
    assert_eq!(workflow.next(), Advance::Moved(Step::PackageDetails));

    workflow.set_actual_weight("4");
    let dimension_id = workflow.draft().shipment.dimensions[0].id.clone();
    workflow.update_dimension_set(&dimension_id, |set| {
        set.length = "30".to_string();
        set.breadth = "20".to_string();
        set.height = "10".to_string();
        set.unit = DimensionUnit::Cm;
    });
    workflow.edit_shipment(|shipment| {
        shipment.package_count = "2".to_string();
        shipment.package_type = "Carton".to_string();
        shipment.declared_value = "1500".to_string();
        shipment.declaration_document = Some(UploadedFile {
            url: "https://files.example/declaration.pdf".to_string(),
        });
    });
    workflow.add_package_image(
        "pkg.jpg",
        UploadedFile { url: "https://files.example/pkg.jpg".to_string() },
    );
    assert_eq!(workflow.next(), Advance::Moved(Step::ServicePayment));

    workflow.set_service_tier(ServiceTier::Standard);
    workflow.set_transport_mode(TransportMode::Surface);
    workflow.set_payment(PaymentType::FreightPaid);
    assert_eq!(workflow.next(), Advance::Moved(Step::Preview));
}

#[tokio::test]
async fn books_a_shipment_end_to_end() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rates");
        then.status(200).json_body(rate_table_body());
    });
    let booking_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/bookings")
            .json_body_partial(
                r#"{
                    "destinationData": { "postalCode": "795001" },
                    "shipmentData": { "nature": "NON-DOX", "mode": "Surface" },
                    "paymentData": { "paymentType": "FP" }
                }"#,
            );
        then.status(200).json_body(serde_json::json!({
            "success": true,
            "bookingReference": "BK-2206",
            "consignmentNumber": "CN-445566"
        }));
    });

    let client = BookingApiClient::with_base_url(&server.url("/"))
        .unwrap()
        .without_disk_cache();
    let mut workflow = BookingWorkflow::new(default_origin());
    workflow.set_rate_table(client.get_rate_table().await.unwrap().data);

    reach_preview(&mut workflow);

    // 4 kg actual beats 1.2 kg volumetric; NorthEast surface at 30/kg.
    let quote = workflow.quote().unwrap();
    assert_eq!(quote.zone, Zone::NorthEast);
    assert_eq!(quote.base_price, 120.0);
    assert_eq!(quote.final_price, 141.6);

    let confirmation = BookingSubmitter::new(client)
        .submit(&mut workflow)
        .await
        .unwrap();

    booking_mock.assert();
    assert_eq!(confirmation.consignment_number, "CN-445566");
    assert!(matches!(workflow.phase(), Phase::Submitted(_)));
    assert!(!workflow.submit_in_flight());
    assert_eq!(workflow.preview_count(), 0);
}

#[tokio::test]
async fn exhausted_capacity_blocks_submission_but_not_editing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rates");
        then.status(200).json_body(rate_table_body());
    });

    let client = BookingApiClient::with_base_url(&server.url("/"))
        .unwrap()
        .without_disk_cache();
    let mut workflow = BookingWorkflow::new(default_origin());
    workflow.set_rate_table(client.get_rate_table().await.unwrap().data);
    reach_preview(&mut workflow);

    workflow.set_availability(ConsignmentAvailability {
        has_assignment: true,
        available_count: 0,
        message: Some("monthly quota exhausted".to_string()),
    });

    // Editing is still allowed; only submission is refused.
    workflow.set_actual_weight("5");
    assert_eq!(workflow.draft().shipment.actual_weight, "5");

    let error = BookingSubmitter::new(client)
        .submit(&mut workflow)
        .await
        .unwrap_err();
    assert!(matches!(error, SubmitError::CapacityExhausted(_)));
    assert!(matches!(workflow.phase(), Phase::Collecting(Step::Preview)));
}

#[tokio::test]
async fn rejected_booking_keeps_the_draft_for_resubmission() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rates");
        then.status(200).json_body(rate_table_body());
    });
    server.mock(|when, then| {
        when.method(POST).path("/bookings");
        then.status(200).json_body(serde_json::json!({
            "success": false,
            "message": "destination not serviceable"
        }));
    });

    let client = BookingApiClient::with_base_url(&server.url("/"))
        .unwrap()
        .without_disk_cache();
    let mut workflow = BookingWorkflow::new(default_origin());
    workflow.set_rate_table(client.get_rate_table().await.unwrap().data);
    reach_preview(&mut workflow);

    let error = BookingSubmitter::new(client)
        .submit(&mut workflow)
        .await
        .unwrap_err();

    assert!(matches!(error, SubmitError::Api(_)));
    assert!(!workflow.submit_in_flight());
    assert!(matches!(workflow.phase(), Phase::Collecting(Step::Preview)));
    assert_eq!(workflow.draft().destination.postal_code, "795001");
}
