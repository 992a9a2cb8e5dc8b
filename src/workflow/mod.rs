//! The ordered booking wizard: steps, validation, gate, submission.

pub mod engine;
pub mod gate;
pub mod preview;
pub mod steps;
pub mod submit;
pub mod validate;

pub use engine::{Advance, BookingWorkflow, LookupPhase, Phase, AUTO_ADVANCE_DELAY};
pub use gate::{ConsignmentGate, GateState};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use steps::{validate_step, Step, StepErrors};
pub use submit::{
    assemble_payload, BookingPayload, BookingSubmitter, InvoiceData, PartyData, PaymentData,
    ShipmentData, SubmitError,
};
