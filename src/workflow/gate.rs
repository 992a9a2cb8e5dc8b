//! Consignment capacity gate: whether the caller may book at all, and
//! whether a finished draft may actually be submitted.

use crate::domain::ConsignmentAvailability;

#[derive(Clone, Debug, Default)]
pub struct ConsignmentGate {
    availability: Option<ConsignmentAvailability>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateState {
    /// Availability not fetched yet; the workflow stays usable but cannot
    /// submit.
    Unknown,
    /// No consignment assignment at all; the whole workflow is read-only.
    Disabled,
    /// Assigned but nothing left; steps work, submission is blocked.
    Exhausted,
    Ready { remaining: u32 },
}

impl ConsignmentGate {
    pub fn new(availability: ConsignmentAvailability) -> Self {
        Self { availability: Some(availability) }
    }

    pub fn update(&mut self, availability: ConsignmentAvailability) {
        self.availability = Some(availability);
    }

    pub fn state(&self) -> GateState {
        match &self.availability {
            None => GateState::Unknown,
            Some(avail) if !avail.has_assignment => GateState::Disabled,
            Some(avail) if avail.available_count == 0 => GateState::Exhausted,
            Some(avail) => GateState::Ready { remaining: avail.available_count },
        }
    }

    /// False only when the capacity source says the caller has no
    /// assignment; unknown availability keeps data entry open.
    pub fn workflow_enabled(&self) -> bool {
        self.state() != GateState::Disabled
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state(), GateState::Ready { .. })
    }

    /// Notice shown with the capacity-exhausted outcome.
    pub fn exhausted_message(&self) -> String {
        self.availability
            .as_ref()
            .and_then(|avail| avail.message.clone())
            .unwrap_or_else(|| "no consignment numbers remaining".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_until_updated() {
        let gate = ConsignmentGate::default();
        assert_eq!(gate.state(), GateState::Unknown);
        assert!(gate.workflow_enabled());
        assert!(!gate.can_submit());
    }

    #[test]
    fn no_assignment_disables_the_workflow() {
        let gate = ConsignmentGate::new(ConsignmentAvailability {
            has_assignment: false,
            available_count: 0,
            message: None,
        });
        assert_eq!(gate.state(), GateState::Disabled);
        assert!(!gate.workflow_enabled());
    }

    #[test]
    fn zero_count_blocks_submission_only() {
        let gate = ConsignmentGate::new(ConsignmentAvailability {
            has_assignment: true,
            available_count: 0,
            message: Some("series exhausted".to_string()),
        });
        assert_eq!(gate.state(), GateState::Exhausted);
        assert!(gate.workflow_enabled());
        assert!(!gate.can_submit());
        assert_eq!(gate.exhausted_message(), "series exhausted");
    }

    #[test]
    fn remaining_capacity_permits_submission() {
        let gate = ConsignmentGate::new(ConsignmentAvailability {
            has_assignment: true,
            available_count: 7,
            message: None,
        });
        assert_eq!(gate.state(), GateState::Ready { remaining: 7 });
        assert!(gate.can_submit());
    }
}
