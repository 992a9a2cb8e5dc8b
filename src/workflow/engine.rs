//! The booking wizard as an explicit finite-state machine.
//!
//! One workflow instance owns one [`BookingDraft`]. Transitions are gated on
//! per-step validation; quote recomputation is triggered here, never by the
//! rating engine itself.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::domain::{
    rating, weight, BookingConfirmation, BookingDraft, ConsignmentAvailability, DestinationRecord,
    DimensionSet, DimensionUnit, InsuranceChoice, Party, PaymentType, PostalArea, Quote,
    RateTable, RatingInput, ServiceTier, ShipmentNature, TransportMode, UploadedFile,
};

use crate::util::persistence::PersistedDraft;

use super::gate::ConsignmentGate;
use super::preview::PreviewRegistry;
use super::steps::{validate_step, Step, StepErrors};

/// Delay before the empty-lookup popup auto-advances to manual entry.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(4);

/// Where the wizard currently is.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Collecting(Step),
    /// Intermediate branch that runs after Origin validates.
    DestinationLookup(LookupPhase),
    Submitted(BookingConfirmation),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LookupPhase {
    /// Phone lookup outstanding; dependent controls stay pending.
    Pending,
    /// Prior receivers found; picking one skips the Destination step.
    Choices(Vec<DestinationRecord>),
    /// No prior receivers; auto-advance once the deadline passes.
    Countdown { deadline: Instant },
}

/// Outcome of a `next()` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
    Moved(Step),
    /// Validation failed; the error map is populated.
    Blocked,
    /// Origin validated; the previous-destination lookup is now pending.
    LookupStarted,
    /// The lookup branch is still open; resolve it first.
    LookupPending,
    /// Already at Preview; submission goes through the submitter.
    AtPreview,
    /// The capacity source granted no assignment; workflow is read-only.
    Disabled,
    /// Already submitted.
    Terminal,
}

pub struct BookingWorkflow {
    draft: BookingDraft,
    default_origin: Party,
    phase: Phase,
    errors: StepErrors,
    rate_table: Option<RateTable>,
    gate: ConsignmentGate,
    previews: PreviewRegistry,
    image_previews: Vec<Uuid>,
    /// Furthest step the session has reached; quoting starts at
    /// PackageDetails.
    max_step_reached: Step,
    submit_in_flight: bool,
}

impl BookingWorkflow {
    /// Start a fresh session, pre-filled from the caller's default origin.
    pub fn new(default_origin: Party) -> Self {
        Self {
            draft: BookingDraft::with_default_origin(default_origin.clone()),
            default_origin,
            phase: Phase::Collecting(Step::Origin),
            errors: StepErrors::new(),
            rate_table: None,
            gate: ConsignmentGate::default(),
            previews: PreviewRegistry::default(),
            image_previews: Vec::new(),
            max_step_reached: Step::Origin,
            submit_in_flight: false,
        }
    }

    /// Rebuild a session from a persisted draft. The quote arrives stripped
    /// and comes back on the next [`set_rate_table`](Self::set_rate_table).
    pub fn resume(default_origin: Party, persisted: PersistedDraft) -> Self {
        let step = Step::from_index(persisted.step_index).unwrap_or(Step::Origin);
        let mut workflow = Self::new(default_origin);
        workflow.draft = persisted.draft;
        workflow.phase = Phase::Collecting(step);
        workflow.max_step_reached = step;
        workflow
    }

    /// Snapshot for persistence while the session is still collecting;
    /// submitted or branching sessions are not worth restoring.
    pub fn snapshot(&self) -> Option<PersistedDraft> {
        match &self.phase {
            Phase::Collecting(step) => Some(PersistedDraft {
                draft: self.draft.clone(),
                step_index: step.index(),
            }),
            _ => None,
        }
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current collection step, if the wizard is collecting.
    pub fn step(&self) -> Option<Step> {
        match &self.phase {
            Phase::Collecting(step) => Some(*step),
            _ => None,
        }
    }

    pub fn errors(&self) -> &StepErrors {
        &self.errors
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.draft.quote.as_ref()
    }

    pub fn gate(&self) -> &ConsignmentGate {
        &self.gate
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.workflow_enabled()
    }

    pub fn submit_in_flight(&self) -> bool {
        self.submit_in_flight
    }

    pub fn set_availability(&mut self, availability: ConsignmentAvailability) {
        self.gate.update(availability);
    }

    pub fn set_rate_table(&mut self, table: RateTable) {
        self.rate_table = Some(table);
        self.refresh_quote();
    }

    pub fn rate_table(&self) -> Option<&RateTable> {
        self.rate_table.as_ref()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn next(&mut self) -> Advance {
        if !self.is_enabled() {
            return Advance::Disabled;
        }

        let step = match &self.phase {
            Phase::Collecting(step) => *step,
            Phase::DestinationLookup(_) => return Advance::LookupPending,
            Phase::Submitted(_) => return Advance::Terminal,
        };

        self.errors = validate_step(&self.draft, step);
        if !self.errors.is_empty() {
            tracing::debug!(step = step.index(), errors = self.errors.len(), "step blocked");
            return Advance::Blocked;
        }

        match step {
            Step::Origin => {
                self.phase = Phase::DestinationLookup(LookupPhase::Pending);
                Advance::LookupStarted
            }
            Step::Preview => Advance::AtPreview,
            _ => {
                let target = step.next().unwrap_or(Step::Preview);
                self.enter(target);
                Advance::Moved(target)
            }
        }
    }

    /// Always allowed; floors at Origin. Backing out of the lookup popup
    /// returns to the Origin step.
    pub fn previous(&mut self) -> Option<Step> {
        match &self.phase {
            Phase::Collecting(step) => {
                let target = step.previous().unwrap_or(Step::Origin);
                self.phase = Phase::Collecting(target);
                self.errors.clear();
                Some(target)
            }
            Phase::DestinationLookup(_) => {
                self.phase = Phase::Collecting(Step::Origin);
                self.errors.clear();
                Some(Step::Origin)
            }
            Phase::Submitted(_) => None,
        }
    }

    fn enter(&mut self, step: Step) {
        self.phase = Phase::Collecting(step);
        self.errors.clear();
        if step > self.max_step_reached {
            self.max_step_reached = step;
            self.refresh_quote();
        }
    }

    // ------------------------------------------------------------------
    // Previous-destination lookup branch
    // ------------------------------------------------------------------

    /// Feed the result of the phone lookup back into the wizard.
    pub fn destination_lookup_completed(&mut self, records: Vec<DestinationRecord>) {
        if !matches!(self.phase, Phase::DestinationLookup(LookupPhase::Pending)) {
            return;
        }
        if records.is_empty() {
            self.phase = Phase::DestinationLookup(LookupPhase::Countdown {
                deadline: Instant::now() + AUTO_ADVANCE_DELAY,
            });
        } else {
            self.phase = Phase::DestinationLookup(LookupPhase::Choices(records));
        }
    }

    /// Lookup failures are transient: drop into manual destination entry.
    pub fn destination_lookup_failed(&mut self) {
        if matches!(self.phase, Phase::DestinationLookup(_)) {
            tracing::warn!("previous-destination lookup failed, continuing manually");
            self.enter(Step::Destination);
        }
    }

    /// Pick a prior receiver: the destination auto-fills and the wizard
    /// jumps straight to ShipmentNature.
    pub fn choose_previous_destination(&mut self, index: usize) -> bool {
        let Phase::DestinationLookup(LookupPhase::Choices(records)) = &self.phase else {
            return false;
        };
        let Some(record) = records.get(index).cloned() else {
            return false;
        };

        self.draft.destination = record.into_party();
        self.enter(Step::ShipmentNature);
        self.refresh_quote();
        true
    }

    /// Manual dismissal of the lookup popup: cancel any countdown and go to
    /// manual destination entry right away.
    pub fn dismiss_lookup(&mut self) {
        if matches!(self.phase, Phase::DestinationLookup(_)) {
            self.enter(Step::Destination);
        }
    }

    /// Deadline of a running auto-advance countdown, if any.
    pub fn countdown_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::DestinationLookup(LookupPhase::Countdown { deadline }) => Some(*deadline),
            _ => None,
        }
    }

    /// Drive the countdown; returns true when it fired and the wizard moved
    /// on to the Destination step.
    pub fn poll_countdown(&mut self, now: Instant) -> bool {
        match &self.phase {
            Phase::DestinationLookup(LookupPhase::Countdown { deadline }) if now >= *deadline => {
                self.enter(Step::Destination);
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Draft mutation
    // ------------------------------------------------------------------
    // Mutators are no-ops while the gate disables the workflow. Any user
    // interaction cancels a running auto-advance countdown.

    fn interact(&mut self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if matches!(
            self.phase,
            Phase::DestinationLookup(LookupPhase::Countdown { .. })
        ) {
            self.enter(Step::Destination);
        }
        true
    }

    pub fn edit_origin(&mut self, edit: impl FnOnce(&mut Party)) {
        if self.interact() {
            edit(&mut self.draft.origin);
        }
    }

    pub fn edit_destination(&mut self, edit: impl FnOnce(&mut Party)) {
        if !self.interact() {
            return;
        }
        let postal_before = self.draft.destination.postal_code.clone();
        edit(&mut self.draft.destination);
        if self.draft.destination.postal_code != postal_before {
            // Resolution and area choice belong to the old code.
            self.draft.destination.resolved = None;
            self.draft.destination.area.clear();
        }
        self.refresh_quote();
    }

    /// Switch the origin address: `None` restores the caller's default,
    /// `Some` substitutes another address. Flips the reverse-pricing flag.
    pub fn select_origin_address(&mut self, custom: Option<Party>) {
        if !self.interact() {
            return;
        }
        match custom {
            None => {
                self.draft.origin = self.default_origin.clone();
                self.draft.origin_is_default = true;
            }
            Some(party) => {
                self.draft.origin = party;
                self.draft.origin_is_default = false;
            }
        }
        self.refresh_quote();
    }

    pub fn set_destination_postal(&mut self, code: &str) {
        if !self.interact() {
            return;
        }
        self.draft.destination.postal_code = code.trim().to_string();
        // Resolution and area choice belong to the old code.
        self.draft.destination.resolved = None;
        self.draft.destination.area.clear();
        self.refresh_quote();
    }

    pub fn apply_origin_resolution(&mut self, area: PostalArea) {
        if self.interact() {
            self.draft.origin.resolved = Some(area);
        }
    }

    pub fn apply_destination_resolution(&mut self, area: PostalArea) {
        if self.interact() {
            self.draft.destination.resolved = Some(area);
        }
    }

    pub fn set_nature(&mut self, nature: ShipmentNature) {
        if !self.interact() {
            return;
        }
        self.draft.shipment.nature = Some(nature);
        self.refresh_quote();
    }

    pub fn set_insurance(&mut self, choice: InsuranceChoice) {
        if self.interact() {
            self.draft.shipment.insurance = Some(choice);
        }
    }

    pub fn edit_shipment(
        &mut self,
        edit: impl FnOnce(&mut crate::domain::ShipmentDetails),
    ) {
        if self.interact() {
            edit(&mut self.draft.shipment);
            self.refresh_quote();
        }
    }

    pub fn set_actual_weight(&mut self, raw: &str) {
        if !self.interact() {
            return;
        }
        self.draft.shipment.actual_weight = raw.trim().to_string();
        self.refresh_quote();
    }

    pub fn add_dimension_set(&mut self, unit: DimensionUnit) -> Option<String> {
        if !self.interact() {
            return None;
        }
        let set = DimensionSet::new(unit);
        let id = set.id.clone();
        self.draft.shipment.dimensions.push(set);
        self.refresh_quote();
        Some(id)
    }

    pub fn update_dimension_set(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut DimensionSet),
    ) -> bool {
        if !self.interact() {
            return false;
        }
        let Some(set) = self
            .draft
            .shipment
            .dimensions
            .iter_mut()
            .find(|set| set.id == id)
        else {
            return false;
        };
        edit(set);
        self.refresh_quote();
        true
    }

    pub fn remove_dimension_set(&mut self, id: &str) -> bool {
        if !self.interact() {
            return false;
        }
        let before = self.draft.shipment.dimensions.len();
        self.draft.shipment.dimensions.retain(|set| set.id != id);
        let removed = self.draft.shipment.dimensions.len() != before;
        if removed {
            self.refresh_quote();
        }
        removed
    }

    /// Attach an uploaded package image; acquires a preview handle scoped to
    /// the image's lifetime in the draft.
    pub fn add_package_image(&mut self, file_name: &str, file: UploadedFile) -> Option<Uuid> {
        if !self.interact() {
            return None;
        }
        let handle = self.previews.acquire(file_name);
        self.image_previews.push(handle);
        self.draft.shipment.package_images.push(file);
        Some(handle)
    }

    pub fn remove_package_image(&mut self, index: usize) -> bool {
        if !self.interact() || index >= self.draft.shipment.package_images.len() {
            return false;
        }
        self.draft.shipment.package_images.remove(index);
        let handle = self.image_previews.remove(index);
        self.previews.release(handle);
        true
    }

    pub fn preview_count(&self) -> usize {
        self.previews.len()
    }

    pub fn set_service_tier(&mut self, tier: ServiceTier) {
        if !self.interact() {
            return;
        }
        self.draft.service.tier = Some(tier);
        // DOX priority prices by slab alone; NON-DOX needs a mode on every
        // tier, so the selection survives the switch.
        if tier == ServiceTier::Priority && self.draft.shipment.nature != Some(ShipmentNature::NonDox)
        {
            self.draft.service.mode = None;
        }
        self.refresh_quote();
    }

    pub fn set_transport_mode(&mut self, mode: TransportMode) {
        if !self.interact() {
            return;
        }
        self.draft.service.mode = Some(mode);
        self.refresh_quote();
    }

    pub fn set_payment(&mut self, payment: PaymentType) {
        if self.interact() {
            self.draft.service.payment = Some(payment);
        }
    }

    // ------------------------------------------------------------------
    // Derived weights and quote
    // ------------------------------------------------------------------

    pub fn volumetric_weight(&self) -> f64 {
        weight::volumetric_weight(&self.draft.shipment.dimensions)
    }

    pub fn chargeable_weight(&self) -> f64 {
        weight::chargeable_weight(&self.draft.shipment.actual_weight, self.volumetric_weight())
    }

    /// Recompute the quote when the wizard has reached PackageDetails and a
    /// rate table is loaded; otherwise the quote stays absent.
    fn refresh_quote(&mut self) {
        let Some(table) = &self.rate_table else {
            self.draft.quote = None;
            return;
        };
        if self.max_step_reached < Step::PackageDetails {
            self.draft.quote = None;
            return;
        }

        let input = RatingInput {
            nature: self.draft.shipment.nature,
            tier: self.draft.service.tier,
            mode: self.draft.service.mode,
            destination_postal: &self.draft.destination.postal_code,
            chargeable_weight: weight::chargeable_weight(
                &self.draft.shipment.actual_weight,
                weight::volumetric_weight(&self.draft.shipment.dimensions),
            ),
            origin_is_default: self.draft.origin_is_default,
        };
        self.draft.quote = rating::compute(table, &input);
    }

    // ------------------------------------------------------------------
    // Submission handshake (driven by the submitter)
    // ------------------------------------------------------------------

    pub(crate) fn mark_submit_started(&mut self) {
        self.submit_in_flight = true;
    }

    pub(crate) fn mark_submit_succeeded(&mut self, confirmation: BookingConfirmation) {
        self.submit_in_flight = false;
        self.previews.release_all();
        self.image_previews.clear();
        self.phase = Phase::Submitted(confirmation);
    }

    /// The draft is retained unchanged for correction and resubmission.
    pub(crate) fn mark_submit_failed(&mut self) {
        self.submit_in_flight = false;
    }

    /// Discard the finished (or abandoned) session and start over with the
    /// same default origin.
    pub fn reset(&mut self) {
        self.draft = BookingDraft::with_default_origin(self.default_origin.clone());
        self.phase = Phase::Collecting(Step::Origin);
        self.errors.clear();
        self.previews.release_all();
        self.image_previews.clear();
        self.max_step_reached = Step::Origin;
        self.submit_in_flight = false;
    }
}
