//! Shipment booking workflow and rating engine.
//!
//! The crate is split into three layers:
//!
//! - [`domain`]: pure computation. Weight math, zone classification and the
//!   rating engine, with the entity types the rest of the crate shares.
//! - [`workflow`]: the ordered booking wizard. Step validation, the
//!   destination-lookup branch, the consignment capacity gate and the final
//!   submission handshake.
//! - [`infra`]: external collaborators. The async API client and the
//!   on-disk rate-table cache.
//!
//! A host drives [`workflow::BookingWorkflow`] with user edits, feeds it the
//! rate table and consignment availability obtained through
//! [`infra::BookingApiClient`], and hands the finished draft to
//! [`workflow::BookingSubmitter`].

pub mod domain;
pub mod infra;
pub mod util;
pub mod workflow;
