//! # Workflows Module
//!
//! High-level entry points tying the dispatcher and the estimators together.
//!
//! ## Overview
//!
//! A workflow owns the full measurement pipeline: dispatch the trial budget
//! across workers, wrap the merged outcomes in a [`crate::core::dataset::RateDataset`],
//! derive the rate constants, and bootstrap their uncertainty. Callers supply
//! only the external collaborators (engine builder and configuration factory)
//! and a [`MeasurementConfig`].
//!
//! - **Rate measurement** ([`estimate`]) - end-to-end first-step rate
//!   estimation with bootstrapped confidence intervals.

pub mod estimate;

pub use estimate::{MeasurementConfig, RateMeasurement, WorkflowError, measure};
