//! # Core Module
//!
//! This module provides the fundamental data structures and statistical machinery
//! for turning raw per-trial simulation outcomes into reaction rate constants.
//!
//! ## Overview
//!
//! Every trial produces one immutable [`records::SimulationRecord`] carrying an
//! outcome tag, the elapsed simulated time, and the estimated collision rate of the
//! initial configuration. The core module aggregates such records into datasets and
//! derives concentration-dependent and concentration-independent rate constants
//! from them.
//!
//! ## Architecture
//!
//! - **Records** ([`records`]) - Per-trial outcome records, terminal end states, and
//!   the batch type returned by one engine invocation
//! - **First-step estimation** ([`dataset`]) - `RateDataset` with the `k1`/`k_eff`
//!   estimators for first-step-mode data, dataset merging, and resampling
//! - **First-passage estimation** ([`passage`]) - the completion-time variant used
//!   when the success/failure split is not modeled separately
//! - **Bootstrap** ([`bootstrap`]) - resampling-with-replacement confidence
//!   intervals and standard deviations over the effective-rate distribution
//!
//! ## Scientific Foundation
//!
//! The first-step estimator follows the standard decomposition of a bimolecular
//! reaction into a collision step and a unimolecular resolution step: the expected
//! time to a productive reaction combines the mean forward and reverse collision
//! times with the mean unimolecular completion times, weighted by the observed
//! failure-to-success ratio.

pub mod bootstrap;
pub mod dataset;
pub mod passage;
pub mod records;
