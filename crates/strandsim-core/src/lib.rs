//! # StrandSim Core Library
//!
//! A library for running large numbers of independent stochastic kinetics trials
//! concurrently and converting the raw trajectory outcomes into physical
//! rate-constant estimates with bootstrapped confidence intervals.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`SimulationRecord`,
//!   [`core::dataset::RateDataset`]), the pure rate-constant estimators (`k1`, `k_eff`),
//!   and the bootstrap resampling engine.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates concurrent
//!   execution. It includes the round-based [`engine::dispatcher::TrialDispatcher`],
//!   the lock-per-structure [`engine::aggregator`] used to merge per-worker partial
//!   results, and pluggable termination criteria for adaptive stopping.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute a complete rate measurement:
//!   dispatch trials, merge outcomes, estimate rates, bootstrap the uncertainty.
//!
//! The trial simulation itself is an external collaborator: callers supply an
//! implementation of [`engine::sim::SimulationEngine`] together with a
//! [`engine::sim::ConfigFactory`] that builds one ready-to-run configuration per
//! seeded worker.

pub mod core;
pub mod engine;
pub mod workflows;
