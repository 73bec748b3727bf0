//! # Engine Module
//!
//! This module implements the concurrent execution engine of StrandSim: the
//! round-based adaptive trial dispatcher and the lock-guarded aggregation of
//! per-worker partial results.
//!
//! ## Overview
//!
//! A dispatch run executes a total trial budget by spawning a fixed number of
//! isolated workers per round, each driving its own instance of the external
//! simulation engine. Worker outputs flow into shared collections through the
//! merge operations in [`aggregator`]; after the round's full join barrier, a
//! pluggable [`criteria::TerminationCriteria`] decides whether the accumulated
//! data is statistically sufficient or whether another, larger round is needed.
//!
//! ## Architecture
//!
//! - **External contracts** ([`sim`]) - the `SimulationEngine` and
//!   `ConfigFactory` capabilities the dispatcher consumes
//! - **Configuration** ([`config`]) - immutable dispatch parameters with a
//!   validating builder and TOML loading
//! - **Aggregation** ([`aggregator`]) - the four merge policies and the shared
//!   analysis accumulators, one lock per structure
//! - **Adaptive stopping** ([`criteria`]) - pluggable round-termination policies
//! - **Dispatch** ([`dispatcher`]) - the round loop, worker seeding, and the
//!   join barrier
//! - **Progress Monitoring** ([`progress`]) - callback-based round reporting
//! - **Error Handling** ([`error`]) - dispatch-specific error types

pub mod aggregator;
pub mod config;
pub mod criteria;
pub mod dispatcher;
pub mod error;
pub mod progress;
pub mod sim;
