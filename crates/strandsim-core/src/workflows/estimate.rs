use crate::core::bootstrap::{self, DEFAULT_SAMPLE_COUNT};
use crate::core::dataset::RateDataset;
use crate::core::records::EndState;
use crate::engine::config::DispatchConfig;
use crate::engine::criteria::TerminationCriteria;
use crate::engine::dispatcher::TrialDispatcher;
use crate::engine::error::DispatchError;
use crate::engine::progress::ProgressReporter;
use crate::engine::sim::{ConfigFactory, SimulationEngine};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Trial dispatch failed: {source}")]
    Dispatch {
        #[from]
        source: DispatchError,
    },

    #[error("Bootstrap analysis failed: {source}")]
    Bootstrap {
        #[from]
        source: bootstrap::BootstrapError,
    },
}

/// Parameters of one complete rate measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementConfig {
    /// Trial budget of the first round.
    pub total_trials: usize,
    /// Concentration the effective rate is reported at, in M.
    pub concentration: f64,
    /// Number of bootstrap resamples for the confidence interval.
    pub bootstrap_samples: usize,
    pub dispatch: DispatchConfig,
}

impl MeasurementConfig {
    pub fn new(total_trials: usize, concentration: f64, dispatch: DispatchConfig) -> Self {
        Self {
            total_trials,
            concentration,
            bootstrap_samples: DEFAULT_SAMPLE_COUNT,
            dispatch,
        }
    }

    pub fn bootstrap_samples(mut self, samples: usize) -> Self {
        self.bootstrap_samples = samples;
        self
    }
}

/// A completed measurement: the merged dataset, the point estimates, and the
/// bootstrapped uncertainty of the effective rate.
#[derive(Debug, Clone)]
pub struct RateMeasurement {
    pub dataset: RateDataset,
    pub k1: f64,
    pub k_eff: f64,
    pub log10_k_eff: f64,
    /// Central 95% bootstrap confidence interval on `k_eff`.
    pub interval: (f64, f64),
    pub std_dev: f64,
    pub log_std_dev: f64,
    pub end_states: Vec<EndState>,
    pub rounds: usize,
    pub elapsed: Duration,
}

/// Runs the complete measurement: dispatch the trials (adaptively, when
/// `criteria` is given), estimate `k1` and `k_eff` from the merged records,
/// and bootstrap the confidence interval of the effective rate.
#[instrument(skip_all, name = "rate_measurement_workflow")]
pub fn measure<E, B, CF>(
    engine_builder: B,
    factory: &CF,
    criteria: Option<Box<dyn TerminationCriteria>>,
    config: &MeasurementConfig,
    reporter: &ProgressReporter,
) -> Result<RateMeasurement, WorkflowError>
where
    E: SimulationEngine,
    B: Fn() -> E + Send + Sync,
    CF: ConfigFactory<E::Config>,
{
    let mut dispatcher = TrialDispatcher::new(config.dispatch.clone());
    if let Some(criteria) = criteria {
        dispatcher = dispatcher.with_termination_criteria(criteria);
    }

    info!(
        total_trials = config.total_trials,
        concentration = config.concentration,
        "starting rate measurement"
    );
    let run = dispatcher.dispatch(config.total_trials, engine_builder, factory, reporter)?;

    let dataset = RateDataset::from_records(run.records, config.concentration);
    let k1 = dataset.k1();
    let k_eff = dataset.k_eff(None);

    let distribution = bootstrap::run(&dataset, config.bootstrap_samples)?;
    let interval = distribution.ninety_five_percent_interval()?;

    info!(
        n_forward = dataset.n_forward(),
        n_reverse = dataset.n_reverse(),
        k1,
        k_eff,
        ci_low = interval.0,
        ci_high = interval.1,
        "measurement complete"
    );

    Ok(RateMeasurement {
        k1,
        k_eff,
        log10_k_eff: dataset.log10_k_eff(),
        interval,
        std_dev: distribution.std_dev(),
        log_std_dev: distribution.log_std_dev(),
        dataset,
        end_states: run.end_states,
        rounds: run.rounds,
        elapsed: run.elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{OutcomeTag, SimulationRecord, TrialBatch};
    use crate::engine::criteria::ForwardCountCriteria;
    use thiserror::Error;

    #[derive(Debug, Clone, Copy)]
    struct StubConfig {
        trials: usize,
    }

    #[derive(Debug, Error)]
    #[error("unreachable")]
    struct StubError;

    struct StubEngine;

    impl SimulationEngine for StubEngine {
        type Config = StubConfig;
        type Error = StubError;

        fn run(&mut self, config: &StubConfig) -> Result<TrialBatch, StubError> {
            let mut batch = TrialBatch::default();
            for i in 0..config.trials {
                let tag = if i % 10 < 6 {
                    OutcomeTag::Success
                } else {
                    OutcomeTag::Failure
                };
                let time = if tag == OutcomeTag::Success { 1e-6 } else { 2e-6 };
                batch.records.push(SimulationRecord::new(tag, time, 1e6));
            }
            Ok(batch)
        }

        fn describe(&self, _config: &StubConfig) -> String {
            "stub".to_string()
        }
    }

    fn measurement_config() -> MeasurementConfig {
        let dispatch = DispatchConfig::builder()
            .worker_count(4)
            .build()
            .expect("valid config");
        MeasurementConfig::new(100, 1e-6, dispatch).bootstrap_samples(200)
    }

    #[test]
    fn measurement_reports_golden_rates_and_a_valid_interval() {
        let factory = |_seed: u64, trials: usize| StubConfig { trials };
        let measurement = measure(
            || StubEngine,
            &factory,
            None,
            &measurement_config(),
            &ProgressReporter::new(),
        )
        .expect("measurement succeeds");

        assert_eq!(measurement.dataset.len(), 100);
        assert_eq!(measurement.dataset.n_forward(), 60);
        assert_eq!(measurement.dataset.n_reverse(), 40);
        assert_eq!(measurement.rounds, 1);

        assert!((measurement.k1 - 6e5).abs() / 6e5 < 1e-12);
        assert!(measurement.k_eff > 0.0);
        assert!((measurement.log10_k_eff - measurement.k_eff.log10()).abs() < 1e-12);

        let (low, high) = measurement.interval;
        assert!(low <= high);
        assert!(measurement.std_dev >= 0.0);
        assert!(measurement.log_std_dev >= 0.0);
    }

    #[test]
    fn adaptive_measurement_runs_extra_rounds() {
        let factory = |_seed: u64, trials: usize| StubConfig { trials };
        let measurement = measure(
            || StubEngine,
            &factory,
            Some(Box::new(ForwardCountCriteria { min_forward: 100 })),
            &measurement_config(),
            &ProgressReporter::new(),
        )
        .expect("measurement succeeds");

        assert!(measurement.rounds > 1);
        assert!(measurement.dataset.n_forward() > 100);
    }
}
