use super::aggregator::{SharedAnalysisMaps, TrialAnalyzer, merge_append};
use super::config::DispatchConfig;
use super::criteria::{PROBE_CONCENTRATION, TerminationCriteria};
use super::error::DispatchError;
use super::progress::{Progress, ProgressReporter};
use super::sim::{ConfigFactory, SimulationEngine};
use crate::core::dataset::RateDataset;
use crate::core::records::{EndState, SimulationRecord};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Per-worker seed spacing within one round.
const SEED_STRIDE: u64 = 285;

/// Seed used for the diagnostic `describe` entry point.
const DESCRIBE_SEED: u64 = 777;

// Monotonic round counter shared by all dispatchers in the process. Seed
// uniqueness across rapidly launched rounds must not depend on wall-clock
// resolution.
static ROUND_NONCE: AtomicU64 = AtomicU64::new(0);

// The odd multiplier spreads consecutive nonces across the seed space without
// ever mapping two nonces to the same offset.
fn worker_seed(base: u64, worker: usize, nonce: u64) -> u64 {
    base.wrapping_add(worker as u64 * SEED_STRIDE)
        .wrapping_add(nonce.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Merged output of a complete dispatch run.
///
/// Records and end states from different workers interleave in arbitrary
/// order; only the relative order within one worker's contribution is
/// meaningful. Consumers must treat the collections as unordered multisets.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub records: Vec<SimulationRecord>,
    pub end_states: Vec<EndState>,
    pub rounds: usize,
    pub elapsed: Duration,
}

/// Round-based adaptive trial dispatcher.
///
/// Each round transitions through `Dispatching` (spawn exactly `worker_count`
/// workers, each with a private engine instance), `Joining` (full barrier; no
/// partial consumption of in-flight results), and `Evaluating` (consult the
/// termination criteria over the merged records). Without criteria a run is a
/// single round; otherwise every insufficient round doubles the trial budget
/// and the new round's results accumulate onto the existing ones.
///
/// A worker that never returns stalls its round indefinitely; there is no
/// per-worker timeout or cancellation.
pub struct TrialDispatcher {
    config: DispatchConfig,
    criteria: Option<Box<dyn TerminationCriteria>>,
    analyzer: Option<Box<dyn TrialAnalyzer>>,
    analysis: SharedAnalysisMaps,
}

impl TrialDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            criteria: None,
            analyzer: None,
            analysis: SharedAnalysisMaps::new(0),
        }
    }

    /// Enables adaptive stopping. Without criteria the dispatcher runs
    /// exactly one round.
    pub fn with_termination_criteria(mut self, criteria: Box<dyn TerminationCriteria>) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Installs the per-worker auxiliary analysis step and sizes the shared
    /// accumulators it merges into.
    pub fn with_analyzer(mut self, analyzer: Box<dyn TrialAnalyzer>, indexed_slots: usize) -> Self {
        self.analyzer = Some(analyzer);
        self.analysis = SharedAnalysisMaps::new(indexed_slots);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Shared analysis totals. Consistent only while no round is in flight.
    pub fn analysis(&self) -> &SharedAnalysisMaps {
        &self.analysis
    }

    /// Pipes a configuration built with a fixed seed into the engine's
    /// diagnostic entry point. Introspection only.
    pub fn describe<E, CF>(&self, engine: &E, factory: &CF) -> String
    where
        E: SimulationEngine,
        CF: ConfigFactory<E::Config>,
    {
        let config = factory.build(DESCRIBE_SEED, 1);
        engine.describe(&config)
    }

    /// Runs the adaptive round loop until the criteria are satisfied (or one
    /// round, without criteria) and returns the merged results.
    ///
    /// `engine_builder` is invoked once per worker per round, inside the
    /// worker thread, so every engine instance is exclusively owned by the
    /// worker that drives it.
    #[instrument(skip_all, name = "trial_dispatch", fields(workers = self.config.worker_count))]
    pub fn dispatch<E, B, CF>(
        &self,
        total_trials: usize,
        engine_builder: B,
        factory: &CF,
        reporter: &ProgressReporter,
    ) -> Result<RunResult, DispatchError>
    where
        E: SimulationEngine,
        B: Fn() -> E + Send + Sync,
        CF: ConfigFactory<E::Config>,
    {
        let workers = self.config.worker_count;
        if workers == 0 {
            return Err(DispatchError::NoWorkers);
        }

        let started = Instant::now();
        let shared_records: Mutex<Vec<SimulationRecord>> = Mutex::new(Vec::new());
        let shared_end_states: Mutex<Vec<EndState>> = Mutex::new(Vec::new());

        let mut trials = total_trials;
        let mut round = 0;

        loop {
            round += 1;
            let per_worker = trials.div_ceil(workers);
            let nonce = ROUND_NONCE.fetch_add(1, Ordering::Relaxed);

            reporter.report(Progress::RoundStart {
                round,
                total_trials: per_worker * workers,
                workers,
            });
            info!(round, per_worker, "dispatching workers");

            let mut failures: Vec<DispatchError> = thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|worker| {
                        let engine_builder = &engine_builder;
                        let shared_records = &shared_records;
                        let shared_end_states = &shared_end_states;
                        scope.spawn(move || {
                            self.run_worker(
                                worker,
                                nonce,
                                per_worker,
                                engine_builder,
                                factory,
                                shared_records,
                                shared_end_states,
                            )
                        })
                    })
                    .collect();

                debug!(round, "joining workers");
                handles
                    .into_iter()
                    .enumerate()
                    .filter_map(|(worker, handle)| match handle.join() {
                        Ok(Ok(())) => None,
                        Ok(Err(err)) => Some(err),
                        Err(_) => Some(DispatchError::WorkerPanicked { worker }),
                    })
                    .collect()
            });

            // The round has fully joined; a failed worker loses nothing
            // silently but does fail the run.
            if let Some(err) = failures.drain(..).next() {
                return Err(err);
            }

            reporter.report(Progress::RoundFinish {
                round,
                elapsed: started.elapsed(),
            });

            debug!(round, "evaluating termination criteria");
            let Some(criteria) = &self.criteria else {
                break;
            };

            let probe = RateDataset::from_records(
                shared_records
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .clone(),
                PROBE_CONCENTRATION,
            );
            if criteria.terminate(&probe) {
                info!(round, records = probe.len(), "criteria satisfied");
                break;
            }
            if let Some(max_rounds) = self.config.max_rounds
                && round >= max_rounds
            {
                warn!(
                    round,
                    max_rounds, "round limit reached before criteria were satisfied"
                );
                break;
            }

            trials *= 2;
            info!(trials, "criteria not satisfied, doubling trial budget");
        }

        let elapsed = started.elapsed();
        info!(round, ?elapsed, "dispatch complete");
        reporter.report(Progress::Message(format!(
            "Done after {round} round(s), {:.5} seconds.",
            elapsed.as_secs_f64()
        )));

        Ok(RunResult {
            records: shared_records
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            end_states: shared_end_states
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            rounds: round,
            elapsed,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_worker<E, B, CF>(
        &self,
        worker: usize,
        nonce: u64,
        trials: usize,
        engine_builder: &B,
        factory: &CF,
        shared_records: &Mutex<Vec<SimulationRecord>>,
        shared_end_states: &Mutex<Vec<EndState>>,
    ) -> Result<(), DispatchError>
    where
        E: SimulationEngine,
        B: Fn() -> E + Send + Sync,
        CF: ConfigFactory<E::Config>,
    {
        let seed = worker_seed(self.config.base_seed, worker, nonce);
        let config = factory.build(seed, trials);
        let mut engine = engine_builder();

        let batch = engine.run(&config).map_err(|e| DispatchError::RunFailed {
            worker,
            source: Box::new(e),
        })?;
        debug!(worker, seed, records = batch.records.len(), "worker finished");

        if let Some(analyzer) = &self.analyzer {
            let partial = analyzer.analyze(&batch);
            self.analysis.merge_partial(&partial);
        }

        merge_append(shared_records, &batch.records);
        merge_append(shared_end_states, &batch.end_states);
        Ok(())
    }
}
