use crate::core::records::TrialBatch;

/// The external trial simulation engine, treated as an opaque black box that
/// consumes one ready-to-run configuration and produces a batch of outcome
/// records and end states.
///
/// Engine instances hold internal mutable state that is not safe to share
/// across concurrent executions. The dispatcher therefore never shares one:
/// each worker thread builds its own instance and owns it for the duration of
/// the round, which is why implementations are not required to be `Sync` (or
/// even `Send`).
pub trait SimulationEngine {
    /// One ready-to-run trial configuration, bundling trial count, simulation
    /// mode, stop conditions, and engine-specific tuning.
    type Config: Send + Sync;

    /// Engine-side failure type, surfaced by the dispatcher as a run failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the configured batch of trials to completion.
    fn run(&mut self, config: &Self::Config) -> Result<TrialBatch, Self::Error>;

    /// Diagnostic description of a configuration. Introspection only, never
    /// part of the hot path.
    fn describe(&self, config: &Self::Config) -> String;
}

/// Builds one simulation configuration per seeded worker.
///
/// `seed` is unique per worker per round; `trials` is the per-worker trial
/// count for the current round and must be bound into the configuration by
/// the factory. Upstream experiment parameters are captured by the factory at
/// construction time (typically as a closure), so the dispatcher sees a
/// fixed, checked arity.
pub trait ConfigFactory<C>: Send + Sync {
    fn build(&self, seed: u64, trials: usize) -> C;
}

impl<C, F> ConfigFactory<C> for F
where
    F: Fn(u64, usize) -> C + Send + Sync,
{
    fn build(&self, seed: u64, trials: usize) -> C {
        self(seed, trials)
    }
}
