use serde::{Deserialize, Serialize};

/// Terminal outcome of a single simulated trial.
///
/// `Success` and `Failure` are produced by first-step-mode stop conditions.
/// `Timeout` marks a trajectory that hit the simulation time limit without
/// reaching any stop condition; such records carry no stop-condition tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeTag {
    Success,
    Failure,
    Timeout,
}

/// One raw trial outcome as emitted by the external simulation engine.
///
/// Produced exactly once per trial and immutable thereafter. `time` is the
/// elapsed simulated time in seconds; `collision_rate` is the estimated
/// bimolecular encounter rate constant (/M/s) of the sampled initial
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub tag: OutcomeTag,
    pub time: f64,
    pub collision_rate: f64,
}

impl SimulationRecord {
    pub fn new(tag: OutcomeTag, time: f64, collision_rate: f64) -> Self {
        Self {
            tag,
            time,
            collision_rate,
        }
    }
}

/// Terminal state descriptor collected alongside each record.
///
/// Opaque to the estimators; carried through the dispatcher so callers can
/// inspect where trajectories ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndState {
    pub seed: u64,
    pub complex_index: usize,
    pub tag: Option<String>,
    pub time: f64,
    pub structure: String,
}

/// Everything one engine invocation returns: the per-trial outcome records and
/// the terminal end states, in trial completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialBatch {
    pub records: Vec<SimulationRecord>,
    pub end_states: Vec<EndState>,
}

impl TrialBatch {
    pub fn new(records: Vec<SimulationRecord>, end_states: Vec<EndState>) -> Self {
        Self {
            records,
            end_states,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
