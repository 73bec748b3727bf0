use crate::core::dataset::RateDataset;

/// Sentinel concentration used when wrapping the merged records for a
/// criteria check. Criteria look at counts, not concentration-dependent
/// rates, so the value only has to keep the estimators well-defined.
pub const PROBE_CONCENTRATION: f64 = 1e-99;

/// Pluggable policy deciding whether the accumulated results are
/// statistically sufficient to stop dispatching further rounds.
///
/// Consulted exactly once per round, after the round's full join barrier,
/// with the merged records wrapped as a probe [`RateDataset`]. Stateless with
/// respect to the dispatcher.
pub trait TerminationCriteria: Send + Sync {
    fn terminate(&self, merged: &RateDataset) -> bool;
}

/// Stops once enough forward (success) trajectories have been collected for
/// the first-step estimators to be trustworthy.
#[derive(Debug, Clone, Copy)]
pub struct ForwardCountCriteria {
    pub min_forward: usize,
}

impl Default for ForwardCountCriteria {
    fn default() -> Self {
        Self { min_forward: 25 }
    }
}

impl TerminationCriteria for ForwardCountCriteria {
    fn terminate(&self, merged: &RateDataset) -> bool {
        tracing::debug!(
            n_forward = merged.n_forward(),
            n_reverse = merged.n_reverse(),
            min_forward = self.min_forward,
            "evaluating termination criteria"
        );
        merged.n_forward() > self.min_forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{OutcomeTag, SimulationRecord};

    fn dataset_with_forward(n: usize) -> RateDataset {
        let records = (0..n)
            .map(|_| SimulationRecord::new(OutcomeTag::Success, 1e-6, 1e6))
            .collect();
        RateDataset::from_records(records, PROBE_CONCENTRATION)
    }

    #[test]
    fn default_criteria_requires_more_than_25_successes() {
        let criteria = ForwardCountCriteria::default();
        assert!(!criteria.terminate(&dataset_with_forward(25)));
        assert!(criteria.terminate(&dataset_with_forward(26)));
    }

    #[test]
    fn failures_alone_never_satisfy_the_criteria() {
        let records = (0..100)
            .map(|_| SimulationRecord::new(OutcomeTag::Failure, 1e-6, 1e6))
            .collect();
        let dataset = RateDataset::from_records(records, PROBE_CONCENTRATION);
        assert!(!ForwardCountCriteria::default().terminate(&dataset));
    }
}
