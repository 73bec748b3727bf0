use super::records::{OutcomeTag, SimulationRecord};
use rand::Rng;
use thiserror::Error;

/// Floor value returned by the estimators when the data cannot support a rate
/// estimate (no forward trajectories observed). Keeps downstream `log10` and
/// ratio computations well-defined.
pub const MINIMUM_RATE: f64 = 1e-18;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    #[error(
        "Cannot merge results from different concentrations: {expected} M vs {found} M"
    )]
    ConcentrationMismatch { expected: f64, found: f64 },
}

/// A set of raw first-step-mode trial records at one concentration, together
/// with the derived per-direction statistics the estimators operate on.
///
/// The derived fields are regenerated whenever `records` changes; they are
/// never persisted or patched incrementally. The invariant
/// `n_total() == n_forward() + n_reverse()` holds after every mutation.
#[derive(Debug, Clone)]
pub struct RateDataset {
    concentration: f64,
    records: Vec<SimulationRecord>,
    derived: Derived,
}

#[derive(Debug, Clone, Default)]
struct Derived {
    forward_times: Vec<f64>,
    reverse_times: Vec<f64>,
    forward_collision_rates: Vec<f64>,
    reverse_collision_rates: Vec<f64>,
}

impl Derived {
    fn from_records(records: &[SimulationRecord]) -> Self {
        let mut derived = Self::default();
        for record in records {
            match record.tag {
                OutcomeTag::Success => {
                    derived.forward_times.push(record.time);
                    derived.forward_collision_rates.push(record.collision_rate);
                }
                OutcomeTag::Failure => {
                    derived.reverse_times.push(record.time);
                    derived.reverse_collision_rates.push(record.collision_rate);
                }
                OutcomeTag::Timeout => {}
            }
        }
        derived
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl RateDataset {
    /// Builds a dataset and computes its derived statistics. No validation is
    /// performed; an empty record set is a legal (if degenerate) dataset.
    pub fn from_records(records: Vec<SimulationRecord>, concentration: f64) -> Self {
        let derived = Derived::from_records(&records);
        Self {
            concentration,
            records,
            derived,
        }
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn records(&self) -> &[SimulationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of trials that reached the success stop condition.
    pub fn n_forward(&self) -> usize {
        self.derived.forward_times.len()
    }

    /// Number of trials that reached the failure stop condition.
    pub fn n_reverse(&self) -> usize {
        self.derived.reverse_times.len()
    }

    /// Tagged trials only; timeouts do not contribute to either direction.
    pub fn n_total(&self) -> usize {
        self.n_forward() + self.n_reverse()
    }

    /// Returns the same dataset re-targeted at a different concentration.
    /// Used by callers that bootstrap one record set at several concentrations.
    pub fn with_concentration(mut self, concentration: f64) -> Self {
        self.concentration = concentration;
        self
    }

    /// The concentration-independent rate estimate:
    /// `P(success) * mean(forward collision rates)`.
    ///
    /// Clamped to [`MINIMUM_RATE`] when no forward trajectory was observed
    /// (which covers `n_total() == 0`); the literal formula would otherwise
    /// take the mean of an empty sequence.
    pub fn k1(&self) -> f64 {
        if self.n_forward() == 0 {
            return MINIMUM_RATE;
        }

        let prob = self.n_forward() as f64 / self.n_total() as f64;
        prob * mean(&self.derived.forward_collision_rates)
    }

    /// The concentration-dependent effective rate estimate at `z` (the
    /// override, or the dataset concentration when `None`).
    ///
    /// The expected time to a productive reaction combines the forward
    /// collision time and mean forward completion time with the cost of failed
    /// attempts, weighted by the observed failure-to-success ratio:
    ///
    /// ```text
    /// dTforward = 1/(mean(kcoll_forward) * z) + mean(forward times)
    /// dTfail    = 1/(mean(kcoll_reverse) * z) + mean(reverse times)
    /// k_eff     = 1 / ((dTfail * nReverse/nForward + dTforward) * z)
    /// ```
    ///
    /// Clamped to [`MINIMUM_RATE`] when `n_forward() == 0`. When
    /// `n_reverse() == 0` the failure contribution is taken to be zero and the
    /// reverse means are never evaluated.
    pub fn k_eff(&self, concentration: Option<f64>) -> f64 {
        if self.n_forward() == 0 {
            return MINIMUM_RATE;
        }

        let z = concentration.unwrap_or(self.concentration);

        let dt_coll_forward = 1.0 / (mean(&self.derived.forward_collision_rates) * z);
        let dt_forward = dt_coll_forward + mean(&self.derived.forward_times);

        let dt_correct = if self.n_reverse() == 0 {
            dt_forward
        } else {
            let dt_coll_reverse = 1.0 / (mean(&self.derived.reverse_collision_rates) * z);
            let dt_fail = dt_coll_reverse + mean(&self.derived.reverse_times);
            let ratio = self.n_reverse() as f64 / self.n_forward() as f64;
            dt_fail * ratio + dt_forward
        };

        1.0 / (dt_correct * z)
    }

    /// `log10` of the effective rate. Well-defined because [`Self::k_eff`]
    /// never returns a non-positive value.
    pub fn log10_k_eff(&self) -> f64 {
        self.k_eff(None).log10()
    }

    /// Appends the raw records of `other` and regenerates the derived
    /// statistics. Merging datasets taken at different concentrations is a
    /// modeling error and is reported instead of silently proceeding.
    pub fn merge(&mut self, other: &RateDataset) -> Result<(), DatasetError> {
        if self.concentration != other.concentration {
            return Err(DatasetError::ConcentrationMismatch {
                expected: self.concentration,
                found: other.concentration,
            });
        }

        self.records.extend_from_slice(&other.records);
        self.derived = Derived::from_records(&self.records);
        Ok(())
    }

    /// Draws `len()` records uniformly with replacement and builds a new
    /// dataset at the same concentration. Duplicated records are kept as-is;
    /// the derived statistics are regenerated for the sample.
    pub fn resample(&self, rng: &mut impl Rng) -> RateDataset {
        let n = self.records.len();
        let sampled = (0..n)
            .map(|_| self.records[rng.gen_range(0..n)])
            .collect();
        RateDataset::from_records(sampled, self.concentration)
    }

    /// Count of success-tagged records, timeouts included in the denominator.
    pub fn success_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.tag == OutcomeTag::Success)
            .count()
    }
}
