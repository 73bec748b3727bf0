use super::dataset::MINIMUM_RATE;
use super::records::{OutcomeTag, SimulationRecord};
use rand::Rng;
use thiserror::Error;

/// A trajectory that hit the time limit must have simulated at least this long.
/// Anything shorter means the upstream engine emitted an inconsistent record.
pub const MIN_TIMEOUT_SECONDS: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PassageError {
    #[error(
        "Data integrity violation: record {index} ({reason}) breaks the engine contract for first-passage data"
    )]
    DataIntegrity { index: usize, reason: String },
}

/// First-passage-time dataset: the effective rate is derived from total
/// completion times rather than the forward/reverse split of first-step mode.
///
/// Construction validates the engine contract: every non-`Success` record is a
/// timeout and must be tagged [`OutcomeTag::Timeout`] with
/// `time >= MIN_TIMEOUT_SECONDS`. A violation is fatal, not recoverable, since
/// it indicates the upstream engine broke its contract; `from_records` refuses
/// to build the dataset.
#[derive(Debug, Clone)]
pub struct FirstPassageDataset {
    concentration: f64,
    times: Vec<f64>,
    timeout_count: usize,
}

impl FirstPassageDataset {
    pub fn from_records(
        records: &[SimulationRecord],
        concentration: f64,
    ) -> Result<Self, PassageError> {
        let mut timeout_count = 0;
        for (index, record) in records.iter().enumerate() {
            match record.tag {
                OutcomeTag::Success => {}
                OutcomeTag::Timeout => {
                    if record.time < MIN_TIMEOUT_SECONDS {
                        return Err(PassageError::DataIntegrity {
                            index,
                            reason: format!(
                                "timeout after {} s, below the {} s simulation limit",
                                record.time, MIN_TIMEOUT_SECONDS
                            ),
                        });
                    }
                    timeout_count += 1;
                }
                OutcomeTag::Failure => {
                    return Err(PassageError::DataIntegrity {
                        index,
                        reason: "failure tag in first-passage data".to_string(),
                    });
                }
            }
        }

        if timeout_count > 0 {
            tracing::warn!(
                timeout_count,
                total = records.len(),
                "association trajectories did not finish"
            );
        }

        Ok(Self {
            concentration,
            times: records.iter().map(|r| r.time).collect(),
            timeout_count,
        })
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn timeout_count(&self) -> usize {
        self.timeout_count
    }

    /// `1 / (mean(times) * z)`, clamped to [`MINIMUM_RATE`] on an empty
    /// dataset so downstream `log10` stays well-defined.
    pub fn k_eff(&self) -> f64 {
        if self.times.is_empty() {
            return MINIMUM_RATE;
        }
        let mean = self.times.iter().sum::<f64>() / self.times.len() as f64;
        1.0 / (mean * self.concentration)
    }

    pub fn log10_k_eff(&self) -> f64 {
        self.k_eff().log10()
    }

    /// Uniform resampling with replacement over the completion times only;
    /// the validated timeout records are not drawn again.
    pub fn resample(&self, rng: &mut impl Rng) -> FirstPassageDataset {
        let n = self.times.len();
        let times = (0..n).map(|_| self.times[rng.gen_range(0..n)]).collect();
        Self {
            concentration: self.concentration,
            times,
            timeout_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn success(time: f64) -> SimulationRecord {
        SimulationRecord::new(OutcomeTag::Success, time, 0.0)
    }

    #[test]
    fn k_eff_is_inverse_mean_time_over_concentration() {
        let records = vec![success(1.0), success(3.0)];
        let dataset = FirstPassageDataset::from_records(&records, 1e-6).expect("valid records");
        // mean = 2.0, k_eff = 1/(2.0 * 1e-6)
        let expected = 1.0 / (2.0 * 1e-6);
        assert!((dataset.k_eff() - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn timeouts_are_accepted_when_contract_holds() {
        let records = vec![
            success(1.0),
            SimulationRecord::new(OutcomeTag::Timeout, 10.0, 0.0),
        ];
        let dataset = FirstPassageDataset::from_records(&records, 1e-6).expect("valid records");
        assert_eq!(dataset.timeout_count(), 1);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn short_timeout_is_a_fatal_integrity_error() {
        let records = vec![SimulationRecord::new(OutcomeTag::Timeout, 0.5, 0.0)];
        let err = FirstPassageDataset::from_records(&records, 1e-6)
            .expect_err("timeout below the simulation limit");
        assert!(matches!(err, PassageError::DataIntegrity { index: 0, .. }));
    }

    #[test]
    fn failure_tag_is_a_fatal_integrity_error() {
        let records = vec![
            success(1.0),
            SimulationRecord::new(OutcomeTag::Failure, 12.0, 0.0),
        ];
        let err = FirstPassageDataset::from_records(&records, 1e-6)
            .expect_err("failure tags cannot appear in first-passage data");
        assert!(matches!(err, PassageError::DataIntegrity { index: 1, .. }));
    }

    #[test]
    fn empty_dataset_clamps_to_minimum_rate() {
        let dataset = FirstPassageDataset::from_records(&[], 1e-6).expect("empty is legal");
        assert_eq!(dataset.k_eff(), MINIMUM_RATE);
    }

    #[test]
    fn resample_preserves_length() {
        let records = vec![success(1.0), success(2.0), success(4.0)];
        let dataset = FirstPassageDataset::from_records(&records, 1e-6).expect("valid records");
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(dataset.resample(&mut rng).len(), dataset.len());
    }
}
