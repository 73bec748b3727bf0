use super::dataset::RateDataset;
use super::passage::FirstPassageDataset;
use rand::Rng;
use rayon::prelude::*;
use thiserror::Error;

/// Number of resamples drawn when the caller does not specify one.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Default percentile bounds: the central 95% interval.
pub const DEFAULT_LOW_QUANTILE: f64 = 0.025;
pub const DEFAULT_HIGH_QUANTILE: f64 = 0.975;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BootstrapError {
    #[error("Cannot bootstrap a dataset with zero records")]
    EmptyDataset,
    #[error(
        "Quantile {quantile} addresses no valid sample index for {samples} bootstrap samples"
    )]
    QuantileOutOfRange { quantile: f64, samples: usize },
}

/// The seam between the bootstrap engine and the two dataset kinds: anything
/// that can be resampled with replacement and reduced to one effective rate.
pub trait EffectiveRate {
    fn resampled<R: Rng>(&self, rng: &mut R) -> Self;
    fn effective_rate(&self) -> f64;
    fn is_empty(&self) -> bool;
}

impl EffectiveRate for RateDataset {
    fn resampled<R: Rng>(&self, rng: &mut R) -> Self {
        self.resample(rng)
    }

    fn effective_rate(&self) -> f64 {
        self.k_eff(None)
    }

    fn is_empty(&self) -> bool {
        RateDataset::is_empty(self)
    }
}

impl EffectiveRate for FirstPassageDataset {
    fn resampled<R: Rng>(&self, rng: &mut R) -> Self {
        self.resample(rng)
    }

    fn effective_rate(&self) -> f64 {
        self.k_eff()
    }

    fn is_empty(&self) -> bool {
        FirstPassageDataset::is_empty(self)
    }
}

/// The empirical distribution of effective rates over the bootstrap
/// resamples. Built once per invocation and immutable afterwards.
///
/// `sorted_log_rates` holds the base-10 logarithms of the sorted rate
/// sequence in the same order; the logs are not sorted independently.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapResult {
    sorted_rates: Vec<f64>,
    sorted_log_rates: Vec<f64>,
}

impl BootstrapResult {
    pub fn sample_count(&self) -> usize {
        self.sorted_rates.len()
    }

    pub fn sorted_rates(&self) -> &[f64] {
        &self.sorted_rates
    }

    pub fn sorted_log_rates(&self) -> &[f64] {
        &self.sorted_log_rates
    }

    /// Percentile confidence bounds `(sorted[floor(low*N)], sorted[floor(high*N)])`.
    ///
    /// The caller is responsible for drawing enough samples that the interval
    /// is meaningful; with the default quantiles that means `N >= 40`.
    pub fn percentile_interval(&self, low: f64, high: f64) -> Result<(f64, f64), BootstrapError> {
        Ok((self.rate_at_quantile(low)?, self.rate_at_quantile(high)?))
    }

    /// The central 95% confidence interval.
    pub fn ninety_five_percent_interval(&self) -> Result<(f64, f64), BootstrapError> {
        self.percentile_interval(DEFAULT_LOW_QUANTILE, DEFAULT_HIGH_QUANTILE)
    }

    /// Population standard deviation of the raw effective-rate sample.
    pub fn std_dev(&self) -> f64 {
        population_std(&self.sorted_rates)
    }

    /// Population standard deviation of the stored log10 rates.
    pub fn log_std_dev(&self) -> f64 {
        population_std(&self.sorted_log_rates)
    }

    fn rate_at_quantile(&self, quantile: f64) -> Result<f64, BootstrapError> {
        let n = self.sorted_rates.len();
        let index = (quantile * n as f64).floor() as isize;
        if quantile < 0.0 || index < 0 || index as usize >= n {
            return Err(BootstrapError::QuantileOutOfRange {
                quantile,
                samples: n,
            });
        }
        Ok(self.sorted_rates[index as usize])
    }
}

/// Draws `sample_count` independent resamples of `dataset`, computes the
/// effective rate of each, and collects the sorted empirical distribution.
///
/// The resamples are independent, so they are computed in parallel with one
/// RNG per rayon worker.
pub fn run<D>(dataset: &D, sample_count: usize) -> Result<BootstrapResult, BootstrapError>
where
    D: EffectiveRate + Sync,
{
    if dataset.is_empty() {
        return Err(BootstrapError::EmptyDataset);
    }

    let mut sorted_rates: Vec<f64> = (0..sample_count)
        .into_par_iter()
        .map_init(rand::thread_rng, |rng, _| {
            dataset.resampled(rng).effective_rate()
        })
        .collect();
    sorted_rates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let sorted_log_rates = sorted_rates.iter().map(|rate| rate.log10()).collect();

    Ok(BootstrapResult {
        sorted_rates,
        sorted_log_rates,
    })
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
