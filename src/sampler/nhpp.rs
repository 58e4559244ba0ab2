//! Non-homogeneous Poisson trains interpolating between a rate code and a temporal code.
//!
//! The instantaneous rate of a presynaptic neuron is the sum of
//! 1. a background rate `r_0`, active on `[t_on, t_off)` and again after `stim_off` if the background
//!    stops before the stimulus does,
//! 2. a rate-coded stimulus term `(1 - s) r` on `[stim_on, stim_off)`,
//! 3. a temporally coded term made of Gaussian bumps around precise spike times, scaled such that the
//!    expected number of stimulus-driven spikes does not depend on `s`.
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::StimulusWindow;
use crate::ensemble::{RatePattern, SpikeEnsemble, SpikePattern};
use crate::error::SeqError;
use crate::kernel::{gauss_spike_time, gauss_sum_bound};
use crate::rng::pattern_stream;

/// Relative slack tolerated on the acceptance ratio before the envelope is considered violated.
const ACCEPTANCE_TOLERANCE: f64 = 1e-12;

/// A presynaptic neuron emitting non-homogeneous Poisson spike trains.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PreSyn {
    /// Background spike rate (Hz).
    r_0: f64,
    /// Standard deviation of precisely timed spikes (ms).
    sigma: f64,
}

impl PreSyn {
    /// Create a presynaptic neuron with the given background rate (Hz) and timing precision (ms).
    /// The function returns an error if the rate is negative or if the precision is not positive.
    pub fn build(r_0: f64, sigma: f64) -> Result<Self, SeqError> {
        if !(r_0 >= 0.0 && r_0.is_finite()) {
            return Err(SeqError::InvalidParameter(format!(
                "background rate must be non-negative, got {}",
                r_0
            )));
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(SeqError::InvalidParameter(format!(
                "timing precision must be positive, got {}",
                sigma
            )));
        }
        Ok(PreSyn { r_0, sigma })
    }

    /// Returns the background rate (Hz).
    pub fn r_0(&self) -> f64 {
        self.r_0
    }

    /// Returns the standard deviation of precisely timed spikes (ms).
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Returns the background rate per ms.
    fn background(&self) -> f64 {
        1e-3 * self.r_0
    }

    /// Returns the piecewise constant part of the rate (background and rate-coded stimulus).
    fn step_rate(&self, time: f64, window: &StimulusWindow, s: f64, r: f64) -> f64 {
        let mut rate = 0.0;
        if time >= window.t_on && time < window.t_off {
            rate += self.background();
        }
        if time >= window.stim_on && time < window.stim_off {
            rate += (1.0 - s) * r;
        }
        if window.t_off <= window.stim_off && time >= window.stim_off {
            rate += self.background();
        }
        rate
    }

    /// Returns the factor in front of the Gaussian bumps, or zero if there are none.
    fn temporal_scale(&self, window: &StimulusWindow, s: f64, r: f64, spike_times: &[f64]) -> f64 {
        let num_spikes = spike_times.len() as f64;
        if r > 0.0 && s * num_spikes > 0.0 {
            r * (window.stim_off - window.stim_on) / num_spikes * s
        } else {
            0.0
        }
    }

    /// Returns the instantaneous rate (per ms) at the given time.
    pub fn rate_at(
        &self,
        time: f64,
        window: &StimulusWindow,
        s: f64,
        r: f64,
        spike_times: &[f64],
    ) -> f64 {
        self.rate(&[time], window, s, r, spike_times)[0]
    }

    /// Returns the instantaneous rate (per ms) at each of the given times.
    pub fn rate(
        &self,
        times: &[f64],
        window: &StimulusWindow,
        s: f64,
        r: f64,
        spike_times: &[f64],
    ) -> Vec<f64> {
        let scale = self.temporal_scale(window, s, r, spike_times);
        let mut rates: Vec<f64> = times
            .iter()
            .map(|t| self.step_rate(*t, window, s, r))
            .collect();
        if scale > 0.0 {
            gauss_spike_time(times, spike_times, self.sigma)
                .into_iter()
                .zip(rates.iter_mut())
                .for_each(|(g, rate)| *rate += scale * g);
        }
        rates
    }

    /// Returns an upper bound on the instantaneous rate over the whole time axis.
    /// At most one background term is active at any time.
    pub fn rate_bound(&self, window: &StimulusWindow, s: f64, r: f64, spike_times: &[f64]) -> f64 {
        let scale = self.temporal_scale(window, s, r, spike_times);
        let temporal = if scale > 0.0 {
            scale * gauss_sum_bound(spike_times, self.sigma)
        } else {
            0.0
        };
        self.background() + (1.0 - s) * r + temporal
    }

    /// Samples a spike train by rejection sampling.
    ///
    /// Candidates are drawn from a homogeneous Poisson process with rate [`PreSyn::rate_bound`] on
    /// `[t_on, T)`, where `T = max(t_off, stim_off + 200)`, and each candidate is kept with
    /// probability `rate(t) / rate_bound`.
    ///
    /// # Errors
    /// Returns an error for invalid windows, a mixing coefficient `s` outside [0, 1], a negative
    /// stimulus rate `r`, non-finite spike times, or if the acceptance ratio ever exceeds one.
    pub fn spike_train<R: Rng>(
        &self,
        window: &StimulusWindow,
        s: f64,
        r: f64,
        spike_times: &[f64],
        rng: &mut R,
    ) -> Result<Vec<f64>, SeqError> {
        window.validate()?;
        check_coding(s, r)?;
        if spike_times.iter().any(|t| !t.is_finite()) {
            return Err(SeqError::InvalidSpikeTimes(
                "precise spike times must be finite".to_string(),
            ));
        }

        let r_max = self.rate_bound(window, s, r, spike_times);
        let duration = window.horizon() - window.t_on;
        if r_max <= 0.0 || duration <= 0.0 {
            return Ok(vec![]);
        }

        let poisson = Poisson::new(r_max * duration)
            .map_err(|e| SeqError::InvalidParameter(format!("invalid candidate count distribution: {}", e)))?;
        let num_candidates = poisson.sample(rng) as usize;
        let candidates: Vec<f64> = (0..num_candidates)
            .map(|_| window.t_on + duration * rng.gen::<f64>())
            .collect();
        let rates = self.rate(&candidates, window, s, r, spike_times);

        let train = thin(candidates, &rates, r_max, rng)?;
        debug!(
            "Rejection sampling: kept {} of {} candidates (r_max={})",
            train.len(),
            num_candidates,
            r_max
        );
        Ok(train)
    }

    /// Samples one spike train per synapse of a pattern.
    ///
    /// Synapse `k` is driven by the stimulus rate `rates[k]` and, if provided, by the precise spike
    /// times of row `k` of `times`.
    pub fn sample_pattern<R: Rng>(
        &self,
        window: &StimulusWindow,
        s: f64,
        rates: &RatePattern,
        times: Option<&SpikePattern>,
        rng: &mut R,
    ) -> Result<SpikePattern, SeqError> {
        let excitatory = self.sample_ensemble(
            window,
            s,
            &rates.excitatory,
            times.map(|pattern| &pattern.excitatory),
            rng,
        )?;
        let inhibitory = self.sample_ensemble(
            window,
            s,
            &rates.inhibitory,
            times.map(|pattern| &pattern.inhibitory),
            rng,
        )?;
        Ok(SpikePattern {
            excitatory,
            inhibitory,
        })
    }

    /// Samples every pattern in parallel. Pattern `k` draws from stream `k` of the seed, so the result
    /// does not depend on the number of threads.
    pub fn sample_patterns(
        &self,
        window: &StimulusWindow,
        s: f64,
        rates: &[RatePattern],
        times: Option<&[SpikePattern]>,
        seed: u64,
    ) -> Result<Vec<SpikePattern>, SeqError> {
        if let Some(times) = times {
            if times.len() != rates.len() {
                return Err(SeqError::IncompatibleEnsembles(format!(
                    "{} rate patterns for {} timing patterns",
                    rates.len(),
                    times.len()
                )));
            }
        }

        (0..rates.len())
            .into_par_iter()
            .map(|k| {
                let mut rng = pattern_stream(seed, k);
                self.sample_pattern(window, s, &rates[k], times.map(|times| &times[k]), &mut rng)
            })
            .collect()
    }

    fn sample_ensemble<R: Rng>(
        &self,
        window: &StimulusWindow,
        s: f64,
        rates: &[f64],
        times: Option<&SpikeEnsemble>,
        rng: &mut R,
    ) -> Result<SpikeEnsemble, SeqError> {
        if let Some(times) = times {
            if times.num_synapses() != rates.len() {
                return Err(SeqError::IncompatibleEnsembles(format!(
                    "{} rates for {} synapses",
                    rates.len(),
                    times.num_synapses()
                )));
            }
        }

        let rows = rates
            .iter()
            .enumerate()
            .map(|(k, r)| {
                let spike_times = times.and_then(|times| times.spikes(k)).unwrap_or(&[]);
                self.spike_train(window, s, *r, spike_times, rng)
            })
            .collect::<Result<Vec<_>, _>>()?;
        SpikeEnsemble::from_rows(rows)
    }
}

/// Returns an error if the mixing coefficient is outside [0, 1] or if the stimulus rate is negative.
fn check_coding(s: f64, r: f64) -> Result<(), SeqError> {
    if !(0.0..=1.0).contains(&s) {
        return Err(SeqError::InvalidParameter(format!(
            "mixing coefficient must be in [0, 1], got {}",
            s
        )));
    }
    if !(r >= 0.0 && r.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "stimulus rate must be non-negative, got {}",
            r
        )));
    }
    Ok(())
}

/// Keeps each candidate with probability `rate / r_max` and returns the sorted survivors.
fn thin<R: Rng>(
    candidates: Vec<f64>,
    rates: &[f64],
    r_max: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SeqError> {
    let mut train = Vec::with_capacity(candidates.len());
    for (t, rate) in candidates.into_iter().zip(rates) {
        let ratio = rate / r_max;
        if ratio > 1.0 + ACCEPTANCE_TOLERANCE {
            return Err(SeqError::AcceptanceViolation { time: t, ratio });
        }
        if rng.gen::<f64>() < ratio {
            train.push(t);
        }
    }
    train.sort_by(|a, b| a.total_cmp(b));
    Ok(train)
}
