//! Homogeneous Poisson trains built from exponential inter-arrival times.
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::ensemble::SpikeEnsemble;
use crate::error::SeqError;

/// Returns an error if the window `[t0, t]` is not finite or reversed.
pub(crate) fn check_window(t0: f64, t: f64) -> Result<(), SeqError> {
    if !(t0.is_finite() && t.is_finite() && t0 <= t) {
        return Err(SeqError::InvalidParameter(format!(
            "invalid time window [{}, {}]",
            t0, t
        )));
    }
    Ok(())
}

/// Returns an error if the rate is negative or not finite.
pub(crate) fn check_rate(rate: f64) -> Result<(), SeqError> {
    if !(rate >= 0.0 && rate.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "firing rate must be non-negative, got {}",
            rate
        )));
    }
    Ok(())
}

/// Samples a homogeneous Poisson spike train with the given rate (per ms) on `[t0, t)`.
///
/// Inter-arrival times are accumulated from `t0` until they overflow the window; the overflowing
/// draw is discarded. A zero rate yields an empty train.
pub fn exp_spike_train<R: Rng>(rate: f64, t0: f64, t: f64, rng: &mut R) -> Result<Vec<f64>, SeqError> {
    check_window(t0, t)?;
    check_rate(rate)?;
    if rate == 0.0 {
        return Ok(vec![]);
    }

    let exp = Exp::new(rate)
        .map_err(|e| SeqError::InvalidParameter(format!("invalid inter-arrival distribution: {}", e)))?;
    let duration = t - t0;
    let mut train = Vec::with_capacity((rate * duration).ceil() as usize);
    let mut elapsed = exp.sample(rng);
    while elapsed < duration {
        train.push(t0 + elapsed);
        elapsed += exp.sample(rng);
    }
    Ok(train)
}

/// Samples one homogeneous Poisson spike train per synapse, with the prescribed rates (per ms).
///
/// # Example
///
/// ```rust
/// use presyn_seqs::rng;
/// use presyn_seqs::sampler::stationary::build_rate_seq;
///
/// let mut rng = rng::seeded(42);
/// let ensemble = build_rate_seq(&[0.01, 0.0, 0.05], 0.0, 1000.0, &mut rng).unwrap();
///
/// assert_eq!(ensemble.num_synapses(), 3);
/// assert!(ensemble.spikes(1).unwrap().is_empty());
/// ```
pub fn build_rate_seq<R: Rng>(
    rates: &[f64],
    t0: f64,
    t: f64,
    rng: &mut R,
) -> Result<SpikeEnsemble, SeqError> {
    let rows = rates
        .iter()
        .map(|rate| exp_spike_train(*rate, t0, t, rng))
        .collect::<Result<Vec<_>, _>>()?;
    let ensemble = SpikeEnsemble::from_rows(rows)?;
    debug!(
        "Stationary trains: {} spikes over {} synapses",
        ensemble.num_spikes(),
        ensemble.num_synapses()
    );
    Ok(ensemble)
}
