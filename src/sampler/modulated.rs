//! Poisson trains with a sinusoidally modulated firing rate.
//!
//! The firing rate of a modulated synapse follows `A sin(2π f t / 1000 + π/2) + A`, held constant
//! over consecutive windows of width `t_win`. Within each window, spikes are drawn from exponential
//! inter-arrival times.
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};
use std::iter;

use log::{debug, warn};
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::config::{ModulationConfig, Modulated};
use crate::ensemble::SpikeEnsemble;
use crate::error::SeqError;
use crate::sampler::stationary::{check_rate, check_window, exp_spike_train};

/// Rate factor of modulated synapses when the modulation frequency is zero (relative to `mod_amp`).
pub const STATIONARY_AMPLITUDE: f64 = 0.6;

/// Returns the sinusoidal rate profile sampled every `t_win` ms, from `t0` up to one window past `t`.
pub fn sinusoidal_rate(
    amplitude: f64,
    mod_freq: f64,
    t0: f64,
    t: f64,
    t_win: f64,
) -> Result<Vec<f64>, SeqError> {
    check_rate_window(t_win)?;
    check_window(t0, t)?;
    Ok(iter::successors(Some(0_usize), |k| Some(k + 1))
        .map(|k| t0 + k as f64 * t_win)
        .take_while(|time| *time < t + t_win)
        .map(|time| amplitude * (2.0 * PI * mod_freq * time / 1000.0 + FRAC_PI_2).sin() + amplitude)
        .collect())
}

fn check_rate_window(t_win: f64) -> Result<(), SeqError> {
    if !(t_win > 0.0 && t_win.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "rate window must be positive, got {}",
            t_win
        )));
    }
    Ok(())
}

/// Returns the number of windows of width `t_win` covering `[0, tstop)` that `num_rates` rates
/// leave without a rate. These windows are treated as silent by [`gen_poisson_spikes`].
pub fn num_padded_windows(num_rates: usize, t_win: f64, tstop: f64) -> Result<usize, SeqError> {
    check_rate_window(t_win)?;
    check_window(0.0, tstop)?;
    let num_windows = (tstop / t_win).ceil() as usize;
    Ok(num_windows.saturating_sub(num_rates))
}

/// Samples a Poisson spike train on `[0, tstop)` from a rate (per ms) given for each window of width `t_win`.
///
/// Windows with a non-positive rate are skipped. If fewer rates than windows are provided, the
/// missing rates are taken to be zero and a warning is logged. Spike times of the last window may
/// exceed `tstop`.
pub fn gen_poisson_spikes<R: Rng>(
    rates: &[f64],
    t_win: f64,
    tstop: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SeqError> {
    let num_padded = num_padded_windows(rates.len(), t_win, tstop)?;
    if rates.iter().any(|rate| !rate.is_finite()) {
        return Err(SeqError::InvalidParameter(
            "firing rates must be finite".to_string(),
        ));
    }

    let num_windows = (tstop / t_win).ceil() as usize;
    if num_padded > 0 {
        warn!(
            "Not enough firing rates ({} for {} windows), padding with zeros",
            rates.len(),
            num_windows
        );
    }

    let mut train = vec![];
    for (i, rate) in rates
        .iter()
        .chain(iter::repeat(&0.0))
        .take(num_windows)
        .enumerate()
    {
        if *rate <= 0.0 {
            continue;
        }
        let exp = Exp::new(*rate)
            .map_err(|e| SeqError::InvalidParameter(format!("invalid inter-arrival distribution: {}", e)))?;
        let end = (i + 1) as f64 * t_win;
        let mut time = i as f64 * t_win;
        loop {
            let gap = exp.sample(rng);
            time += gap;
            if time >= end {
                break;
            }
            if gap > 0.0 {
                train.push(time);
            }
        }
    }
    Ok(train)
}

/// Samples one spike train per synapse on `[t0, t)`, with the rates (per ms) of the modulated
/// synapses following a sinusoid.
///
/// - If the modulation frequency is zero, modulated synapses fire at a stationary rate scaled by
///   `mod_amp * STATIONARY_AMPLITUDE`.
/// - Otherwise, modulated synapses follow a sinusoid of amplitude `rate * mod_amp` (divided by √2
///   when only a subset of synapses is modulated).
///
/// Other synapses fire at their stationary rate.
pub fn build_rate_seq_modulated<R: Rng>(
    rates: &[f64],
    t0: f64,
    t: f64,
    config: &ModulationConfig,
    rng: &mut R,
) -> Result<SpikeEnsemble, SeqError> {
    config.validate()?;
    check_window(t0, t)?;

    let sinusoid_factor = match config.modulated {
        Modulated::All => config.mod_amp,
        Modulated::Subset(_) => config.mod_amp * FRAC_1_SQRT_2,
    };

    let rows = rates
        .iter()
        .enumerate()
        .map(|(i, rate)| {
            check_rate(*rate)?;
            if !config.modulated.contains(i) {
                return exp_spike_train(*rate, t0, t, rng);
            }
            if config.mod_freq == 0.0 {
                return exp_spike_train(rate * config.mod_amp * STATIONARY_AMPLITUDE, t0, t, rng);
            }
            if *rate == 0.0 {
                return Ok(vec![]);
            }

            let profile =
                sinusoidal_rate(rate * sinusoid_factor, config.mod_freq, t0, t, config.t_win)?;
            let mut train = gen_poisson_spikes(&profile, config.t_win, t - t0, rng)?;
            train.retain(|time| *time >= 0.0 && *time < t - t0);
            train.sort_by(|a, b| a.total_cmp(b));
            Ok(train.into_iter().map(|time| t0 + time).collect())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ensemble = SpikeEnsemble::from_rows(rows)?;
    debug!(
        "Modulated trains at {} Hz: {} spikes over {} synapses",
        config.mod_freq,
        ensemble.num_spikes(),
        ensemble.num_synapses()
    );
    Ok(ensemble)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 42;

    #[test]
    fn test_sinusoidal_rate() {
        let profile = sinusoidal_rate(0.1, 10.0, 0.0, 100.0, 25.0).unwrap();
        assert_eq!(profile.len(), 5);
        assert_relative_eq!(profile[0], 0.2);
        assert_relative_eq!(profile[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(profile[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(profile[4], 0.2, epsilon = 1e-12);

        assert!(matches!(
            sinusoidal_rate(0.1, 10.0, 0.0, 100.0, 0.0),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            sinusoidal_rate(0.1, 10.0, 100.0, 0.0, 25.0),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_gen_poisson_spikes_windows() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let train = gen_poisson_spikes(&[0.0, 0.5, -1.0], 10.0, 30.0, &mut rng).unwrap();
        assert!(!train.is_empty());
        assert!(train.iter().all(|t| *t >= 10.0 && *t < 20.0));
        assert!(train.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_gen_poisson_spikes_pads_missing_rates() {
        let mut rng = StdRng::seed_from_u64(SEED);
        // 25 windows needed, 5 rates provided
        assert_eq!(num_padded_windows(5, 10.0, 250.0), Ok(20));
        assert_eq!(num_padded_windows(25, 10.0, 250.0), Ok(0));
        assert_eq!(num_padded_windows(30, 10.0, 250.0), Ok(0));
        assert_eq!(num_padded_windows(0, 10.0, 245.0), Ok(25));
        let train = gen_poisson_spikes(&[0.5; 5], 10.0, 250.0, &mut rng).unwrap();
        assert!(!train.is_empty());
        assert!(train.iter().all(|t| *t < 50.0));
    }

    #[test]
    fn test_gen_poisson_spikes_count() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let total: usize = (0..200)
            .map(|_| gen_poisson_spikes(&[0.1; 25], 10.0, 250.0, &mut rng).unwrap().len())
            .sum();
        let mean = total as f64 / 200.0;
        assert!((mean - 25.0).abs() < 1.5);
    }

    #[test]
    fn test_gen_poisson_spikes_invalid() {
        let mut rng = StdRng::seed_from_u64(SEED);
        assert!(matches!(
            gen_poisson_spikes(&[0.1], 0.0, 250.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            gen_poisson_spikes(&[f64::NAN], 10.0, 250.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_modulated_trough_is_silent() {
        let mut rng = StdRng::seed_from_u64(SEED);
        // 10 Hz: the rate vanishes on [50, 60) of every 100 ms cycle
        let config = ModulationConfig {
            mod_freq: 10.0,
            ..ModulationConfig::default()
        };
        let ensemble =
            build_rate_seq_modulated(&[0.05; 20], 0.0, 1000.0, &config, &mut rng).unwrap();
        assert!(ensemble.num_spikes() > 0);
        for spikes in ensemble.iter_spikes() {
            assert!(spikes.windows(2).all(|w| w[0] <= w[1]));
            assert!(spikes.iter().all(|t| *t >= 0.0 && *t < 1000.0));
            assert!(spikes.iter().all(|t| !(50.0..60.0).contains(&t.rem_euclid(100.0))));
        }
    }

    #[test]
    fn test_modulated_subset() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let config = ModulationConfig {
            mod_freq: 10.0,
            modulated: Modulated::Subset(vec![0]),
            ..ModulationConfig::default()
        };
        let ensemble =
            build_rate_seq_modulated(&[0.05, 0.2, 0.0], 100.0, 1100.0, &config, &mut rng).unwrap();
        assert_eq!(ensemble.num_synapses(), 3);
        assert!(ensemble.spikes(2).unwrap().is_empty());
        // The modulated synapse follows the absolute-time sinusoid, offset included
        assert!(ensemble
            .spikes(0)
            .unwrap()
            .iter()
            .all(|t| *t >= 100.0 && *t < 1100.0));
        // The unmodulated synapse fires in the troughs too
        assert!(ensemble
            .spikes(1)
            .unwrap()
            .iter()
            .any(|t| (50.0..60.0).contains(&t.rem_euclid(100.0))));
    }

    #[test]
    fn test_modulated_zero_frequency_scales_rate() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let config = ModulationConfig::default();
        // Stationary rate 0.01 * 2.5 * 0.6 = 0.015 per ms over 1000 ms
        let ensemble =
            build_rate_seq_modulated(&[0.01; 200], 0.0, 1000.0, &config, &mut rng).unwrap();
        let mean = ensemble.num_spikes() as f64 / 200.0;
        assert!((mean - 15.0).abs() < 1.0);
    }

    #[test]
    fn test_modulated_invalid_config() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let config = ModulationConfig {
            t_win: -1.0,
            ..ModulationConfig::default()
        };
        assert!(matches!(
            build_rate_seq_modulated(&[0.01], 0.0, 1000.0, &config, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }
}
