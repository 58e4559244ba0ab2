//! Builders for sets of patterns: precisely timed events, rate ensembles, and their conjunctive
//! (feature binding) and time-sequence arrangements.
//!
//! Rates given to the builders are in Hz; the returned rates are per ms.
use itertools::Itertools;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use rayon::prelude::*;

use crate::ensemble::{Label, RatePattern, SpikeEnsemble, SpikePattern};
use crate::error::SeqError;
use crate::rng::pattern_stream;
use crate::sampler::stationary::check_window;

/// Returns `n` uniformly distributed event times in `[t0, t)` for each of `num_synapses` synapses.
fn uniform_ensemble<R: Rng>(
    num_synapses: usize,
    t0: f64,
    t: f64,
    n: usize,
    rng: &mut R,
) -> Result<SpikeEnsemble, SeqError> {
    let rows = (0..num_synapses)
        .map(|_| (0..n).map(|_| t0 + (t - t0) * rng.gen::<f64>()).collect())
        .collect();
    SpikeEnsemble::from_rows_with_width(rows, n.max(1))
}

/// Returns one uniformly timed pattern of `n_e` excitatory and `n_i` inhibitory synapses.
fn uniform_pattern<R: Rng>(
    n_e: usize,
    n_i: usize,
    t0: f64,
    t: f64,
    n: usize,
    rng: &mut R,
) -> Result<SpikePattern, SeqError> {
    Ok(SpikePattern {
        excitatory: uniform_ensemble(n_e, t0, t, n, rng)?,
        inhibitory: uniform_ensemble(n_i, t0, t, n, rng)?,
    })
}

/// Generates `p` patterns with `n` events per synapse at uniformly distributed times in `[t0, t)`.
///
/// # Example
///
/// ```rust
/// use presyn_seqs::patterns::build_seqs;
/// use presyn_seqs::rng;
///
/// let mut rng = rng::seeded(42);
/// let patterns = build_seqs(5, 100, 20, 0.0, 200.0, 2, &mut rng).unwrap();
///
/// assert_eq!(patterns.len(), 5);
/// assert_eq!(patterns[0].excitatory.num_synapses(), 100);
/// assert_eq!(patterns[0].inhibitory.width(), 2);
/// ```
pub fn build_seqs<R: Rng>(
    p: usize,
    n_e: usize,
    n_i: usize,
    t0: f64,
    t: f64,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SpikePattern>, SeqError> {
    check_window(t0, t)?;
    (0..p)
        .map(|_| uniform_pattern(n_e, n_i, t0, t, n, rng))
        .collect()
}

/// Same as [`build_seqs`], with the patterns generated in parallel. Pattern `k` draws from stream
/// `k` of the seed.
pub fn par_build_seqs(
    p: usize,
    n_e: usize,
    n_i: usize,
    t0: f64,
    t: f64,
    n: usize,
    seed: u64,
) -> Result<Vec<SpikePattern>, SeqError> {
    check_window(t0, t)?;
    (0..p)
        .into_par_iter()
        .map(|k| uniform_pattern(n_e, n_i, t0, t, n, &mut pattern_stream(seed, k)))
        .collect()
}

/// Splits a set of rates (per ms) into its excitatory and inhibitory parts.
fn split_rates(mut rates: Vec<f64>, n_e: usize) -> RatePattern {
    let inhibitory = rates.split_off(n_e);
    RatePattern {
        excitatory: rates,
        inhibitory,
    }
}

/// Log-normally distributed firing rates, with mean `exp(mu + sigma^2 / 2)` Hz.
pub fn lognormal_rates<R: Rng>(
    p: usize,
    n_e: usize,
    n_i: usize,
    mu: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<RatePattern>, SeqError> {
    if !mu.is_finite() {
        return Err(SeqError::InvalidParameter(format!(
            "log-normal location must be finite, got {}",
            mu
        )));
    }
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "log-normal scale must be non-negative, got {}",
            sigma
        )));
    }
    let lognormal = LogNormal::new(mu, sigma)
        .map_err(|e| SeqError::InvalidParameter(format!("invalid log-normal distribution: {}", e)))?;
    Ok((0..p)
        .map(|_| {
            let rates = (0..n_e + n_i)
                .map(|_| 1e-3 * lognormal.sample(rng))
                .collect();
            split_rates(rates, n_e)
        })
        .collect())
}

/// Sparsely distributed firing rates: every synapse is active at `r_max` Hz with probability
/// `mu / r_max`, and silent otherwise.
pub fn sparse_rates<R: Rng>(
    p: usize,
    n_e: usize,
    n_i: usize,
    mu: f64,
    r_max: f64,
    rng: &mut R,
) -> Result<Vec<RatePattern>, SeqError> {
    if !(r_max > 0.0 && r_max.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "rate of active synapses must be positive, got {}",
            r_max
        )));
    }
    if !(0.0..=r_max).contains(&mu) {
        return Err(SeqError::InvalidParameter(format!(
            "ensemble average rate must be in [0, {}], got {}",
            r_max, mu
        )));
    }

    let p_max = mu / r_max;
    Ok((0..p)
        .map(|_| {
            let rates = (0..n_e + n_i)
                .map(|_| {
                    if rng.gen::<f64>() < p_max {
                        1e-3 * r_max
                    } else {
                        0.0
                    }
                })
                .collect();
            split_rates(rates, n_e)
        })
        .collect())
}

/// Returns the number of patterns per feature of a conjunctive task with `num` patterns in total.
fn num_features(num: usize) -> Result<usize, SeqError> {
    let p = (num as f64).sqrt().round() as usize;
    if num == 0 || p * p != num {
        return Err(SeqError::InvalidParameter(format!(
            "the number of patterns must be a positive perfect square, got {}",
            num
        )));
    }
    Ok(p)
}

/// Rate patterns for a feature binding task.
///
/// The synapses are split in two halves; `p = sqrt(num)` sparse rate patterns are drawn for each
/// half, and pattern `j * p + k` is made of feature `j` on the first half and feature `k` on the
/// second half.
pub fn assoc_rates<R: Rng>(
    num: usize,
    n_e: usize,
    n_i: usize,
    r_mean: f64,
    r_max: f64,
    rng: &mut R,
) -> Result<Vec<RatePattern>, SeqError> {
    let p = num_features(num)?;
    let (n_e1, n_i1) = (n_e / 2, n_i / 2);
    let first = sparse_rates(p, n_e1, n_i1, r_mean, r_max, rng)?;
    let second = sparse_rates(p, n_e - n_e1, n_i - n_i1, r_mean, r_max, rng)?;

    Ok(first
        .iter()
        .cartesian_product(second.iter())
        .map(|(a, b)| RatePattern {
            excitatory: [a.excitatory.as_slice(), b.excitatory.as_slice()].concat(),
            inhibitory: [a.inhibitory.as_slice(), b.inhibitory.as_slice()].concat(),
        })
        .collect())
}

/// Precisely timed patterns for a feature binding task, arranged as in [`assoc_rates`].
pub fn assoc_seqs<R: Rng>(
    num: usize,
    n_e: usize,
    n_i: usize,
    t0: f64,
    t: f64,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SpikePattern>, SeqError> {
    let p = num_features(num)?;
    let (n_e1, n_i1) = (n_e / 2, n_i / 2);
    let first = build_seqs(p, n_e1, n_i1, t0, t, n, rng)?;
    let second = build_seqs(p, n_e - n_e1, n_i - n_i1, t0, t, n, rng)?;

    Ok(first
        .iter()
        .cartesian_product(second.iter())
        .map(|(a, b)| SpikePattern {
            excitatory: SpikeEnsemble::stack([&a.excitatory, &b.excitatory]),
            inhibitory: SpikeEnsemble::stack([&a.inhibitory, &b.inhibitory]),
        })
        .collect())
}

/// Splits `num_synapses` synapses into `num_groups` groups of equal size.
/// Returns the group size and the number of remaining synapses, which must not exceed the number of groups.
pub fn group_layout(num_synapses: usize, num_groups: usize) -> Result<(usize, usize), SeqError> {
    if num_groups == 0 {
        return Err(SeqError::InvalidParameter(
            "the number of groups must be positive".to_string(),
        ));
    }
    let group_size = num_synapses / num_groups;
    let remainder = num_synapses - group_size * num_groups;
    if remainder > num_groups {
        return Err(SeqError::GroupMismatch {
            num_synapses,
            num_groups,
            remainder,
        });
    }
    Ok((group_size, remainder))
}

/// Returns the number of presentation orders of `p` features, i.e., `p!`.
fn num_orders(p: usize) -> Result<usize, SeqError> {
    (1..=p)
        .try_fold(1_usize, |acc, k| acc.checked_mul(k))
        .ok_or_else(|| {
            SeqError::InvalidParameter(format!("too many orders for {} features", p))
        })
}

/// Rate patterns for a time sequence discrimination task with `p` features.
///
/// The synapses are split in `p` groups, each with its own sparse rate pattern. Since rates do not
/// depend on the order in which features are presented, the same rates are returned for all `p!`
/// orders. Remaining synapses are silent.
pub fn assoc_rates_time_sequence<R: Rng>(
    p: usize,
    n_e: usize,
    n_i: usize,
    r_mean: f64,
    r_max: f64,
    rng: &mut R,
) -> Result<Vec<RatePattern>, SeqError> {
    let (size_e, rem_e) = group_layout(n_e, p)?;
    let (size_i, rem_i) = group_layout(n_i, p)?;

    let groups = sparse_rates(p, size_e, size_i, r_mean, r_max, rng)?;
    let mut excitatory: Vec<f64> = groups.iter().flat_map(|g| g.excitatory.iter().copied()).collect();
    let mut inhibitory: Vec<f64> = groups.iter().flat_map(|g| g.inhibitory.iter().copied()).collect();
    excitatory.resize(excitatory.len() + rem_e, 0.0);
    inhibitory.resize(inhibitory.len() + rem_i, 0.0);

    let num = num_orders(p)?;
    info!("Time sequence rates: {} orders of {} features", num, p);
    Ok(vec![
        RatePattern {
            excitatory,
            inhibitory
        };
        num
    ])
}

/// Precisely timed patterns for a time sequence discrimination task with `p` features.
///
/// The synapses are split in `p` groups, each with its own uniformly timed events in `[t0, t)`.
/// Every permutation of the groups yields one pattern, in lexicographic order: the group at
/// position `i` of the permutation is delayed by `i * delta_t`. Remaining synapses are silent.
pub fn assoc_seqs_time_sequence<R: Rng>(
    p: usize,
    n_e: usize,
    n_i: usize,
    t0: f64,
    t: f64,
    n: usize,
    delta_t: f64,
    rng: &mut R,
) -> Result<Vec<SpikePattern>, SeqError> {
    let (size_e, rem_e) = group_layout(n_e, p)?;
    let (size_i, rem_i) = group_layout(n_i, p)?;
    if !delta_t.is_finite() {
        return Err(SeqError::InvalidParameter(format!(
            "time between features must be finite, got {}",
            delta_t
        )));
    }
    num_orders(p)?;

    let groups = build_seqs(p, size_e, size_i, t0, t, n, rng)?;

    let patterns = (0..p)
        .permutations(p)
        .map(|order| -> Result<SpikePattern, SeqError> {
            let mut excitatory = Vec::with_capacity(p + 1);
            let mut inhibitory = Vec::with_capacity(p + 1);
            for (g, group) in groups.iter().enumerate() {
                let position = order.iter().position(|k| *k == g).unwrap_or(g);
                let delay = delta_t * position as f64;
                excitatory.push(group.excitatory.map_spikes(|_, time| time + delay)?);
                inhibitory.push(group.inhibitory.map_spikes(|_, time| time + delay)?);
            }
            excitatory.push(SpikeEnsemble::silent(rem_e));
            inhibitory.push(SpikeEnsemble::silent(rem_i));
            Ok(SpikePattern {
                excitatory: SpikeEnsemble::stack(&excitatory),
                inhibitory: SpikeEnsemble::stack(&inhibitory),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Time sequence patterns: {} orders of {} features",
        patterns.len(),
        p
    );
    Ok(patterns)
}

/// Randomly labels `p` patterns into two categories: `p / 2` patterns (rounded down) are labelled
/// `-1` and the others `+1`.
pub fn assign_labels<R: Rng>(p: usize, rng: &mut R) -> Vec<Label> {
    let mut labels: Vec<Label> = vec![1; p];
    let mut indices: Vec<usize> = (0..p).collect();
    indices.shuffle(rng);
    for k in &indices[..p / 2] {
        labels[*k] = -1;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 42;

    #[test]
    fn test_build_seqs() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = build_seqs(4, 30, 10, 50.0, 150.0, 3, &mut rng).unwrap();
        assert_eq!(patterns.len(), 4);
        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.num_synapses(), 30);
            assert_eq!(pattern.inhibitory.num_synapses(), 10);
            assert_eq!(pattern.excitatory.num_spikes(), 90);
            for spikes in pattern.excitatory.iter_spikes() {
                assert!(spikes.windows(2).all(|w| w[0] <= w[1]));
                assert!(spikes.iter().all(|t| *t >= 50.0 && *t < 150.0));
            }
        }
        assert_ne!(patterns[0], patterns[1]);

        assert!(matches!(
            build_seqs(4, 30, 10, 150.0, 50.0, 3, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_par_build_seqs() {
        let patterns = par_build_seqs(6, 20, 5, 0.0, 100.0, 1, SEED).unwrap();
        assert_eq!(patterns.len(), 6);
        assert_eq!(par_build_seqs(6, 20, 5, 0.0, 100.0, 1, SEED).unwrap(), patterns);

        let expected = uniform_pattern(20, 5, 0.0, 100.0, 1, &mut pattern_stream(SEED, 3)).unwrap();
        assert_eq!(patterns[3], expected);
    }

    #[test]
    fn test_sparse_rates() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = sparse_rates(5, 800, 200, 10.0, 50.0, &mut rng).unwrap();
        assert_eq!(patterns.len(), 5);

        let mut num_active = 0;
        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.len(), 800);
            assert_eq!(pattern.inhibitory.len(), 200);
            for rate in pattern.excitatory.iter().chain(pattern.inhibitory.iter()) {
                assert!(*rate == 0.0 || *rate == 1e-3 * 50.0);
                if *rate > 0.0 {
                    num_active += 1;
                }
            }
        }
        // Active with probability 0.2
        assert!((num_active as f64 / 5000.0 - 0.2).abs() < 0.03);

        assert!(matches!(
            sparse_rates(5, 800, 200, 60.0, 50.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            sparse_rates(5, 800, 200, 0.0, 0.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_lognormal_rates() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = lognormal_rates(2, 4000, 1000, 1.0, 0.5, &mut rng).unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[1].excitatory.len(), 4000);
        assert_eq!(patterns[1].inhibitory.len(), 1000);

        let logs: Vec<f64> = patterns
            .iter()
            .flat_map(|p| p.excitatory.iter().chain(p.inhibitory.iter()))
            .map(|rate| (rate * 1e3).ln())
            .collect();
        let mean = logs.iter().sum::<f64>() / logs.len() as f64;
        assert_relative_eq!(mean, 1.0, epsilon = 0.02);

        assert!(matches!(
            lognormal_rates(2, 10, 10, 1.0, -0.5, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            lognormal_rates(2, 10, 10, f64::NAN, 0.5, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_num_orders() {
        assert_eq!(num_orders(0), Ok(1));
        assert_eq!(num_orders(4), Ok(24));
        assert_eq!(num_orders(20), Ok(2_432_902_008_176_640_000));
        assert!(matches!(num_orders(21), Err(SeqError::InvalidParameter(_))));
    }

    #[test]
    fn test_assoc_rates() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = assoc_rates(9, 101, 21, 10.0, 50.0, &mut rng).unwrap();
        assert_eq!(patterns.len(), 9);
        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.len(), 101);
            assert_eq!(pattern.inhibitory.len(), 21);
        }

        // Pattern (j, k) shares its first half with (j, k') and its second half with (j', k)
        assert_eq!(patterns[3].excitatory[..50], patterns[5].excitatory[..50]);
        assert_eq!(patterns[3].inhibitory[..10], patterns[4].inhibitory[..10]);
        assert_eq!(patterns[1].excitatory[50..], patterns[7].excitatory[50..]);
        assert_eq!(patterns[1].inhibitory[10..], patterns[4].inhibitory[10..]);

        assert!(matches!(
            assoc_rates(10, 100, 20, 10.0, 50.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            assoc_rates(0, 100, 20, 10.0, 50.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_assoc_seqs() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = assoc_seqs(4, 10, 4, 0.0, 100.0, 2, &mut rng).unwrap();
        assert_eq!(patterns.len(), 4);
        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.num_synapses(), 10);
            assert_eq!(pattern.inhibitory.num_synapses(), 4);
            assert_eq!(pattern.excitatory.width(), 2);
        }

        // Patterns (0, 0) and (0, 1) share their first half, (0, 1) and (1, 1) their second half
        assert_eq!(patterns[0].excitatory.rows()[..5], patterns[1].excitatory.rows()[..5]);
        assert_ne!(patterns[0].excitatory.rows()[5..], patterns[1].excitatory.rows()[5..]);
        assert_eq!(patterns[1].excitatory.rows()[5..], patterns[3].excitatory.rows()[5..]);
        assert_eq!(patterns[1].inhibitory.rows()[2..], patterns[3].inhibitory.rows()[2..]);
    }

    #[test]
    fn test_group_layout() {
        assert_eq!(group_layout(12, 3), Ok((4, 0)));
        assert_eq!(group_layout(14, 3), Ok((4, 2)));
        assert_eq!(group_layout(2, 3), Ok((0, 2)));
        assert!(matches!(
            group_layout(12, 0),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_assoc_rates_time_sequence() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let patterns = assoc_rates_time_sequence(3, 100, 20, 10.0, 50.0, &mut rng).unwrap();
        assert_eq!(patterns.len(), 6);
        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.len(), 100);
            assert_eq!(pattern.inhibitory.len(), 20);
            assert_eq!(pattern, &patterns[0]);
        }
        // The remaining synapses are silent
        assert_eq!(patterns[0].excitatory[99], 0.0);
        assert_eq!(patterns[0].inhibitory[18..], [0.0, 0.0]);

        let patterns = assoc_rates_time_sequence(4, 100, 20, 10.0, 50.0, &mut rng).unwrap();
        assert_eq!(patterns.len(), 24);

        // 21! orders do not fit in memory, nor in a usize
        assert!(matches!(
            assoc_rates_time_sequence(21, 42, 21, 10.0, 50.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
        assert!(matches!(
            assoc_seqs_time_sequence(21, 42, 21, 0.0, 50.0, 1, 20.0, &mut rng),
            Err(SeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_assoc_seqs_time_sequence() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let delta_t = 20.0;
        let patterns =
            assoc_seqs_time_sequence(3, 10, 4, 0.0, 50.0, 1, delta_t, &mut rng).unwrap();
        assert_eq!(patterns.len(), 6);

        for pattern in patterns.iter() {
            assert_eq!(pattern.excitatory.num_synapses(), 10);
            assert_eq!(pattern.inhibitory.num_synapses(), 4);
            // Groups of 3 excitatory synapses, the last one is silent
            assert!(pattern.excitatory.spikes(9).unwrap().is_empty());
            assert!(pattern.inhibitory.spikes(3).unwrap().is_empty());
        }

        // Order [0, 1, 2] against order [2, 1, 0]: group 0 moves from position 0 to position 2,
        // group 1 stays in the middle
        let (first, last) = (&patterns[0], &patterns[5]);
        for k in 0..3 {
            assert_relative_eq!(
                last.excitatory.spikes(k).unwrap()[0],
                first.excitatory.spikes(k).unwrap()[0] + 2.0 * delta_t
            );
            assert_relative_eq!(
                last.excitatory.spikes(3 + k).unwrap()[0],
                first.excitatory.spikes(3 + k).unwrap()[0]
            );
            assert_relative_eq!(
                first.excitatory.spikes(6 + k).unwrap()[0],
                last.excitatory.spikes(6 + k).unwrap()[0] + 2.0 * delta_t
            );
        }
        assert!(first
            .excitatory
            .spikes(0)
            .unwrap()
            .iter()
            .all(|t| *t >= 0.0 && *t < 50.0));
    }

    #[test]
    fn test_assign_labels() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let labels = assign_labels(10, &mut rng);
        assert_eq!(labels.len(), 10);
        assert_eq!(labels.iter().filter(|l| **l == 1).count(), 5);
        assert_eq!(labels.iter().filter(|l| **l == -1).count(), 5);

        let labels = assign_labels(7, &mut rng);
        assert_eq!(labels.iter().filter(|l| **l == 1).count(), 4);
        assert_eq!(labels.iter().filter(|l| **l == -1).count(), 3);

        assert!(assign_labels(0, &mut rng).is_empty());
    }
}
