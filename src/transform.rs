//! Transformations of spike-train ensembles.
//!
//! Every function returns a new ensemble; rows are kept sorted and the padding sentinel is never
//! shifted, scaled or wrapped.
use crate::ensemble::SpikeEnsemble;
use crate::error::SeqError;

fn check_same_synapses(a: &SpikeEnsemble, b: &SpikeEnsemble) -> Result<(), SeqError> {
    if a.num_synapses() != b.num_synapses() {
        return Err(SeqError::IncompatibleEnsembles(format!(
            "{} synapses against {} synapses",
            a.num_synapses(),
            b.num_synapses()
        )));
    }
    Ok(())
}

fn check_period(t1: f64, t2: f64) -> Result<(), SeqError> {
    if !(t1.is_finite() && t2.is_finite() && t1 < t2) {
        return Err(SeqError::InvalidParameter(format!(
            "invalid periodic window [{}, {})",
            t1, t2
        )));
    }
    Ok(())
}

/// Combines two ensembles synapse by synapse. The result has as many slots per row as both
/// ensembles together.
///
/// # Example
///
/// ```rust
/// use presyn_seqs::ensemble::{SpikeEnsemble, NO_SPIKE};
/// use presyn_seqs::transform::superimpose;
///
/// let a = SpikeEnsemble::from_padded(vec![vec![1.0, 2.0, NO_SPIKE]]).unwrap();
/// let b = SpikeEnsemble::from_padded(vec![vec![0.5, NO_SPIKE, NO_SPIKE]]).unwrap();
/// let s = superimpose(&a, &b).unwrap();
///
/// assert_eq!(s.rows()[0], vec![0.5, 1.0, 2.0, NO_SPIKE, NO_SPIKE, NO_SPIKE]);
/// ```
pub fn superimpose(a: &SpikeEnsemble, b: &SpikeEnsemble) -> Result<SpikeEnsemble, SeqError> {
    check_same_synapses(a, b)?;
    let rows = a
        .iter_spikes()
        .zip(b.iter_spikes())
        .map(|(sa, sb)| [sa, sb].concat())
        .collect();
    SpikeEnsemble::from_rows_with_width(rows, a.width() + b.width())
}

/// Expands an ensemble with several spikes per synapse into an ensemble with a single spike per
/// (duplicated) synapse. Also returns, for every new synapse, the index of its original synapse.
pub fn rate_to_temporal(ensemble: &SpikeEnsemble) -> Result<(SpikeEnsemble, Vec<usize>), SeqError> {
    let (rows, synapses): (Vec<Vec<f64>>, Vec<usize>) = ensemble
        .iter_spikes()
        .enumerate()
        .flat_map(|(k, spikes)| spikes.iter().map(move |t| (vec![*t], k)))
        .unzip();
    Ok((SpikeEnsemble::from_rows_with_width(rows, 1)?, synapses))
}

/// Keeps, for every synapse, the spikes in `[t_start, t_end)`.
pub fn subsequence(
    ensemble: &SpikeEnsemble,
    t_start: f64,
    t_end: f64,
) -> Result<SpikeEnsemble, SeqError> {
    let rows = ensemble
        .iter_spikes()
        .map(|spikes| {
            spikes
                .iter()
                .copied()
                .filter(|t| *t >= t_start && *t < t_end)
                .collect()
        })
        .collect();
    SpikeEnsemble::from_rows(rows)
}

/// Periodic translation: every spike is moved `del_t` ms earlier, and spikes falling before `t1`
/// are moved forward by one period `t2 - t1`.
pub fn translate(
    ensemble: &SpikeEnsemble,
    del_t: f64,
    t1: f64,
    t2: f64,
) -> Result<SpikeEnsemble, SeqError> {
    check_period(t1, t2)?;
    let period = t2 - t1;
    ensemble.map_spikes(|_, t| {
        let shifted = t - del_t;
        if shifted < t1 {
            shifted + period
        } else {
            shifted
        }
    })
}

/// Periodic jitter: spikes of synapse `k` are moved by `jit_mag[k]` ms, and spikes leaving
/// `[stim_s, stim_e)` are wrapped back by one window length.
pub fn jitter_phase(
    ensemble: &SpikeEnsemble,
    stim_s: f64,
    stim_e: f64,
    jit_mag: &[f64],
) -> Result<SpikeEnsemble, SeqError> {
    check_period(stim_s, stim_e)?;
    if jit_mag.len() != ensemble.num_synapses() {
        return Err(SeqError::IncompatibleEnsembles(format!(
            "{} jitter magnitudes for {} synapses",
            jit_mag.len(),
            ensemble.num_synapses()
        )));
    }
    let length = stim_e - stim_s;
    ensemble.map_spikes(|k, t| {
        let jittered = t + jit_mag[k];
        if jittered >= stim_e {
            jittered - length
        } else if jittered < stim_s {
            jittered + length
        } else {
            jittered
        }
    })
}

/// Compresses (or dilates) all spikes relative to the stimulus onset by the given factor.
pub fn compress_stim(
    ensemble: &SpikeEnsemble,
    compression: f64,
    stim_on: f64,
) -> Result<SpikeEnsemble, SeqError> {
    if !(compression >= 0.0 && compression.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "compression factor must be non-negative, got {}",
            compression
        )));
    }
    ensemble.map_spikes(|_, t| (t - stim_on) * compression + stim_on)
}

/// Extends an ensemble over several presentations of duration `period`: the last column is repeated
/// `periods - 1` times, shifted by one more period each time.
pub fn periodic_stim(
    ensemble: &SpikeEnsemble,
    period: f64,
    periods: usize,
) -> Result<SpikeEnsemble, SeqError> {
    if !(period > 0.0 && period.is_finite()) {
        return Err(SeqError::InvalidParameter(format!(
            "presentation duration must be positive, got {}",
            period
        )));
    }
    let rows = ensemble
        .rows()
        .iter()
        .map(|row| {
            let last = row.last().copied().unwrap_or(f64::INFINITY);
            let mut row = row.clone();
            row.extend((1..periods.max(1)).map(|k| last + k as f64 * period));
            row
        })
        .collect();
    SpikeEnsemble::from_padded(rows)
}
