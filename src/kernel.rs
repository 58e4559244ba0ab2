//! Gaussian kernel used to shape precisely timed elevations of the firing rate.
use rayon::prelude::*;
use std::f64::consts::PI;

/// Minimum number of evaluation times to consider parallel processing.
pub const MIN_PARALLEL_POINTS: usize = 4096;
/// Distance (in units of sigma) beyond which a center is accounted for by its tail bound only.
const TAIL_CUTOFF: f64 = 8.0;
/// Number of sigma-wide cells inspected on each side of a center.
const CELL_REACH: i64 = 9;
/// Largest center (in units of sigma) for which cell indices are exact.
const MAX_CELL_INDEX: f64 = (1_u64 << 50) as f64;

/// Returns the peak value of a normalized Gaussian density with standard deviation `sigma`.
#[inline]
pub fn gauss_peak(sigma: f64) -> f64 {
    1.0 / (2.0 * PI * sigma * sigma).sqrt()
}

/// Returns the sum of normalized Gaussian densities centered at `spike_times`, evaluated at `time`.
#[inline]
pub fn gauss_sum(time: f64, spike_times: &[f64], sigma: f64) -> f64 {
    let peak = gauss_peak(sigma);
    let denom = 2.0 * sigma * sigma;
    spike_times.iter().fold(0.0, |acc, center| {
        let dt = time - center;
        acc + peak * (-dt * dt / denom).exp()
    })
}

/// Evaluates the sum of Gaussian bumps centered at `spike_times` for every time in `times`.
/// The standard deviation `sigma` must be positive.
pub fn gauss_spike_time(times: &[f64], spike_times: &[f64], sigma: f64) -> Vec<f64> {
    debug_assert!(sigma > 0.0, "the kernel bandwidth must be positive");
    if times.len() >= MIN_PARALLEL_POINTS {
        times
            .par_iter()
            .map(|t| gauss_sum(*t, spike_times, sigma))
            .collect()
    } else {
        times
            .iter()
            .map(|t| gauss_sum(*t, spike_times, sigma))
            .collect()
    }
}

/// Returns an upper bound on the supremum over time of the sum of Gaussian bumps.
///
/// The time axis is cut into cells of width `sigma`; on each cell near a center, every center
/// contributes at most its density at the closest point of the cell. Centers further than
/// `TAIL_CUTOFF` sigmas from a cell are accounted for by their (negligible) tail value.
/// For well-separated centers, the bound matches the peak of a single bump. Centers too far from
/// the origin to be located on the cell grid fall back to the trivial bound (all peaks stacked).
pub fn gauss_sum_bound(spike_times: &[f64], sigma: f64) -> f64 {
    if spike_times.is_empty() {
        return 0.0;
    }

    let peak = gauss_peak(sigma);
    if spike_times.iter().any(|c| !((c / sigma).abs() <= MAX_CELL_INDEX)) {
        return spike_times.len() as f64 * peak;
    }
    let denom = 2.0 * sigma * sigma;
    let reach = TAIL_CUTOFF * sigma;
    let tail = peak * (-0.5 * TAIL_CUTOFF * TAIL_CUTOFF).exp();

    let mut centers = spike_times.to_vec();
    centers.sort_by(|a, b| a.total_cmp(b));

    let mut cells: Vec<i64> = centers
        .iter()
        .flat_map(|c| {
            let k = (c / sigma).floor() as i64;
            k.saturating_sub(CELL_REACH)..=k.saturating_add(CELL_REACH)
        })
        .collect();
    cells.sort_unstable();
    cells.dedup();

    // Far away from every center, the sum is at most one tail value per center.
    let far_bound = centers.len() as f64 * tail;

    cells.into_iter().fold(far_bound, |bound, k| {
        let (start, end) = (k as f64 * sigma, (k + 1) as f64 * sigma);
        let lo = centers.partition_point(|c| *c < start - reach);
        let hi = centers.partition_point(|c| *c <= end + reach);
        let near = centers[lo..hi].iter().fold(0.0, |acc, c| {
            let d = (start - c).max(c - end).max(0.0);
            acc + peak * (-d * d / denom).exp()
        });
        bound.max(near + (centers.len() - (hi - lo)) as f64 * tail)
    })
}
