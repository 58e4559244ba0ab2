//! Padded spike-train ensembles and the pattern containers built on top of them.
//!
//! A [`SpikeEnsemble`] stores one spike train per synapse as a row of fixed width. Unused trailing
//! slots hold the [`NO_SPIKE`] sentinel. Within a row, real spike times are sorted and precede all
//! sentinels.
use serde::{Deserialize, Serialize};

use crate::error::SeqError;

/// The sentinel marking an empty slot of a padded row.
pub const NO_SPIKE: f64 = f64::INFINITY;

/// The binary category of a pattern, either `+1` or `-1`.
pub type Label = i8;

/// A rectangular table of spike times, one row per synapse.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(into = "RaggedEnsemble", try_from = "RaggedEnsemble")]
pub struct SpikeEnsemble {
    width: usize,
    rows: Vec<Vec<f64>>,
}

/// Serialized form of an ensemble: only the real spike times are stored, so the sentinel never
/// reaches the serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaggedEnsemble {
    pub width: usize,
    pub spikes: Vec<Vec<f64>>,
}

impl From<SpikeEnsemble> for RaggedEnsemble {
    fn from(ensemble: SpikeEnsemble) -> Self {
        RaggedEnsemble {
            width: ensemble.width,
            spikes: ensemble.to_ragged(),
        }
    }
}

impl TryFrom<RaggedEnsemble> for SpikeEnsemble {
    type Error = SeqError;

    fn try_from(ragged: RaggedEnsemble) -> Result<Self, Self::Error> {
        SpikeEnsemble::from_rows_with_width(ragged.spikes, ragged.width)
    }
}

impl SpikeEnsemble {
    /// Create an ensemble from variable-length spike trains.
    /// Every train is sorted and padded to the length of the longest one (at least one slot).
    /// The function returns an error for non-finite spike times.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SeqError> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        Self::from_rows_with_width(rows, width)
    }

    /// Create an ensemble from variable-length spike trains, padded to the prescribed width.
    pub fn from_rows_with_width(rows: Vec<Vec<f64>>, width: usize) -> Result<Self, SeqError> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(k, mut row)| {
                if let Some(t) = row.iter().find(|t| !t.is_finite()) {
                    return Err(SeqError::InvalidSpikeTimes(format!(
                        "synapse {} has a non-finite spike time {}",
                        k, t
                    )));
                }
                if row.len() > width {
                    return Err(SeqError::InvalidSpikeTimes(format!(
                        "synapse {} has {} spikes, more than the width {}",
                        k,
                        row.len(),
                        width
                    )));
                }
                row.sort_by(|a, b| a.total_cmp(b));
                row.resize(width, NO_SPIKE);
                Ok(row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SpikeEnsemble { width, rows })
    }

    /// Create an ensemble from an already padded table.
    /// The function returns an error if the table is ragged or if a row violates the padding layout.
    pub fn from_padded(rows: Vec<Vec<f64>>) -> Result<Self, SeqError> {
        let width = rows.first().map_or(1, Vec::len);
        for (k, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SeqError::InvalidSpikeTimes(format!(
                    "row {} has {} slots instead of {}",
                    k,
                    row.len(),
                    width
                )));
            }
            if row.iter().any(|t| t.is_nan() || *t == f64::NEG_INFINITY) {
                return Err(SeqError::InvalidSpikeTimes(format!(
                    "row {} contains NaN or negative infinite values",
                    k
                )));
            }
            if row.windows(2).any(|w| w[0] > w[1]) {
                return Err(SeqError::InvalidSpikeTimes(format!(
                    "row {} is not sorted or has spikes after a padding slot",
                    k
                )));
            }
        }
        Ok(SpikeEnsemble { width, rows })
    }

    /// Create an ensemble of silent synapses, i.e., rows holding a single sentinel.
    pub fn silent(num_synapses: usize) -> Self {
        SpikeEnsemble {
            width: 1,
            rows: vec![vec![NO_SPIKE]; num_synapses],
        }
    }

    /// Stack ensembles vertically: the synapses of `parts[0]` come first, then those of `parts[1]`, etc.
    /// All rows are padded to the largest width.
    pub fn stack<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a SpikeEnsemble>,
    {
        let parts: Vec<&SpikeEnsemble> = parts.into_iter().collect();
        let width = parts.iter().map(|part| part.width).max().unwrap_or(1).max(1);
        let rows = parts
            .iter()
            .flat_map(|part| part.rows.iter())
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, NO_SPIKE);
                row
            })
            .collect();
        SpikeEnsemble { width, rows }
    }

    /// Returns the number of synapses, i.e., the number of rows.
    pub fn num_synapses(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of slots per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the padded rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Returns the real spike times of a synapse, if it exists.
    pub fn spikes(&self, synapse: usize) -> Option<&[f64]> {
        self.rows.get(synapse).map(|row| real_prefix(row))
    }

    /// Returns an iterator over the real spike times of every synapse.
    pub fn iter_spikes(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.rows.iter().map(|row| real_prefix(row))
    }

    /// Returns the total number of real spikes.
    pub fn num_spikes(&self) -> usize {
        self.iter_spikes().map(<[f64]>::len).sum()
    }

    /// Returns the real spike times of every synapse, without padding.
    pub fn to_ragged(&self) -> Vec<Vec<f64>> {
        self.iter_spikes().map(<[f64]>::to_vec).collect()
    }

    /// Returns a new ensemble (of the same width) where every real spike time is mapped by `f`,
    /// which receives the synapse index and the spike time. Rows are sorted again afterwards.
    pub fn map_spikes<F>(&self, f: F) -> Result<Self, SeqError>
    where
        F: Fn(usize, f64) -> f64,
    {
        let rows = self
            .iter_spikes()
            .enumerate()
            .map(|(k, spikes)| spikes.iter().map(|t| f(k, *t)).collect())
            .collect();
        Self::from_rows_with_width(rows, self.width)
    }
}

fn real_prefix(row: &[f64]) -> &[f64] {
    &row[..row.partition_point(|t| t.is_finite())]
}

/// The spike trains of all synapses for one pattern.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikePattern {
    pub excitatory: SpikeEnsemble,
    pub inhibitory: SpikeEnsemble,
}

/// The firing rates (per ms) of all synapses for one pattern.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RatePattern {
    pub excitatory: Vec<f64>,
    pub inhibitory: Vec<f64>,
}
