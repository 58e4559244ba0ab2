//! Parameter structures shared by the generators and the task builders.
//!
//! Every structure (de)serializes with serde, so a complete stimulus description can be stored as
//! JSON next to the simulation results and replayed later.
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::SeqError;
use crate::rng;

/// The background and stimulus windows of a non-homogeneous Poisson rate function (in ms).
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct StimulusWindow {
    /// Onset of the background activity.
    pub t_on: f64,
    /// Offset of the background activity.
    pub t_off: f64,
    /// Onset of the stimulus-dependent activity.
    pub stim_on: f64,
    /// Offset of the stimulus-dependent activity.
    pub stim_off: f64,
}

impl StimulusWindow {
    pub fn new(t_on: f64, t_off: f64, stim_on: f64, stim_off: f64) -> Self {
        StimulusWindow {
            t_on,
            t_off,
            stim_on,
            stim_off,
        }
    }

    /// Returns an error if a bound is not finite or if a window is reversed.
    pub fn validate(&self) -> Result<(), SeqError> {
        if [self.t_on, self.t_off, self.stim_on, self.stim_off]
            .iter()
            .any(|t| !t.is_finite())
        {
            return Err(SeqError::InvalidParameter(
                "window bounds must be finite".to_string(),
            ));
        }
        if self.t_on > self.t_off {
            return Err(SeqError::InvalidParameter(format!(
                "background window is reversed: t_on={} > t_off={}",
                self.t_on, self.t_off
            )));
        }
        if self.stim_on > self.stim_off {
            return Err(SeqError::InvalidParameter(format!(
                "stimulus window is reversed: stim_on={} > stim_off={}",
                self.stim_on, self.stim_off
            )));
        }
        Ok(())
    }

    /// Returns the end of the sampling horizon, leaving 200 ms after the stimulus offset.
    pub fn horizon(&self) -> f64 {
        self.t_off.max(self.stim_off + 200.0)
    }
}

/// The synapses whose firing rate is modulated.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub enum Modulated {
    #[default]
    All,
    Subset(Vec<usize>),
}

impl Modulated {
    pub fn contains(&self, synapse: usize) -> bool {
        match self {
            Modulated::All => true,
            Modulated::Subset(synapses) => synapses.contains(&synapse),
        }
    }
}

/// Parameters of the sinusoidal rate modulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulationConfig {
    /// Modulation frequency (Hz). Zero means stationary rates.
    pub mod_freq: f64,
    /// The modulated synapses.
    pub modulated: Modulated,
    /// Width of the windows over which the rate is held constant (ms).
    pub t_win: f64,
    /// Amplitude factor applied to the rate of modulated synapses.
    pub mod_amp: f64,
}

impl Default for ModulationConfig {
    fn default() -> Self {
        ModulationConfig {
            mod_freq: 0.0,
            modulated: Modulated::All,
            t_win: 10.0,
            mod_amp: 2.5,
        }
    }
}

impl ModulationConfig {
    pub fn validate(&self) -> Result<(), SeqError> {
        if !(self.mod_freq >= 0.0 && self.mod_freq.is_finite()) {
            return Err(SeqError::InvalidParameter(format!(
                "modulation frequency must be non-negative, got {}",
                self.mod_freq
            )));
        }
        if !(self.t_win > 0.0 && self.t_win.is_finite()) {
            return Err(SeqError::InvalidParameter(format!(
                "rate window must be positive, got {}",
                self.t_win
            )));
        }
        if !(self.mod_amp >= 0.0 && self.mod_amp.is_finite()) {
            return Err(SeqError::InvalidParameter(format!(
                "modulation amplitude must be non-negative, got {}",
                self.mod_amp
            )));
        }
        Ok(())
    }
}

/// A complete description of a stimulus ensemble.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Number of excitatory synapses.
    pub num_excitatory: usize,
    /// Number of inhibitory synapses.
    pub num_inhibitory: usize,
    /// Number of features (or patterns, depending on the task).
    pub num_features: usize,
    /// Start of the event window (ms).
    pub t0: f64,
    /// End of the event window (ms).
    pub t: f64,
    /// Number of precisely timed events per synapse.
    pub events_per_synapse: usize,
    /// Time between consecutive features of a time sequence (ms).
    pub delta_t: f64,
    /// Ensemble average rate (Hz).
    pub r_mean: f64,
    /// Rate of active synapses (Hz).
    pub r_max: f64,
    /// Seed of the random number generator. A fresh seed is drawn if absent.
    pub seed: Option<u64>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            num_excitatory: 1000,
            num_inhibitory: 200,
            num_features: 3,
            t0: 0.0,
            t: 100.0,
            events_per_synapse: 1,
            delta_t: 20.0,
            r_mean: 5.0,
            r_max: 50.0,
            seed: None,
        }
    }
}

impl TaskConfig {
    /// Parse a configuration from a JSON string. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, SeqError> {
        let config: TaskConfig = serde_json::from_str(json)
            .map_err(|e| SeqError::InvalidParameter(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, SeqError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SeqError::InvalidParameter(format!("cannot serialize configuration: {}", e)))
    }

    pub fn validate(&self) -> Result<(), SeqError> {
        if self.num_features == 0 {
            return Err(SeqError::InvalidParameter(
                "the number of features must be positive".to_string(),
            ));
        }
        if !(self.t0 <= self.t) {
            return Err(SeqError::InvalidParameter(format!(
                "event window is reversed: t0={} > t={}",
                self.t0, self.t
            )));
        }
        if !(0.0 <= self.r_mean && self.r_mean <= self.r_max) {
            return Err(SeqError::InvalidParameter(format!(
                "rates must satisfy 0 <= r_mean <= r_max, got r_mean={} and r_max={}",
                self.r_mean, self.r_max
            )));
        }
        Ok(())
    }

    /// Returns the generator for this configuration. If no seed is configured, a fresh one is drawn
    /// and logged so that the run can be replayed.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => rng::seeded(seed),
            None => rng::seeded(rng::fresh_seed()),
        }
    }
}
