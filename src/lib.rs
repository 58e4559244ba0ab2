//! This crate provides tools for generating presynaptic spike trains, ranging from pure rate codes to
//! precisely timed (temporal) codes, as inputs for spiking neuron models.
//!
//! # Building Patterns
//!
//! Patterns are described either by firing rates or by precise spike times. Rates are given in Hz and
//! returned per ms.
//!
//! ```rust
//! use presyn_seqs::patterns::{build_seqs, sparse_rates};
//! use presyn_seqs::rng;
//!
//! let mut rng = rng::seeded(42);
//! let rates = sparse_rates(4, 100, 20, 5.0, 50.0, &mut rng).unwrap();
//! let times = build_seqs(4, 100, 20, 0.0, 100.0, 1, &mut rng).unwrap();
//!
//! assert_eq!(rates.len(), 4);
//! assert_eq!(times[0].excitatory.num_synapses(), 100);
//! ```
//!
//! # Sampling Spike Trains
//!
//! A [`sampler::nhpp::PreSyn`] mixes both codes: with `s = 0`, synapses fire at their stimulus rate,
//! with `s = 1`, they fire around their precise spike times.
//!
//! ```rust
//! use presyn_seqs::config::StimulusWindow;
//! use presyn_seqs::patterns::{build_seqs, sparse_rates};
//! use presyn_seqs::rng;
//! use presyn_seqs::sampler::nhpp::PreSyn;
//!
//! let mut rng = rng::seeded(42);
//! let rates = sparse_rates(2, 50, 10, 5.0, 50.0, &mut rng).unwrap();
//! let times = build_seqs(2, 50, 10, 100.0, 200.0, 1, &mut rng).unwrap();
//!
//! let presyn = PreSyn::build(5.0, 2.0).unwrap();
//! let window = StimulusWindow::new(0.0, 500.0, 100.0, 200.0);
//! let patterns = presyn.sample_patterns(&window, 0.5, &rates, Some(times.as_slice()), 42).unwrap();
//!
//! assert_eq!(patterns.len(), 2);
//! assert_eq!(patterns[1].inhibitory.num_synapses(), 10);
//! ```
//!
//! # Transforming Spike Trains
//!
//! ```rust
//! use presyn_seqs::ensemble::SpikeEnsemble;
//! use presyn_seqs::transform::{compress_stim, translate};
//!
//! let ensemble = SpikeEnsemble::from_rows(vec![vec![10.0, 90.0], vec![]]).unwrap();
//! let shifted = translate(&ensemble, 20.0, 0.0, 100.0).unwrap();
//! let compressed = compress_stim(&shifted, 0.5, 0.0).unwrap();
//!
//! assert_eq!(shifted.spikes(0), Some(&[70.0, 90.0][..]));
//! assert_eq!(compressed.spikes(0), Some(&[35.0, 45.0][..]));
//! ```

pub mod config;
pub mod ensemble;
pub mod error;
pub mod kernel;
pub mod patterns;
pub mod rng;
pub mod sampler;
pub mod transform;
