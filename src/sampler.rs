//! Module for sampling presynaptic spike trains.
//!
//! This module provides three Poisson generators:
//! - [`nhpp`]: non-homogeneous Poisson trains mixing a rate code and a temporal code, by rejection sampling
//! - [`stationary`]: homogeneous Poisson trains from exponential inter-arrival times
//! - [`modulated`]: Poisson trains with a sinusoidally modulated firing rate
//!
//! # Example
//!
//! ```rust
//! use presyn_seqs::config::StimulusWindow;
//! use presyn_seqs::rng;
//! use presyn_seqs::sampler::nhpp::PreSyn;
//!
//! let mut rng = rng::seeded(42);
//! let presyn = PreSyn::build(5.0, 2.0).unwrap();
//! let window = StimulusWindow::new(0.0, 500.0, 100.0, 300.0);
//!
//! // Half rate code, half temporal code, with bumps at 150 ms and 250 ms
//! let train = presyn.spike_train(&window, 0.5, 0.02, &[150.0, 250.0], &mut rng).unwrap();
//! assert!(train.windows(2).all(|w| w[0] <= w[1]));
//! ```
pub mod modulated;
pub mod nhpp;
pub mod stationary;
