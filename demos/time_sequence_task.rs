//! Builds a time sequence discrimination task and samples one spike pattern per feature order.
//!
//! Run with `RUST_LOG=info` to see the summary of every pattern.
use presyn_seqs::config::{StimulusWindow, TaskConfig};
use presyn_seqs::error::SeqError;
use presyn_seqs::patterns::{assign_labels, assoc_rates_time_sequence, assoc_seqs_time_sequence};
use presyn_seqs::sampler::nhpp::PreSyn;

const STIM_ON: f64 = 100.0;

fn main() -> Result<(), SeqError> {
    env_logger::init();

    let config = TaskConfig {
        seed: Some(42),
        ..TaskConfig::default()
    };
    config.validate()?;
    log::info!("Task configuration: {}", config.to_json()?);
    let mut rng = config.rng();

    // Features are presented one after the other, delta_t apart
    let stim_off = STIM_ON
        + (config.t - config.t0)
        + config.delta_t * config.num_features.saturating_sub(1) as f64;
    let window = StimulusWindow::new(0.0, stim_off + 200.0, STIM_ON, stim_off);

    let rates = assoc_rates_time_sequence(
        config.num_features,
        config.num_excitatory,
        config.num_inhibitory,
        config.r_mean,
        config.r_max,
        &mut rng,
    )?;
    let times = assoc_seqs_time_sequence(
        config.num_features,
        config.num_excitatory,
        config.num_inhibitory,
        STIM_ON + config.t0,
        STIM_ON + config.t,
        config.events_per_synapse,
        config.delta_t,
        &mut rng,
    )?;
    let labels = assign_labels(times.len(), &mut rng);
    log::info!("Pattern generation: done! {} patterns", times.len());

    let presyn = PreSyn::build(5.0, 2.0)?;
    for s in [0.0, 0.5, 1.0] {
        let patterns = presyn.sample_patterns(&window, s, &rates, Some(times.as_slice()), 42)?;
        for (k, (pattern, label)) in patterns.iter().zip(labels.iter()).enumerate() {
            log::info!(
                "s={}, pattern {} (label {:+}): {} excitatory and {} inhibitory spikes",
                s,
                k,
                label,
                pattern.excitatory.num_spikes(),
                pattern.inhibitory.num_spikes()
            );
        }
    }
    Ok(())
}
