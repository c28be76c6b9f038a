use anyhow::Context;
use dispatch_engine::{DetectionSimulator, DispatchEngine, DispatchError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::DispatchConfig;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    shared::logger::init_logger();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DispatchConfig::load(config_path.as_deref())
        .context("loading dispatch configuration")?;

    let engine = DispatchEngine::from_config(&config).context("building dispatch engine")?;

    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let simulator = DetectionSimulator::new(config.simulation.clone());
    let detected = simulator.simulate_round(&engine, &mut rng)?;
    info!(detections = detected.len(), "Detections registered");

    let mut dispatched = 0usize;
    let mut unreachable = Vec::new();
    loop {
        match engine.dispatch_next() {
            Ok(_) => dispatched += 1,
            Err(DispatchError::Empty) => break,
            Err(DispatchError::NoRouteAvailable(id)) => unreachable.push(id),
            Err(err) => return Err(err.into()),
        }
    }

    for (location, incidents) in engine.report_by_location() {
        let ids: Vec<String> = incidents.iter().map(|incident| incident.id.to_string()).collect();
        info!(location = %location, incidents = %ids.join(","), "Location summary");
    }

    let stats = engine.classifier().stats();
    info!(
        dispatched,
        unreachable = unreachable.len(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "Simulation finished"
    );
    if !unreachable.is_empty() {
        warn!(incidents = ?unreachable, "Some incidents could not be reached from any base");
    }

    Ok(())
}
