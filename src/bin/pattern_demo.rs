use std::env;
use std::path::Path;

use track_hough::config::{self, RuntimeConfig, SyntheticEventConfig};
use track_hough::{EventHits, Hit, PatternFinder, Technology};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = match env::args().nth(1) {
        Some(path) => config::load_config(Path::new(&path))?,
        None => RuntimeConfig::default(),
    };

    let event = synthesize_event(&config.event);
    println!(
        "event: {} hits ({} transverse, {} drift-tube)",
        event.len(),
        event.transverse_count(),
        event.drift_tube_count()
    );

    let finder = PatternFinder::new(config.finder_params.clone());
    let report = finder.run(&event);

    println!(
        "patterns: phi={} eta={} curved={} latency_ms={:.3}",
        report.patterns.phi.len(),
        report.patterns.eta.len(),
        report.patterns.curved.len(),
        report.latency_ms,
    );
    for (i, pattern) in report.patterns.phi.iter().enumerate() {
        println!(
            "  phi[{i}]: {} hits, dir=({:.3}, {:.3}, {:.3})",
            pattern.hits.len(),
            pattern.direction[0],
            pattern.direction[1],
            pattern.direction[2],
        );
    }

    if let Some(path) = &config.output.report_out {
        config::write_json_file(path, &report)?;
        println!("report written to {}", path.display());
    }
    Ok(())
}

/// Deterministic synthetic event: hit ladders along the configured track
/// directions plus an isolated-hit fan standing in for uncorrelated noise.
fn synthesize_event(config: &SyntheticEventConfig) -> EventHits {
    let mut event = EventHits::new();
    for &(phi, theta) in &config.tracks {
        for i in 0..config.hits_per_track {
            let t = 4000.0 + 900.0 * i as f64;
            let position = [
                t * theta.sin() * phi.cos(),
                t * theta.sin() * phi.sin(),
                t * theta.cos(),
            ];
            // alternate the measurement class along the ladder so both the
            // transverse and longitudinal projections see the track
            let (technology, transverse) = if i % 2 == 0 {
                (Technology::StripTrigger, true)
            } else {
                (Technology::DriftTube, false)
            };
            event.add_hit(Hit::new(position, technology, transverse, 0.95));
        }
    }
    for i in 0..config.noise_hits {
        let phi = 0.37 + 2.11 * i as f64;
        let radius = 3500.0 + 650.0 * i as f64;
        event.add_hit(Hit::new(
            [radius * phi.cos(), radius * phi.sin(), 1500.0 - 250.0 * i as f64],
            if i % 3 == 0 {
                Technology::DriftTube
            } else {
                Technology::PadTrigger
            },
            i % 2 == 0,
            0.5,
        ));
    }
    event
}
