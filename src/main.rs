use log::info;
use serde_json::{json, Value};
use sparkfall::util::rgb_to_tint;
use sparkfall::{CallbackRegistry, ConfigError, Emitter, EmitterEvent, Rng};
use std::fs;

/// Command line options
struct Options {
    config: Option<String>,
    frames: u32,
    delta: f32,
    seed: u64,
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config: None,
        frames: 600,
        delta: 1000.0 / 60.0,
        seed: 0x5EED,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    if let Ok(n) = args[i + 1].parse::<u32>() {
                        options.frames = n;
                    }
                    i += 1;
                }
            },
            "--delta" | "-d" => {
                if i + 1 < args.len() {
                    if let Ok(ms) = args[i + 1].parse::<f32>() {
                        options.delta = ms;
                    }
                    i += 1;
                }
            },
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    if let Ok(seed) = args[i + 1].parse::<u64>() {
                        options.seed = seed;
                    }
                    i += 1;
                }
            },
            "--help" | "-h" => {
                println!("Usage: sparkfall [OPTIONS]");
                println!();
                println!("Runs an emitter headless and prints pool statistics.");
                println!();
                println!("Options:");
                println!("  --config FILE, -c FILE  Emitter configuration (JSON)");
                println!("  --frames N, -f N        Frames to simulate (default: 600)");
                println!("  --delta MS, -d MS       Frame time in ms (default: 16.67)");
                println!("  --seed N, -s N          Random seed");
                println!("  --help, -h              Show this help message");
                println!();
                println!("Set RUST_LOG=debug to see emitter lifecycle logging.");
                std::process::exit(0);
            },
            other => eprintln!("Ignoring unknown argument '{}'", other),
        }
        i += 1;
    }

    options
}

/// Tint for a hue in degrees at the given saturation and full brightness
fn hue_tint(hue: f32, saturation: f32) -> u32 {
    let sector = hue.rem_euclid(360.0) / 60.0;
    let chroma = saturation;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let floor = 1.0 - chroma;

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let channel = |c: f32| ((c + floor) * 255.0).round() as u8;
    rgb_to_tint((channel(r), channel(g), channel(b)))
}

/// Fountain used when no configuration file is given
fn builtin_config() -> Value {
    let tints: Vec<u32> = (0..6).map(|i| hue_tint(i as f32 * 60.0, 0.8)).collect();

    json!({
        "name": "fountain",
        "frequency": 20,
        "quantity": 2,
        "x": 400,
        "y": 500,
        "angle": {"min": 240, "max": 300},
        "speed": {"min": 200, "max": 350},
        "gravityY": 400,
        "lifespan": {"min": 1200, "max": 1800},
        "alpha": {"start": 1, "end": 0, "ease": "Quad.easeIn"},
        "scale": {"start": 1, "end": 0.2},
        "tint": tints,
        "maxParticles": 500,
        "bounds": {"x": 0, "y": 0, "width": 800, "height": 600},
        "bounce": 0.4,
        "deathZone": {"type": "onEnter", "source": {"type": "circle", "x": 400, "y": 150, "radius": 40}},
    })
}

fn main() -> Result<(), ConfigError> {
    env_logger::init();
    let options = parse_args();

    let registry = CallbackRegistry::new();
    let mut emitter = match &options.config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Emitter::from_json(&text, &registry)?
        },
        None => Emitter::from_config(&builtin_config(), &registry)?,
    }
    .with_rng(Rng::new(options.seed));

    info!(
        "simulating {} frames at {:.2}ms per frame",
        options.frames, options.delta
    );

    println!("=== sparkfall ===");
    println!("Emitter: '{}'", emitter.name);
    println!("{:>6} {:>8} {:>8} {:>8} {:>8}", "time", "alive", "dead", "total", "killed");

    let frames_per_second = (1000.0 / options.delta).round().max(1.0) as u32;
    let mut zone_kills = 0;
    let mut completed = false;

    for frame in 1..=options.frames {
        emitter.update(options.delta);

        for event in emitter.drain_events() {
            match event {
                EmitterEvent::DeathZone { .. } => zone_kills += 1,
                EmitterEvent::Complete => completed = true,
                other => info!("event: {}", other),
            }
        }

        if frame % frames_per_second == 0 || frame == options.frames {
            println!(
                "{:>5.1}s {:>8} {:>8} {:>8} {:>8}",
                frame as f32 * options.delta / 1000.0,
                emitter.alive_count(),
                emitter.dead_count(),
                emitter.particle_count(),
                zone_kills
            );
        }
    }

    if completed {
        println!("Emitter completed");
    }

    println!();
    println!("Final configuration:");
    let json = serde_json::to_string_pretty(&emitter.to_json())?;
    println!("{}", json);

    Ok(())
}
