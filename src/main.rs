// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

use tyros_looper::midi::{print_destinations, print_sources, InputPort, MidiEvent, MidirOutput};
use tyros_looper::{Engine, Looper, LooperConfig, SharedOutput};

const DEFAULT_CONFIG_PATH: &str = "tyros-looper.yaml";

fn print_usage() {
    println!("tyros-looper - Live MIDI looper for the Yamaha Tyros");
    println!();
    println!("Usage: tyros-looper [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-midi                List available MIDI destinations (outputs)");
    println!("  --list-sources             List available MIDI sources (inputs)");
    println!("  --monitor <NAME>           Print decoded MIDI input from source NAME");
    println!("  --run [--config <PATH>]    Run the looper (default config: {})", DEFAULT_CONFIG_PATH);
    println!("  --write-config <PATH>      Write a default configuration file");
    println!("  --help                     Show this help message");
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn monitor_input(source: &str) -> Result<()> {
    let (tx, mut rx) = unbounded_channel();
    let _input = InputPort::open(source, tx).with_context(|| format!("Failed to open MIDI source '{}'", source))?;

    println!("Monitoring MIDI input '{}' (press Ctrl+C to stop)...", source);
    println!();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(raw) => println!("{:>12} {:?}", raw.timestamp_micros, MidiEvent::parse(&raw.bytes)),
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }

    println!();
    println!("Monitor complete!");
    Ok(())
}

async fn run_looper(config_path: &str) -> Result<()> {
    let config = LooperConfig::load(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    init_logging(&config.log_level);
    tracing::info!(
        input = %config.input_port,
        output = %config.output_port,
        channel = config.monitored_channel,
        quarter_notes = config.quarter_notes_per_sequence,
        "starting looper"
    );

    let output = MidirOutput::open(&config.output_port)
        .with_context(|| format!("Failed to open MIDI destination '{}'", config.output_port))?;
    let output: SharedOutput = Arc::new(Mutex::new(output));

    let (tx, rx) = unbounded_channel();
    let _input = InputPort::open(&config.input_port, tx)
        .with_context(|| format!("Failed to open MIDI source '{}'", config.input_port))?;

    let engine = Engine::new(Looper::new(&config), output);
    engine.run(rx, shutdown_signal()).await;

    tracing::info!("looper stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("tyros-looper - Live MIDI looper for the Yamaha Tyros");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-midi" => {
            print_destinations()?;
        }
        "--list-sources" => {
            print_sources()?;
        }
        "--monitor" => {
            if args.len() < 3 {
                eprintln!("Error: --monitor requires a source name");
                eprintln!("Use --list-sources to see available sources");
                std::process::exit(1);
            }
            init_logging("info");
            monitor_input(&args[2]).await?;
        }
        "--run" => {
            let config_path = match args.get(2).map(String::as_str) {
                Some("--config") => match args.get(3) {
                    Some(path) => path.as_str(),
                    None => {
                        eprintln!("Error: --config requires a path");
                        std::process::exit(1);
                    }
                },
                Some(other) => {
                    eprintln!("Unknown option: {}", other);
                    print_usage();
                    std::process::exit(1);
                }
                None => DEFAULT_CONFIG_PATH,
            };
            run_looper(config_path).await?;
        }
        "--write-config" => {
            if args.len() < 3 {
                eprintln!("Error: --write-config requires a path");
                std::process::exit(1);
            }
            LooperConfig::default().save(&args[2])?;
            println!("Wrote default configuration to {}", args[2]);
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
