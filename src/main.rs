//! VarunaMission binary: wire the collaborators and run the pool patrol.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{info, warn};

use varuna_mission::clients::{mode_channel, nav_channel, ThrustSink};
use varuna_mission::runner::{run_mission, spawn_feed_threads};
use varuna_mission::sim::SimVehicle;
use varuna_mission::types::Wrench;
use varuna_mission::{CancelToken, Collaborators, FeedSet, MissionConfig, Result};

#[derive(Parser, Debug)]
#[command(name = "varuna-mission", about = "Pool-patrol mission controller")]
struct Args {
    /// Path to the mission config TOML
    #[arg(long, default_value = "mission.toml")]
    config: PathBuf,

    /// Run against the built-in scripted vehicle simulation
    #[arg(long)]
    sim: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("varuna_mission=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        info!("Loading configuration from {:?}", args.config);
        MissionConfig::load(&args.config)?
    } else {
        info!("Config {:?} not found, using defaults", args.config);
        MissionConfig::default()
    };

    info!("VarunaMission v{}", env!("CARGO_PKG_VERSION"));

    // Cancellation: SIGINT/SIGTERM preempt the mission between ticks
    let cancel = CancelToken::new();
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let signal_cancel = cancel.clone();
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if signals.forever().next().is_some() {
                warn!("Interrupt received, preempting mission");
                signal_cancel.cancel();
            }
        })
        .expect("Failed to spawn signal thread");

    // Collaborator channels
    let server_wait = Duration::from_secs_f32(config.navigation.server_wait_secs);
    let exec_timeout = Duration::from_secs_f32(config.navigation.exec_timeout_secs);
    let (nav_client, nav_endpoint) = nav_channel(server_wait, exec_timeout);
    let (mode_client, mode_rx) = mode_channel();
    let (thrust_tx, thrust_rx) = bounded::<Wrench>(16);

    // Feed slots and adapters
    let feeds = FeedSet::new();
    let (perception_tx, perception_rx) = unbounded();
    let (pose_tx, pose_rx) = unbounded();
    let feed_handles = spawn_feed_threads(
        Arc::clone(&feeds),
        perception_rx,
        pose_rx,
        cancel.clone(),
    );

    let sim_handle = if args.sim {
        Some(SimVehicle::spawn(
            config.sim,
            perception_tx,
            pose_tx,
            nav_endpoint,
            mode_rx,
            thrust_rx,
            cancel.clone(),
        ))
    } else {
        warn!("No vehicle bridge configured; navigation goals will time out (try --sim)");
        None
    };

    let thrust: Arc<dyn ThrustSink> = Arc::new(thrust_tx);
    let collab = Collaborators {
        feeds,
        nav: Arc::new(nav_client),
        mode: Arc::new(mode_client),
        thrust: Arc::clone(&thrust),
    };

    // The mission runs on the main thread
    let result = run_mission(&config, collab, cancel.clone());

    match &result {
        Ok(outcome) => info!("Mission terminal outcome: {}", outcome),
        Err(e) => tracing::error!("Mission failed: {}", e),
    }

    // Grace period after an external interrupt: hold zero thrust while the
    // vehicle coasts to rest
    let interrupted = cancel.is_cancelled();
    thrust.publish(&Wrench::ZERO);
    if interrupted {
        let grace = Duration::from_secs_f32(config.runner.grace_period_secs);
        info!("Stopping the AUV, holding {:?} grace period...", grace);
        std::thread::sleep(grace);
    }

    cancel.cancel();
    for handle in feed_handles {
        let _ = handle.join();
    }
    if let Some(handle) = sim_handle {
        let _ = handle.join();
    }

    result.map(|_| ())
}
