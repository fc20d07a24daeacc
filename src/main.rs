use clap::Parser;
use darwin_world::config::Config;
use darwin_world::server::{
    self,
    state_stream::{EngineStream, StateStream, WatchObserver},
};
use darwin_world::simulation::control::{EngineHandle, RunOptions};
use darwin_world::simulation::observer::{Fanout, LogObserver};
use darwin_world::simulation::SimulationEngine;
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "darwin-world")]
#[command(about = "Evolution simulator of animals grazing a jungle and a steppe", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[arg(long)]
    no_server: bool,

    /// Overrides `simulation.seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides `simulation.max_days`
    #[arg(long)]
    days: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = if std::path::Path::new(&args.config).exists() {
        log::info!("Loading config from: {}", args.config);
        Config::load_validated(&args.config)?
    } else {
        log::info!("Config file not found, using defaults and saving to: {}", args.config);
        let config = Config::default();
        config.save_to_file(&args.config)?;
        config
    };
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if args.days.is_some() {
        config.simulation.max_days = args.days;
    }
    config.validate()?;

    log::info!("Initializing {} simulation(s)...", config.world.maps.len());
    let options = RunOptions {
        tick_delay: Duration::from_millis(config.simulation.tick_delay_ms),
        max_days: config.simulation.max_days,
    };

    let mut handles = Vec::new();
    let mut streams = Vec::new();
    for (index, &boundary) in config.world.maps.iter().enumerate() {
        let seed = config.simulation.seed.map(|seed| seed.wrapping_add(index as u64));
        let engine = SimulationEngine::new(&config, boundary, seed);

        let (watch, snapshots) = WatchObserver::new(engine.snapshot());
        let observer = Fanout::new()
            .with(LogObserver::new(config.simulation.log_interval_days))
            .with(watch);

        let handle = EngineHandle::spawn(engine, observer, options)?;
        streams.push(EngineStream::new(handle.control(), snapshots));
        handles.push(handle);
    }

    let serve = !args.no_server && config.server.enabled;
    if config.simulation.autostart || !serve {
        for handle in &handles {
            handle.start()?;
        }
    }

    if serve {
        let server_config = config.clone();
        let stream = StateStream::new(streams);
        tokio::spawn(async move {
            if let Err(e) = server::run_server(server_config, stream).await {
                log::error!("Server error: {}", e);
            }
        });
        log::info!("WebSocket server started on {}:{}", config.server.address, config.server.port);
    }

    wait_for_engines(handles).await;

    Ok(())
}

async fn wait_for_engines(handles: Vec<EngineHandle>) {
    let controls: Vec<_> = handles.iter().map(EngineHandle::control).collect();
    let join_all = tokio::task::spawn_blocking(move || {
        for handle in handles {
            match handle.join() {
                Ok(engine) => log::info!(
                    "{} simulation finished after {} days",
                    engine.boundary(),
                    engine.day()
                ),
                Err(_) => log::error!("Simulation worker panicked"),
            }
        }
    });
    tokio::pin!(join_all);

    tokio::select! {
        _ = &mut join_all => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, terminating simulations");
            for control in &controls {
                control.request_termination();
            }
            let _ = join_all.await;
        }
    }
}
