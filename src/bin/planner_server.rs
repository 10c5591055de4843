//! planner-server - serves a motion planner through the in-process broker
//!
//! The Robot, Obstacle and Problem objects are bound under the configured
//! naming context. SIGINT or SIGTERM stops the request loop.

use clap::Parser;
use log::{error, info, warn};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use planner_server::broker::LocalRuntime;
use planner_server::{DefaultServices, PlanningServer, ProblemSolver, ServerConfig, ServerResult};

#[derive(Parser)]
#[command(name = "planner-server")]
#[command(about = "Serve a motion planner to remote callers")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Steering method selected at startup
    #[arg(long, default_value = "linear")]
    steering: String,

    /// Distance function selected at startup
    #[arg(long, default_value = "linear")]
    distance: String,

    /// Poll for requests instead of blocking in the broker loop
    #[arg(long)]
    poll: bool,

    /// Arguments handed to the broker runtime
    #[arg(last = true)]
    broker_args: Vec<String>,
}

fn main() -> ServerResult<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    info!("planner-server v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        info!("Using config: {}", path);
    }

    let runtime = LocalRuntime::new(config.broker.queue_capacity);
    let planner = Arc::new(Mutex::new(ProblemSolver::new()));
    let mut server = PlanningServer::new(planner, config)?;
    if let Err(e) = server.launch(&runtime, &args.broker_args, &DefaultServices) {
        error!("planning server failed to start: {}", e);
        return Err(e);
    }

    let context = server.context();
    if !context.select_steering_method(&args.steering, false) {
        warn!("unknown steering method '{}', none selected", args.steering);
    }
    if !context.select_distance_function(&args.distance, false) {
        warn!("unknown distance function '{}', none selected", args.distance);
    }

    let running = Arc::new(AtomicBool::new(true));
    if let Some(handle) = server.shutdown_handle() {
        let running = Arc::clone(&running);
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    info!("Received signal {:?}, initiating shutdown...", sig);
                    running.store(false, Ordering::Relaxed);
                    handle.shutdown();
                }
            })?;
    }

    if args.poll {
        info!("polling for requests. Press Ctrl-C to stop.");
        while running.load(Ordering::Relaxed) {
            server.process_request(false)?;
            // Drain a backlog without pausing
            if !server.has_pending_requests() {
                thread::sleep(Duration::from_millis(10));
            }
        }
    } else {
        info!("serving requests. Press Ctrl-C to stop.");
        server.process_request(true)?;
    }

    server.shutdown();
    info!("planner-server stopped");
    Ok(())
}
