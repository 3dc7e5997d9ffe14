// evlayer CLI
// Grabs one keyboard device and replays it through the layer remapper

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use evlayer_core::config::Config;
use evlayer_core::event::DEFAULT_POLL_TIMEOUT_MS;
use evlayer_core::{DeviceSource, EventRunner, RemapEngine, RemapTable, VirtualSink};

/// Layered key remapper for evdev keyboards
#[derive(Parser, Debug)]
#[command(name = "evlayer")]
#[command(version)]
#[command(about = "Layered key remapper for evdev keyboards", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Input device to grab (overrides [general].device)
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config, print the remap table and exit
    #[arg(long)]
    check_config: bool,

    /// Print the effective remap table and exit
    #[arg(long)]
    dump_table: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::from_toml_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Config::load_default().context("failed to load default config"),
    }
}

/// `--device` wins over the config file
fn resolve_device(args: &Args, config: &Config) -> Option<PathBuf> {
    args.device.clone().or_else(|| config.device.clone())
}

fn spawn_signal_handler(running: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handler")?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log::info!("Received signal {}, shutting down", signal);
            running.store(false, Ordering::SeqCst);
        }
    });
    Ok(())
}

fn print_table(table: &RemapTable) {
    print!("{}", table);
}

fn run(args: Args, config: Config) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let table = config.remap_table(&running);

    let Some(device_path) = resolve_device(&args, &config) else {
        bail!("no input device given, use --device or set [general].device");
    };

    spawn_signal_handler(running.clone())?;

    let source = DeviceSource::open(&device_path)
        .with_context(|| format!("failed to open {}", device_path.display()))?;
    let sink = VirtualSink::new().context("failed to create virtual keyboard")?;

    log::info!(
        "Remapping {} ({}), {} root bindings",
        source.name(),
        device_path.display(),
        table.len()
    );

    let mut runner = EventRunner::new(RemapEngine::new(table), source, sink, running)
        .with_poll_timeout(config.poll_timeout_ms.unwrap_or(DEFAULT_POLL_TIMEOUT_MS));
    runner.run()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    if let Some(path) = &config.source_path {
        log::debug!("Using config {}", path.display());
    }

    if args.check_config || args.dump_table {
        let table = config.remap_table(&Arc::new(AtomicBool::new(true)));
        if args.check_config {
            println!("Configuration is valid");
        }
        print_table(&table);
        return Ok(());
    }

    run(args, config)
}
