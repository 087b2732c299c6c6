//! Smart-home simulator entry point: CLI wiring, config loading, and the
//! tick loop.

use std::path::{Path, PathBuf};
use std::process;

use log::info;

use smarthome_sim::config::AppConfig;
use smarthome_sim::io::export::export_csv;
use smarthome_sim::io::persist::JsonFile;
use smarthome_sim::runner::Runner;
use smarthome_sim::sim::clock::{SystemClock, Ticker};
use smarthome_sim::sim::report::EnergyReport;
use smarthome_sim::store::Store;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    state_path: Option<String>,
    ticks: Option<u64>,
    energy_out: Option<String>,
    reset: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: Option<u16>,
}

fn print_help() {
    eprintln!("smarthome-sim: smart-home device, energy, and routine simulator");
    eprintln!();
    eprintln!("Usage: smarthome-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load settings from a TOML file");
    eprintln!("  --state <path>           Snapshot file (overrides storage.path)");
    eprintln!("  --ticks <u64>            Stop after this many ticks");
    eprintln!("  --energy-out <path>      Export per-device energy to CSV at exit");
    eprintln!("  --reset                  Delete all users and home data, then exit");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Serve the REST API while ticking");
        eprintln!("  --port <u16>             API server port (overrides api.port)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Without --ticks the simulator runs until interrupted.");
}

/// Returns the value following a flag, or exits with a usage error.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        state_path: None,
        ticks: None,
        energy_out: None,
        reset: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                cli.config_path = Some(flag_value(&args, i, "--config", "path"));
            }
            "--state" => {
                i += 1;
                cli.state_path = Some(flag_value(&args, i, "--state", "path"));
            }
            "--ticks" => {
                i += 1;
                let raw = flag_value(&args, i, "--ticks", "u64");
                if let Ok(n) = raw.parse::<u64>() {
                    cli.ticks = Some(n);
                } else {
                    eprintln!("error: --ticks value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--energy-out" => {
                i += 1;
                cli.energy_out = Some(flag_value(&args, i, "--energy-out", "path"));
            }
            "--reset" => {
                cli.reset = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = Some(p);
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(cli: &CliArgs) -> AppConfig {
    let config = match cli.config_path {
        Some(ref path) => match AppConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn main() {
    env_logger::init();
    let cli = parse_args();
    let config = load_config(&cli);

    let state_path = cli
        .state_path
        .as_ref()
        .map_or_else(|| config.storage.path.clone(), PathBuf::from);
    info!(
        "state file {}, tick every {} ms, alert after {} h",
        state_path.display(),
        config.simulation.tick_interval_ms,
        config.simulation.alert_threshold_hours
    );

    if cli.reset {
        Store::open(JsonFile::new(&state_path), config.sim_config()).reset_all();
        eprintln!("All data reset at {}", state_path.display());
        return;
    }

    #[cfg(feature = "api")]
    if cli.serve {
        serve(&config, cli.port.unwrap_or(config.api.port), state_path);
        return;
    }

    let store = Store::open(JsonFile::new(state_path), config.sim_config());
    let mut runner = Runner::new(SystemClock, store);
    let mut ticker = cli.ticks.map_or_else(Ticker::unbounded, Ticker::bounded);
    runner.run(&mut ticker);

    let report = EnergyReport::from_state(runner.store().state());
    println!("{report}");

    if let Some(ref path) = cli.energy_out {
        if let Err(e) = export_csv(&report, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Energy table written to {path}");
    }
}

#[cfg(feature = "api")]
fn serve(config: &AppConfig, port: u16, state_path: PathBuf) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use smarthome_sim::api::{AppState, SharedStore};
    use smarthome_sim::io::persist::Persistence;

    let persistence: Box<dyn Persistence + Send> = Box::new(JsonFile::new(state_path));
    let store: SharedStore = Store::open(persistence, config.sim_config());
    let state = AppState::new(store, Arc::new(SystemClock));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(smarthome_sim::api::serve(state, addr)) {
        eprintln!("error: server stopped: {e}");
        process::exit(1);
    }
}
