use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use simsweep::{CommandEngine, HarnessConfig, LogReport, init_logging};
use simsweep_core::{CancelToken, Harness, SweepController, Throttle};

#[derive(Parser, Debug)]
#[command(name = "simsweep")]
#[command(about = "Run parameter sweeps against an external simulation engine")]
struct Args {
    /// Path to the data directory (default: ~/.simsweep/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every point of a sweep, appending one row per run
    Run {
        /// Harness configuration file
        config: PathBuf,

        /// Results log path, overriding the config
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the countdown between runs
        #[arg(long)]
        no_pause: bool,
    },
    /// Print the parameter sets a sweep would run
    Plan {
        /// Harness configuration file
        config: PathBuf,
    },
    /// Summarise an existing results log
    Inspect {
        /// Results log file
        log: PathBuf,
    },
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".simsweep")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    let console = matches!(args.command, Command::Run { .. });

    init_logging(&data_dir, &args.log_level, console)?;

    match args.command {
        Command::Run {
            config,
            output,
            no_pause,
        } => run(&config, output, no_pause),
        Command::Plan { config } => plan(&config),
        Command::Inspect { log } => inspect(&log),
    }
}

fn run(config_path: &Path, output: Option<PathBuf>, no_pause: bool) -> color_eyre::Result<()> {
    let config = HarnessConfig::load(config_path).wrap_err("Failed to load harness config")?;
    let log_path = output.unwrap_or_else(|| config.output.clone());

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            eprintln!("Aborting");
            std::process::exit(130);
        }
        eprintln!("Stopping after the current run (Ctrl-C again to abort)");
        handler_token.cancel();
    })
    .wrap_err("Failed to install Ctrl-C handler")?;

    let mut controller = SweepController::new().with_cancel_token(cancel);
    if !no_pause && config.pause_seconds > 0 {
        controller = controller.with_throttle(Throttle::countdown(config.pause_seconds));
    }

    let mut harness = Harness::new(CommandEngine::new(config.engine)).with_controller(controller);
    let summary = harness
        .run(&config.sweep, &log_path)
        .wrap_err("Sweep aborted before the first run")?;

    println!(
        "{} runs, {} failed{}. Results in {}",
        summary.runs,
        summary.failures,
        if summary.cancelled { ", cancelled" } else { "" },
        log_path.display()
    );
    tracing::info!("Application shutting down");
    Ok(())
}

fn plan(config_path: &Path) -> color_eyre::Result<()> {
    let config = HarnessConfig::load(config_path).wrap_err("Failed to load harness config")?;
    let plan = config.sweep.plan()?;

    for name in config.sweep.parameter_names() {
        if !config.engine.parameters.iter().any(|p| p.name == name) {
            println!("warning: '{name}' is not a declared engine parameter");
        }
    }

    let total = plan.total_points();
    let width = total.to_string().len();
    for (i, point) in plan.points().enumerate() {
        println!("{:>width$} {:?} {}", i + 1, point.indices, point.params.describe());
    }
    println!("{total} runs, shape {:?}", plan.shape());
    Ok(())
}

fn inspect(log_path: &Path) -> color_eyre::Result<()> {
    let report = LogReport::load(log_path)
        .wrap_err_with(|| format!("Failed to read results log {}", log_path.display()))?;
    print!("{report}");
    Ok(())
}
