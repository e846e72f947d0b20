//! vcb-convert - batch voice conversion
//!
//! Converts every audio file in an input directory to one preset speaker's
//! voice. The conversion model is loaded once per run by an external worker
//! process.
//!
//! Exit status: 0 when every job succeeded, 1 when any job failed or was
//! skipped, 2 when the run could not start.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use vcb_common::config::{load_toml_config, ConfigLocator};
use vcb_common::logging::init_logging;
use vcb_convert::config::{ConversionOverrides, FileConfig, SettingsLayer};
use vcb_convert::engine::WorkerLoader;
use vcb_convert::events::BatchEvent;
use vcb_convert::presets::PresetCatalog;
use vcb_convert::scanner::FileScanner;
use vcb_convert::{plan_jobs, BatchConfig, BatchReport, BatchRunner, FailurePolicy};

/// Command-line arguments for vcb-convert
#[derive(Parser, Debug)]
#[command(name = "vcb-convert")]
#[command(about = "Batch voice conversion to a preset speaker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every audio file in the input directory
    Run(RunArgs),
    /// Print the job sequence as JSON without loading the engine
    Plan(BatchArgs),
    /// List the available speaker presets
    Speakers,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    batch: BatchArgs,

    /// Write the batch report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print progress events to stdout as JSON lines
    #[arg(long)]
    json_events: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target speaker preset
    #[arg(short, long, env = "VCB_SPEAKER")]
    speaker: Option<String>,

    /// Directory of source recordings
    #[arg(short, long, env = "VCB_INPUT_DIR")]
    input: PathBuf,

    /// Directory for converted files (created if missing)
    #[arg(short, long, env = "VCB_OUTPUT_DIR")]
    output: PathBuf,

    /// Directory holding the preset reference samples
    #[arg(long, env = "VCB_REFERENCE_ROOT")]
    reference_root: Option<PathBuf>,

    /// What to do with remaining jobs after a failure
    #[arg(long, value_enum)]
    policy: Option<FailurePolicy>,

    #[arg(long)]
    diffusion_steps: Option<u32>,

    #[arg(long)]
    length_adjust: Option<f32>,

    #[arg(long)]
    inference_cfg_rate: Option<f32>,

    #[arg(long)]
    n_quantizers: Option<u32>,

    #[arg(long)]
    f0_condition: Option<bool>,

    /// Override the preset's automatic pitch adjustment
    #[arg(long)]
    auto_f0_adjust: Option<bool>,

    /// Override the preset's semitone shift
    #[arg(long, allow_hyphen_values = true)]
    semi_tone_shift: Option<i32>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, env = "VCB_LOG_LEVEL")]
    log_level: Option<String>,
}

impl BatchArgs {
    fn settings(&self) -> SettingsLayer {
        SettingsLayer {
            speaker: self.speaker.clone(),
            reference_root: self.reference_root.clone(),
            failure_policy: self.policy,
            conversion: ConversionOverrides {
                diffusion_steps: self.diffusion_steps,
                length_adjust: self.length_adjust,
                inference_cfg_rate: self.inference_cfg_rate,
                n_quantizers: self.n_quantizers,
                f0_condition: self.f0_condition,
                auto_f0_adjust: self.auto_f0_adjust,
                semi_tone_shift: self.semi_tone_shift,
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Plan(args) => plan(args).map(|()| ExitCode::SUCCESS),
        Command::Speakers => {
            list_speakers();
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        ExitCode::from(2)
    })
}

/// Load the config file and start logging
fn bootstrap(args: &BatchArgs) -> Result<(FileConfig, BatchConfig)> {
    let config_path = ConfigLocator::new("vcb-convert")
        .locate(args.config.as_deref())
        .context("Failed to locate config file")?;
    let file: FileConfig =
        load_toml_config(config_path.as_deref()).context("Failed to load config file")?;

    let level = args.log_level.as_deref().unwrap_or(&file.logging.level);
    init_logging(level, file.logging.file.as_deref()).context("Failed to initialize logging")?;

    info!(
        "vcb-convert {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }

    let config = BatchConfig::from_layers(args.settings(), &file)?;
    info!(
        speaker = config.preset.id,
        reference = %config.reference_audio.display(),
        "Resolved batch configuration"
    );

    Ok((file, config))
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let (file, config) = bootstrap(&args.batch)?;
    let loader = WorkerLoader::from_settings(&file.engine);
    let mut runner = BatchRunner::new(config, loader);

    let printer = if args.json_events {
        let (tx, rx) = mpsc::channel::<BatchEvent>();
        runner = runner.with_events(tx);
        Some(thread::spawn(move || {
            for event in rx {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                }
            }
        }))
    } else {
        None
    };

    let outcome = runner.run(&args.batch.input, &args.batch.output);
    // Closes the event channel
    drop(runner);
    if let Some(handle) = printer {
        if handle.join().is_err() {
            tracing::warn!("Event printer thread panicked");
        }
    }

    let report = outcome.with_context(|| {
        format!(
            "Batch conversion of {} failed",
            args.batch.input.display()
        )
    })?;

    Ok(ExitCode::from(finish_run(&report, args.report.as_deref())))
}

/// Write the optional report; the exit status reflects job results only
fn finish_run(report: &BatchReport, report_path: Option<&Path>) -> u8 {
    if let Some(path) = report_path {
        match report.write_json(path) {
            Ok(()) => info!("Report written to {}", path.display()),
            Err(e) => error!("Failed to write report {}: {}", path.display(), e),
        }
    }

    if report.has_failures() {
        1
    } else {
        0
    }
}

fn plan(args: BatchArgs) -> Result<()> {
    let (_, config) = bootstrap(&args)?;
    let jobs = plan_jobs(&config, &FileScanner::new(), &args.input, &args.output)
        .with_context(|| format!("Planning {} failed", args.input.display()))?;

    println!("{}", serde_json::to_string_pretty(&jobs)?);
    info!("{} jobs planned", jobs.len());
    Ok(())
}

fn list_speakers() {
    println!("{:<16} {:<34} {:>10} {:>6}", "SPEAKER", "REFERENCE", "AUTO_PITCH", "SHIFT");
    for preset in PresetCatalog::all() {
        println!(
            "{:<16} {:<34} {:>10} {:>6}",
            preset.id, preset.reference_audio, preset.auto_pitch_adjust, preset.semitone_shift
        );
    }
}
