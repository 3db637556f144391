// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use pagetrans::app_config::{self, Config};
use pagetrans::app_controller::Controller;
use pagetrans::translation::OverflowPolicy;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for OverflowPolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOverflowPolicy {
    Distribute,
    KeepWhole,
}

impl From<CliOverflowPolicy> for OverflowPolicy {
    fn from(cli_policy: CliOverflowPolicy) -> Self {
        match cli_policy {
            CliOverflowPolicy::Distribute => OverflowPolicy::Distribute,
            CliOverflowPolicy::KeepWhole => OverflowPolicy::KeepWhole,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a layout document and print the job id
    Submit {
        /// Layout document (JSON or PAGE XML) to translate
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Fetch the translation of a submitted job
    Retrieve {
        /// Job id printed by `submit`
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Where to write the translated document
        #[arg(short, long)]
        output: PathBuf,

        /// Keep polling until the job is finished
        #[arg(short, long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 600, requires = "wait")]
        timeout: u64,

        /// Force overwrite of an existing output file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Submit a layout document and wait for its translation
    Translate {
        /// Layout document (JSON or PAGE XML) to translate
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Output file, defaults to `<input>.<target>.json` (`.xml` for PAGE XML)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        languages: LanguageArgs,

        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Force overwrite of an existing output file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// List stored jobs, newest first
    Jobs {
        /// Number of jobs to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum number of jobs to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Maintain the translation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Generate shell completions for pagetrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum MemoryAction {
    /// Check that the translation memory answers
    Health,

    /// Store a translation unit
    Add {
        /// Source segment
        segment: String,

        /// Its translation
        translation: String,
    },

    /// Remove a translation unit
    Delete {
        /// Source segment
        segment: String,

        /// Its translation
        translation: String,
    },

    /// Upload a TMX file
    Import {
        /// TMX file to upload
        #[arg(value_name = "TMX_FILE")]
        tmx_file: PathBuf,

        /// Memory name, defaults to the file name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Count the translation units of the language pair
    Count,

    /// List the language pairs stored under the configured key
    Pairs,
}

#[derive(Args, Debug)]
struct LanguageArgs {
    /// Source language code (e.g., 'en', 'fr', 'deu')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'fr', 'deu')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Skip translation memory lookups
    #[arg(long)]
    no_tm: bool,

    /// How sentences running over several lines are put back
    #[arg(long, value_enum)]
    overflow: Option<CliOverflowPolicy>,
}

/// pagetrans - layout-preserving document translation
///
/// Translates layout documents (regions of lines) with eTranslation while
/// reusing translation memory full matches, then puts the translated
/// sentences back onto the original lines.
#[derive(Parser, Debug)]
#[command(name = "pagetrans")]
#[command(version)]
#[command(about = "Layout-preserving document translation")]
#[command(long_about = "pagetrans translates layout documents through eTranslation and writes the
translation back onto the original lines.

EXAMPLES:
    pagetrans translate page.json                     # Translate using default config
    pagetrans translate -s en -t fr page.json         # Translate from English to French
    pagetrans submit page.json                        # Submit only, prints the job id
    pagetrans retrieve <JOB_ID> -o page.fr.json       # Fetch a finished job
    pagetrans retrieve <JOB_ID> -o out.json --wait    # Wait for a job to finish
    pagetrans translate scan.xml                      # Translate a PAGE XML file into scan.nl.xml
    pagetrans jobs --limit 5                          # Show recent jobs
    pagetrans memory add \"Hello.\" \"Hallo.\"            # Store a translation unit
    pagetrans memory import glossary.tmx              # Upload a TMX file
    pagetrans completions bash > pagetrans.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering is left to `log::set_max_level` so the level can change after init
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("pagetrans")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let colour = Self::colour_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                colour,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "pagetrans", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    // Update log level in config if specified via command line
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    match cli.command {
        Commands::Submit { input_file, languages } => {
            apply_language_args(&mut config, languages);
            let controller = build_controller(config)?;

            let job_id = controller.submit_file(&input_file).await?;
            println!("{}", job_id);
        }
        Commands::Retrieve {
            job_id,
            output,
            wait,
            timeout,
            force_overwrite,
        } => {
            let controller = build_controller(config)?;

            if wait {
                controller
                    .wait_for_job(&job_id, &output, Duration::from_secs(timeout), force_overwrite)
                    .await?;
            } else if !controller.retrieve_job(&job_id, &output, force_overwrite).await? {
                println!("Job {} is not ready yet", job_id);
            }
        }
        Commands::Translate {
            input_file,
            output,
            languages,
            timeout,
            force_overwrite,
        } => {
            apply_language_args(&mut config, languages);
            let controller = build_controller(config)?;

            let output = output.unwrap_or_else(|| controller.output_filename(&input_file));
            controller
                .translate_file(&input_file, &output, Duration::from_secs(timeout), force_overwrite)
                .await?;
        }
        Commands::Jobs { skip, limit } => {
            let controller = build_controller(config)?;

            let jobs = controller.list_jobs(skip, limit).await?;
            if jobs.is_empty() {
                info!("No jobs stored");
            }
            for job in &jobs {
                println!("{}", job);
            }
            if let Some(stats) = controller.database_stats()? {
                println!();
                println!("{}", stats);
            }
        }
        Commands::Memory { action, languages } => {
            apply_language_args(&mut config, languages);
            let controller = build_controller(config)?;

            run_memory_action(&controller, action).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

// Override config with CLI options if provided
fn apply_language_args(config: &mut Config, languages: LanguageArgs) {
    if let Some(source_language) = languages.source_language {
        config.source_language = source_language;
    }

    if let Some(target_language) = languages.target_language {
        config.target_language = target_language;
    }

    if languages.no_tm {
        config.use_tm = false;
    }

    if let Some(overflow) = languages.overflow {
        config.overflow_policy = overflow.into();
    }
}

async fn run_memory_action(controller: &Controller, action: MemoryAction) -> Result<()> {
    match action {
        MemoryAction::Health => {
            controller.memory_health().await?;
            println!("Translation memory is available");
        }
        MemoryAction::Add { segment, translation } => controller.add_memory_unit(&segment, &translation).await?,
        MemoryAction::Delete { segment, translation } => {
            controller.delete_memory_unit(&segment, &translation).await?
        }
        MemoryAction::Import { tmx_file, name } => controller.import_tmx(&tmx_file, name.as_deref()).await?,
        MemoryAction::Count => println!("{}", controller.memory_unit_count().await?),
        MemoryAction::Pairs => {
            for pair in controller.memory_language_pairs().await? {
                println!("{}", pair);
            }
        }
    }
    Ok(())
}

fn build_controller(config: Config) -> Result<Controller> {
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.into());

    if config.mt.username.is_empty() {
        warn!("No eTranslation credentials configured; requests will likely be refused");
    }

    Controller::with_config(config)
}
