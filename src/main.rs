// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use inquire::{InquireError, Text};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use csvbridge::app_config::{self, Config};
use csvbridge::logging::{ConverterLogger, LogSettings};
use csvbridge::{Controller, ShutdownSignal};

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for csvbridge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// csvbridge - mixed-encoding CSV normalizer and translator
///
/// Walks a directory, decodes each line of every CSV file in whatever encoding
/// it was written in, translates Chinese cells and rewrites the file in place.
#[derive(Parser, Debug)]
#[command(name = "csvbridge")]
#[command(version)]
#[command(about = "Normalize mixed-encoding CSV files and translate their Chinese cells")]
#[command(long_about = "csvbridge walks a directory tree, detects the encoding of every line of each CSV file,
translates Chinese cells through a ring of translation services and replaces each file atomically.
An interrupted run resumes from the last committed batch.

EXAMPLES:
    csvbridge                                  # Prompt for the root directory
    csvbridge ./exports                        # Process every .csv under ./exports
    csvbridge -s zh-CN -t tr ./exports         # Translate Chinese into Turkish
    csvbridge --extension .txt ./exports       # Process .txt files instead
    csvbridge --log-level debug ./exports      # Verbose console output
    csvbridge completions bash > csvbridge.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Root directory to process (prompted for when omitted)
    #[arg(value_name = "ROOT_DIR")]
    root_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// Set console logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// File suffix to process (e.g. '.csv')
    #[arg(short, long)]
    extension: Option<String>,

    /// Source language tag (e.g. 'zh-CN')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language tag (e.g. 'en', 'tr')
    #[arg(short, long)]
    target_language: Option<String>,
}

impl CommandLineOptions {
    // @method: Apply command line overrides on top of the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log.level = level.clone().into();
        }
        if let Some(extension) = &self.extension {
            config.file_extension = extension.clone();
        }
        if let Some(source_lang) = &self.source_language {
            config.source_language = source_lang.clone();
        }
        if let Some(target_lang) = &self.target_language {
            config.target_language = target_lang.clone();
        }
    }
}

// @returns: Root directory from the command line, or asked interactively; None if the user quit the prompt
fn resolve_root_dir(cli_root: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(root) = cli_root {
        return Ok(Some(root));
    }
    let answer = Text::new("Root directory")
        .with_default(".")
        .with_help_message("Every matching file below this directory is converted")
        .prompt();
    root_from_answer(answer)
}

// @method: Map a prompt answer to the root directory
fn root_from_answer(answer: Result<String, InquireError>) -> Result<Option<PathBuf>> {
    match answer {
        Ok(answer) if !answer.trim().is_empty() => Ok(Some(PathBuf::from(answer.trim()))),
        Ok(_) => Ok(Some(PathBuf::from("."))),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(InquireError::NotTTY) => {
            warn!("No terminal to ask for a root directory, using the current directory");
            Ok(Some(PathBuf::from(".")))
        }
        Err(e) => Err(e).context("Failed to read the root directory"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "csvbridge", &mut std::io::stdout());
        return Ok(());
    }

    let config_existed = Path::new(&cli.config_path).exists();
    let mut config = Config::load_or_create(&cli.config_path)?;
    cli.apply_to(&mut config);

    ConverterLogger::init(&LogSettings::from(&config.log))
        .context("Failed to initialize logger")?;
    if !config_existed {
        warn!(
            "Config file not found at '{}', created default config.",
            cli.config_path
        );
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    let Some(root_dir) = resolve_root_dir(cli.root_dir)? else {
        info!("No root directory chosen, nothing to do.");
        log::logger().flush();
        return Ok(());
    };
    info!(
        "Converting {} files under {} ({} -> {})",
        config.file_extension,
        root_dir.display(),
        config.source_language,
        config.target_language
    );

    let shutdown = ShutdownSignal::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current batch...");
            signal.trigger();
        }
    });

    let mut controller = Controller::with_config(config)?.with_shutdown(shutdown);
    match controller.run_folder(&root_dir).await {
        Ok(summary) => {
            if summary.interrupted {
                info!("Run interrupted; rerun the same command to resume.");
            }
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            return Err(e);
        }
    }

    println!("Processing completed.");
    log::logger().flush();
    Ok(())
}
