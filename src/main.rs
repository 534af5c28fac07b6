use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resumefit::cli::commands;
use resumefit::cli::commands::analyze::AnalyzeOptions;
use resumefit::cli::{CommandContext, Output, OutputFormat};
use resumefit::config::{Environment, FallbackPolicy};

#[derive(Parser)]
#[command(name = "resumefit")]
#[command(
    version,
    about = "Resume vs. job description analysis with Gemini and an offline fallback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (skips the global/project lookup)")]
    config: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Debug logging")]
    verbose: bool,

    #[arg(long, short, global = true, conflicts_with = "verbose", help = "Errors only")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a resume against a job description
    Analyze {
        #[arg(long, short = 'r', help = "Resume file (.pdf, .docx, .txt, .md)")]
        resume: PathBuf,
        #[arg(long, short = 'j', help = "Job description file")]
        job: PathBuf,
        #[arg(long = "env", help = "Environment override: development, production")]
        environment: Option<Environment>,
        #[arg(long, help = "Skip the network and use the keyword estimate")]
        offline: bool,
        #[arg(long, help = "Fallback policy: never, on-network-error, on-any-failure")]
        fallback: Option<FallbackPolicy>,
        #[arg(long, help = "Attempts per transport")]
        retries: Option<u32>,
        #[arg(long, help = "Base backoff delay in milliseconds")]
        base_delay_ms: Option<u64>,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the text extracted from a document
    Extract {
        #[arg(help = "Document path")]
        path: PathBuf,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the relay server holding the Gemini key
    Relay {
        #[arg(long, help = "Bind address (default: relay.bind)")]
        bind: Option<String>,
    },

    /// Validate configuration and probe the endpoints
    Check {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mresumefit encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let load = || CommandContext::load(cli.config.as_deref(), cli.quiet);

    match cli.command {
        Commands::Analyze {
            resume,
            job,
            environment,
            offline,
            fallback,
            retries,
            base_delay_ms,
            format,
        } => {
            commands::analyze::run(
                load()?,
                AnalyzeOptions {
                    resume,
                    job,
                    environment,
                    offline,
                    fallback,
                    retries,
                    base_delay_ms,
                    format,
                },
            )?;
        }
        Commands::Extract { path, format } => {
            commands::extract::run(load()?, &path, format)?;
        }
        Commands::Relay { bind } => {
            commands::relay::run(load()?, bind)?;
        }
        Commands::Check { format } => {
            commands::check::run(load()?, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(&load()?, format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(&Output::quiet(cli.quiet), global, force)?;
            }
        },
    }

    Ok(())
}
