use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod format;

/// Hold - local container image lister
///
/// A CLI tool for listing the images held in containers-storage.
#[derive(Parser, Debug)]
#[command(name = "hold")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    /// Storage root directory
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Storage driver
    #[arg(long, global = true, value_name = "NAME")]
    storage_driver: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List images in local storage
    #[command(after_help = "Examples:\n  hold images --all\n  hold images [imageName]\n  hold images --format '{{.ID}} {{.Name}} {{.Size}} {{.CreatedAtRaw}}'")]
    Images {
        /// Only show images with a matching name
        name: Option<String>,
        /// Show all images, including intermediate images from a build
        #[arg(short, long)]
        all: bool,
        /// Show digests
        #[arg(long)]
        digests: bool,
        /// Filter output based on conditions provided
        #[arg(short, long)]
        filter: Option<String>,
        /// Pretty-print images using a template
        #[arg(long)]
        format: Option<String>,
        /// Output in JSON format
        #[arg(long, conflicts_with_all = ["format", "quiet"])]
        json: bool,
        /// Do not print column headings
        #[arg(short, long)]
        noheading: bool,
        /// Do not truncate output
        #[arg(long)]
        no_trunc: bool,
        /// Display only image IDs
        #[arg(short, long)]
        quiet: bool,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags.
///
/// Fails if a global subscriber is already installed.
fn init_logging(
    verbosity: context::VerbosityLevel,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}

fn main() {
    let cli = Cli::parse();

    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    if let Err(e) = init_logging(verbosity) {
        eprintln!("hold: logging disabled: {}", e);
    }

    // Build context with precedence: defaults > storage.conf > config file > env vars > CLI flags
    let flags = context::GlobalFlags {
        color: cli.color.as_deref().and_then(|c| c.parse().ok()),
        root: cli.root,
        storage_driver: cli.storage_driver,
    };
    let ctx = context::AppContext::build(verbosity, &flags);

    match cli.command {
        Commands::Images {
            name,
            all,
            digests,
            filter,
            format,
            json,
            noheading,
            no_trunc,
            quiet,
        } => {
            let options = commands::images::ImagesOptions {
                name,
                all,
                digests,
                filter,
                format,
                json,
                noheading,
                no_trunc,
                quiet,
            };
            commands::images::handlers::handle_images(&ctx, &options);
        }
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
