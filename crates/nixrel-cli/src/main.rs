//! nixrel CLI - Generate and publish Nix packages for release archives

use clap::{Args, Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::ReleaseOptions;

#[derive(Parser)]
#[command(name = "nixrel")]
#[command(author = "nixrel Contributors")]
#[command(version)]
#[command(about = "Generate and publish Nix packages for release archives", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project file
    #[arg(short, long, global = true, default_value = "nixrel.yaml")]
    config: PathBuf,

    /// Artifact list (default: <dist>/artifacts.json)
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Args)]
struct ReleaseArgs {
    /// Tag being released
    #[arg(long)]
    tag: String,

    /// Previous tag, available to templates
    #[arg(long)]
    previous_tag: Option<String>,

    /// Treat the release as a snapshot
    #[arg(long)]
    snapshot: bool,
}

impl From<ReleaseArgs> for ReleaseOptions {
    fn from(args: ReleaseArgs) -> Self {
        Self {
            tag: args.tag,
            previous_tag: args.previous_tag,
            snapshot: args.snapshot,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render manifests with placeholder hashes into <dist>/nix
    Build {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Hash archives and push manifests to their repositories
    Publish {
        #[command(flatten)]
        release: ReleaseArgs,

        /// GitHub token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// GitHub API base URL
        #[arg(long, default_value = nixrel_repo::DEFAULT_API_URL)]
        api_url: String,

        /// Write manifests into this directory instead of pushing them
        #[arg(long)]
        repo_dir: Option<PathBuf>,

        /// Archives hashed at once per package
        #[arg(long, default_value_t = nixrel_pipe::DEFAULT_HASH_CONCURRENCY)]
        concurrency: usize,
    },

    /// Validate the configuration and show resolved archives
    Check {
        /// Tag used to expand templated fields
        #[arg(long, default_value = "v0.0.0")]
        tag: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let artifacts = cli.artifacts.as_deref();
    let result = match cli.command {
        Commands::Build { release } => {
            commands::build::run(&cli.config, artifacts, &release.into()).await
        }

        Commands::Publish {
            release,
            token,
            api_url,
            repo_dir,
            concurrency,
        } => {
            let target = commands::publish::Target {
                repo_dir,
                api_url,
                token,
                concurrency,
            };
            commands::publish::run(&cli.config, artifacts, &release.into(), &target).await
        }

        Commands::Check { tag } => {
            let release = ReleaseOptions {
                tag,
                previous_tag: None,
                snapshot: false,
            };
            commands::check::run(&cli.config, artifacts, &release)
        }
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
    Ok(())
}
