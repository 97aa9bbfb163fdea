use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use stagepush::App;
use stagepush::Config;
use stagepush::report::ConsoleReporter;
use stagepush::sync::Identity;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Parser)]
#[command(name = "stagepush")]
#[command(about = "Stage local or uploaded files onto a remote git branch and push them", long_about = None)]
pub struct Cli {
    /// Never retry a rejected push as a force push
    #[arg(long, global = true)]
    pub no_force_push: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct IdentityArgs {
    /// Git username for commits
    #[arg(long)]
    pub name: Option<String>,
    /// Git email for commits
    #[arg(long)]
    pub email: Option<String>,
}

impl From<IdentityArgs> for Identity {
    fn from(args: IdentityArgs) -> Self {
        Identity::new(args.name, args.email)
    }
}

#[derive(Args)]
pub struct FilesArgs {
    /// Paths to stage, relative to the working copy root
    #[arg(conflicts_with = "intake")]
    pub paths: Vec<String>,
    /// Copy every file of this directory into the working copy and stage them
    #[arg(long)]
    pub intake: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the branches of a remote repository
    Branches {
        url: String,
        #[arg(long)]
        json: bool,
    },
    /// List the top-level entries of a working copy
    Files {
        #[arg(short, long)]
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Set up a working copy checked out on a branch, creating the branch if needed
    Setup {
        url: String,
        #[arg(short, long)]
        branch: String,
        #[arg(short, long)]
        dir: PathBuf,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Set the commit author of a working copy
    Identity {
        #[arg(short, long)]
        dir: PathBuf,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Commit and push files from a working copy
    Publish {
        #[arg(short, long)]
        dir: PathBuf,
        #[arg(short, long)]
        branch: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
        #[command(flatten)]
        files: FilesArgs,
        #[command(flatten)]
        identity: IdentityArgs,
        #[arg(long)]
        json: bool,
    },
    /// Set up a working copy, then commit and push files in one go
    Sync {
        url: String,
        #[arg(short, long)]
        branch: String,
        #[arg(short, long)]
        dir: PathBuf,
        /// Commit message
        #[arg(short, long)]
        message: String,
        #[command(flatten)]
        files: FilesArgs,
        #[command(flatten)]
        identity: IdentityArgs,
        #[arg(long)]
        json: bool,
    },
}

fn setup_logging() -> Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging()?;
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.no_force_push {
        config.allow_force_push = false;
    }
    let app = App::new(config, ConsoleReporter::new(std::io::stderr()));
    let stdout = &mut std::io::stdout();

    let ok = match cli.command {
        Commands::Branches { url, json } => app.cmd_branches(&url, json, stdout).await?,
        Commands::Files { dir, json } => app.cmd_files(&dir, json, stdout).await?,
        Commands::Setup {
            url,
            branch,
            dir,
            identity,
        } => {
            app.cmd_setup(url, branch, dir, identity.into(), stdout)
                .await?
        }
        Commands::Identity { dir, identity } => app.cmd_identity(dir, identity.into()).await?,
        Commands::Publish {
            dir,
            branch,
            message,
            files,
            identity,
            json,
        } => {
            app.cmd_publish(
                dir,
                branch,
                &message,
                files.paths,
                files.intake,
                identity.into(),
                json,
                stdout,
            )
            .await?
        }
        Commands::Sync {
            url,
            branch,
            dir,
            message,
            files,
            identity,
            json,
        } => {
            app.cmd_sync(
                url,
                branch,
                dir,
                &message,
                files.paths,
                files.intake,
                identity.into(),
                json,
                stdout,
            )
            .await?
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
