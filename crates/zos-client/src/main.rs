//! Command line client for z/OSMF.
//!
//! Every command group talks to one z/OSMF REST service: `zos-files`
//! for data sets and UNIX files, `zos-jobs` for batch jobs,
//! `zos-console` for MVS commands, `zos-tso` for TSO address spaces,
//! `zosmf` for the instance itself, and `auth` for tokens.
//!
//! # Examples
//!
//! ```bash
//! # Check the instance is reachable
//! zos-client --host zos.example.com -u ibmuser zosmf check status
//!
//! # Submit JCL from a data set and wait for it to finish
//! zos-client zos-jobs submit ds "IBMUSER.CNTL(IEFBR14)" --wait-for-output
//!
//! # Download every member of a PDS
//! zos-client zos-files download am "IBMUSER.CNTL" --directory ./cntl
//! ```

#![forbid(unsafe_code)]

use clap::{CommandFactory, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

use commands::auth::AuthCommand;
use commands::console::ConsoleCommand;
use commands::files::FilesCommand;
use commands::jobs::JobsCommand;
use commands::tso::TsoCommand;
use commands::zosmf::ZosmfCommand;
use config::ConnectArgs;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "zos-client")]
#[command(author, version, about = "Work with z/OS data sets, jobs, consoles, and TSO over z/OSMF", long_about = None)]
struct Cli {
    #[command(flatten)]
    connect: ConnectArgs,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log request detail to standard error.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage data sets, UNIX files, and file systems.
    #[command(visible_alias = "files")]
    ZosFiles {
        #[command(subcommand)]
        command: FilesCommand,
    },

    /// Submit and manage batch jobs.
    #[command(visible_alias = "jobs")]
    ZosJobs {
        #[command(subcommand)]
        command: JobsCommand,
    },

    /// Issue MVS commands through an EMCS console.
    #[command(visible_alias = "console")]
    ZosConsole {
        #[command(subcommand)]
        command: ConsoleCommand,
    },

    /// Work with TSO address spaces.
    #[command(visible_alias = "tso")]
    ZosTso {
        #[command(subcommand)]
        command: TsoCommand,
    },

    /// Inspect the z/OSMF instance.
    Zosmf {
        #[command(subcommand)]
        command: ZosmfCommand,
    },

    /// Log in for a token, revoke one, or change a password.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output only.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::ZosFiles { command } => {
            commands::files::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::ZosJobs { command } => {
            commands::jobs::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::ZosConsole { command } => {
            commands::console::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::ZosTso { command } => {
            commands::tso::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::Zosmf { command } => {
            commands::zosmf::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::Auth { command } => {
            commands::auth::run(&cli.connect.resolve()?, cli.format, command).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "zos-client", &mut std::io::stdout());
            Ok(())
        }
    }
}
