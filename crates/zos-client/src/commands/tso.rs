//! The `zos-tso` command tree: start and stop TSO address spaces, send
//! data to a running one, and run one-shot commands.

use crate::config::ResolvedConnection;
use crate::output::{print_json, OutputFormat};
use clap::{Args, Subcommand};
use miette::miette;
use zosmf_sdk::ZosmfSession;
use zosmf_tso::issue::issue_tso_command;
use zosmf_tso::send::send_data_to_tso_collect;
use zosmf_tso::start::start_tso;
use zosmf_tso::stop::stop_tso;
use zosmf_tso::StartTsoParms;

#[derive(Debug, Subcommand)]
pub enum TsoCommand {
    /// Start a TSO address space.
    #[command(subcommand)]
    Start(StartCommand),
    /// Stop a TSO address space.
    #[command(subcommand)]
    Stop(StopCommand),
    /// Send data to a running TSO address space.
    #[command(subcommand)]
    Send(SendCommand),
    /// Start an address space, run one command, and stop it.
    #[command(subcommand)]
    Issue(IssueCommand),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: TsoCommand,
) -> miette::Result<()> {
    let session = connection.session()?;
    match command {
        TsoCommand::Start(StartCommand::AddressSpace(args)) => start(&session, format, args).await,
        TsoCommand::Stop(StopCommand::AddressSpace(args)) => stop(&session, format, args).await,
        TsoCommand::Send(SendCommand::AddressSpace(args)) => send(&session, format, args).await,
        TsoCommand::Issue(IssueCommand::Command(args)) => issue(&session, format, args).await,
    }
}

#[derive(Debug, Subcommand)]
pub enum StartCommand {
    /// Start an address space and print its servlet key.
    #[command(visible_alias = "as")]
    AddressSpace(StartArgs),
}

#[derive(Debug, Subcommand)]
pub enum StopCommand {
    /// Stop the address space that owns a servlet key.
    #[command(visible_alias = "as")]
    AddressSpace(StopArgs),
}

#[derive(Debug, Subcommand)]
pub enum SendCommand {
    /// Send a line of data and print the drained response.
    #[command(visible_alias = "as")]
    AddressSpace(SendArgs),
}

#[derive(Debug, Subcommand)]
pub enum IssueCommand {
    /// Run a TSO command in a short-lived address space.
    #[command(visible_alias = "cmd")]
    Command(IssueArgs),
}

/// Logon properties shared by every command that starts an address
/// space. Fields left unset fall back to the server-side defaults.
#[derive(Debug, Args)]
pub struct TsoProfileArgs {
    /// Accounting information for the logon.
    #[arg(short = 'a', long, value_name = "ACCOUNT")]
    pub account: String,
    /// Logon procedure, for example IZUFPROC.
    #[arg(long, value_name = "PROC")]
    pub logon_procedure: Option<String>,
    /// Character set for terminal translation.
    #[arg(long, value_name = "CHSET")]
    pub character_set: Option<String>,
    /// Code page for terminal translation.
    #[arg(long, value_name = "CPAGE")]
    pub code_page: Option<String>,
    /// Screen rows.
    #[arg(long, value_name = "N")]
    pub rows: Option<u32>,
    /// Screen columns.
    #[arg(long, value_name = "N")]
    pub columns: Option<u32>,
    /// Region size in kilobytes.
    #[arg(long, value_name = "KB")]
    pub region_size: Option<u32>,
}

impl TsoProfileArgs {
    fn parms(&self) -> StartTsoParms {
        StartTsoParms {
            logon_procedure: self.logon_procedure.clone(),
            character_set: self.character_set.clone(),
            code_page: self.code_page.clone(),
            rows: self.rows,
            columns: self.columns,
            region_size: self.region_size,
        }
    }
}

#[derive(Debug, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub profile: TsoProfileArgs,
}

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Servlet key returned when the address space started.
    #[arg(value_name = "KEY")]
    pub key: String,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Servlet key returned when the address space started.
    #[arg(value_name = "KEY")]
    pub key: String,
    /// The line of data to send.
    #[arg(long, value_name = "DATA")]
    pub data: String,
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    /// The TSO command, for example "TIME".
    #[arg(value_name = "COMMAND")]
    pub command: String,
    #[command(flatten)]
    pub profile: TsoProfileArgs,
}

async fn start(
    session: &ZosmfSession,
    format: OutputFormat,
    args: StartArgs,
) -> miette::Result<()> {
    let response = start_tso(session, &args.profile.account, &args.profile.parms()).await?;
    if format.is_json() {
        print_json(&response)?;
    } else {
        if let Some(key) = &response.servlet_key {
            println!("Servlet key: {key}");
        }
        if !response.messages.is_empty() {
            print!("{}", response.messages);
        }
    }
    if response.success {
        Ok(())
    } else {
        Err(miette!("TSO address space failed to start"))
    }
}

async fn stop(session: &ZosmfSession, format: OutputFormat, args: StopArgs) -> miette::Result<()> {
    let response = stop_tso(session, &args.key).await?;
    if format.is_json() {
        print_json(&response)
    } else {
        println!("TSO address space {} stopped.", args.key);
        Ok(())
    }
}

async fn send(session: &ZosmfSession, format: OutputFormat, args: SendArgs) -> miette::Result<()> {
    let response = send_data_to_tso_collect(session, &args.key, &args.data).await?;
    if format.is_json() {
        print_json(&response)
    } else {
        print!("{}", response.command_response);
        Ok(())
    }
}

async fn issue(
    session: &ZosmfSession,
    format: OutputFormat,
    args: IssueArgs,
) -> miette::Result<()> {
    let response =
        issue_tso_command(session, &args.profile.account, &args.command, &args.profile.parms())
            .await?;
    if format.is_json() {
        print_json(&response)?;
    } else {
        print!("{}", response.command_response);
    }
    if response.success {
        Ok(())
    } else {
        Err(miette!("TSO command did not complete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: TsoCommand,
    }

    #[test]
    fn test_start_requires_account() {
        assert!(Harness::try_parse_from(["tso", "start", "as"]).is_err());
        assert!(Harness::try_parse_from(["tso", "start", "as", "-a", "ACCT#1"]).is_ok());
    }

    #[test]
    fn test_profile_flags_map_to_parms() {
        let cli = Harness::try_parse_from([
            "tso",
            "start",
            "as",
            "--account",
            "ACCT#1",
            "--logon-procedure",
            "IZUFPROC",
            "--rows",
            "24",
            "--columns",
            "80",
            "--region-size",
            "4096",
        ])
        .unwrap();
        let TsoCommand::Start(StartCommand::AddressSpace(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        let parms = args.profile.parms();
        assert_eq!(parms.logon_procedure.as_deref(), Some("IZUFPROC"));
        assert_eq!(parms.rows, Some(24));
        assert_eq!(parms.columns, Some(80));
        assert_eq!(parms.region_size, Some(4096));
        assert_eq!(parms.character_set, None);
    }

    #[test]
    fn test_issue_takes_command_positionally() {
        let cli =
            Harness::try_parse_from(["tso", "issue", "cmd", "TIME", "-a", "ACCT#1"]).unwrap();
        let TsoCommand::Issue(IssueCommand::Command(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.command, "TIME");
        assert_eq!(args.profile.account, "ACCT#1");
    }

    #[test]
    fn test_send_requires_data() {
        assert!(Harness::try_parse_from(["tso", "send", "as", "UZ123-45"]).is_err());
        let cli =
            Harness::try_parse_from(["tso", "send", "as", "UZ123-45", "--data", "LISTCAT"])
                .unwrap();
        let TsoCommand::Send(SendCommand::AddressSpace(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.key, "UZ123-45");
        assert_eq!(args.data, "LISTCAT");
    }
}
