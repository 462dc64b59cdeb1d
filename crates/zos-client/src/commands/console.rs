//! The `zos-console` command tree: issue MVS commands through an EMCS
//! console and collect solicited responses by key.

use crate::config::ResolvedConnection;
use crate::output::{print_json, OutputFormat};
use clap::{Args, Subcommand};
use std::time::Duration;
use zosmf_console::collect::collect_response;
use zosmf_console::issue::{issue_and_collect, issue_command};
use zosmf_console::{CollectParms, ConsoleResponse, IssueParms};
use zosmf_sdk::ZosmfSession;

#[derive(Debug, Subcommand)]
pub enum ConsoleCommand {
    /// Issue an MVS command.
    #[command(subcommand)]
    Issue(IssueCommand),
    /// Collect responses left behind by an earlier command.
    #[command(subcommand)]
    Collect(CollectCommand),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: ConsoleCommand,
) -> miette::Result<()> {
    let session = connection.session()?;
    match command {
        ConsoleCommand::Issue(IssueCommand::Command(args)) => issue(&session, format, args).await,
        ConsoleCommand::Collect(CollectCommand::SyncResponses(args)) => {
            collect(&session, format, args).await
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum IssueCommand {
    /// Issue an MVS command and print its response.
    #[command(visible_alias = "cmd")]
    Command(IssueArgs),
}

#[derive(Debug, Subcommand)]
pub enum CollectCommand {
    /// Fetch the solicited messages for a response key.
    #[command(visible_alias = "sr")]
    SyncResponses(CollectArgs),
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    /// The MVS command, for example "D IPLINFO".
    #[arg(value_name = "COMMAND")]
    pub command: String,
    /// EMCS console to issue through.
    #[arg(long, value_name = "NAME")]
    pub console_name: Option<String>,
    /// Keyword that marks the solicited portion of the response.
    #[arg(long, value_name = "KEYWORD")]
    pub solicited_keyword: Option<String>,
    /// Sysplex member to route the command to.
    #[arg(long, value_name = "SYSTEM")]
    pub sysplex_system: Option<String>,
    /// Issue asynchronously; the server acknowledges without waiting
    /// for command output.
    #[arg(long = "async")]
    pub async_mode: bool,
    /// Consecutive empty follow-up fetches tolerated before giving up.
    #[arg(long, value_name = "N")]
    pub follow_up_attempts: Option<u32>,
    /// Seconds to pause before each follow-up fetch.
    #[arg(long, value_name = "SECONDS")]
    pub wait_to_collect: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Response key from an earlier issue.
    #[arg(value_name = "KEY")]
    pub key: String,
    /// EMCS console the command was issued through.
    #[arg(long, value_name = "NAME")]
    pub console_name: Option<String>,
    /// Consecutive empty fetches tolerated before giving up.
    #[arg(long, value_name = "N")]
    pub follow_up_attempts: Option<u32>,
    /// Seconds to pause before each fetch.
    #[arg(long, value_name = "SECONDS")]
    pub wait_to_collect: Option<u64>,
}

/// Follow-up collection is wanted when a solicited keyword or any of
/// the collection tuning flags is given.
fn wants_follow_up(args: &IssueArgs) -> bool {
    args.solicited_keyword.is_some()
        || args.follow_up_attempts.is_some()
        || args.wait_to_collect.is_some()
}

async fn issue(
    session: &ZosmfSession,
    format: OutputFormat,
    args: IssueArgs,
) -> miette::Result<()> {
    let parms = IssueParms {
        command: args.command.clone(),
        console_name: args.console_name.clone(),
        solicited_keyword: args.solicited_keyword.clone(),
        sysplex_system: args.sysplex_system.clone(),
        async_mode: args.async_mode,
    };
    let response = if wants_follow_up(&args) {
        let collect_parms = CollectParms {
            console_name: args.console_name.clone(),
            follow_up_attempts: args.follow_up_attempts,
            wait_to_collect: args.wait_to_collect.map(Duration::from_secs),
            ..Default::default()
        };
        issue_and_collect(session, &parms, &collect_parms).await?
    } else {
        issue_command(session, &parms).await?
    };
    render(format, &response, args.async_mode)
}

async fn collect(
    session: &ZosmfSession,
    format: OutputFormat,
    args: CollectArgs,
) -> miette::Result<()> {
    let parms = CollectParms {
        command_response_key: args.key.clone(),
        console_name: args.console_name.clone(),
        follow_up_attempts: args.follow_up_attempts,
        wait_to_collect: args.wait_to_collect.map(Duration::from_secs),
    };
    let response = collect_response(session, &parms).await?;
    render(format, &response, false)
}

fn render(
    format: OutputFormat,
    response: &ConsoleResponse,
    async_mode: bool,
) -> miette::Result<()> {
    if format.is_json() {
        return print_json(response);
    }
    if response.command_response.is_empty() {
        if async_mode {
            println!("Command issued.");
        }
    } else {
        print!("{}", response.command_response);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ConsoleCommand,
    }

    #[test]
    fn test_issue_parses_command_and_flags() {
        let cli = Harness::try_parse_from([
            "console",
            "issue",
            "cmd",
            "D IPLINFO",
            "--console-name",
            "ibmcons",
            "--sysplex-system",
            "SYS1",
        ])
        .unwrap();
        let ConsoleCommand::Issue(IssueCommand::Command(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.command, "D IPLINFO");
        assert_eq!(args.console_name.as_deref(), Some("ibmcons"));
        assert_eq!(args.sysplex_system.as_deref(), Some("SYS1"));
        assert!(!args.async_mode);
        assert!(!wants_follow_up(&args));
    }

    #[test]
    fn test_solicited_keyword_requests_follow_up() {
        let cli = Harness::try_parse_from([
            "console",
            "issue",
            "cmd",
            "D T",
            "--solicited-keyword",
            "IEE136I",
        ])
        .unwrap();
        let ConsoleCommand::Issue(IssueCommand::Command(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert!(wants_follow_up(&args));
    }

    #[test]
    fn test_collect_takes_key_positionally() {
        let cli = Harness::try_parse_from([
            "console",
            "collect",
            "sr",
            "C1046283",
            "--follow-up-attempts",
            "3",
        ])
        .unwrap();
        let ConsoleCommand::Collect(CollectCommand::SyncResponses(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.key, "C1046283");
        assert_eq!(args.follow_up_attempts, Some(3));
    }
}
