//! The `zosmf` command tree: instance identity and the systems the
//! instance is configured to reach.

use crate::config::ResolvedConnection;
use crate::output::{print_json, render_table, OutputFormat};
use clap::Subcommand;
use zosmf_sdk::info::get_zosmf_info;
use zosmf_sdk::topology::list_defined_systems;
use zosmf_sdk::ZosmfSession;

#[derive(Debug, Subcommand)]
pub enum ZosmfCommand {
    /// Confirm the instance is up and describe it.
    #[command(subcommand)]
    Check(CheckCommand),
    /// List resources defined to the instance.
    #[command(subcommand)]
    List(ListCommand),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: ZosmfCommand,
) -> miette::Result<()> {
    let session = connection.session()?;
    match command {
        ZosmfCommand::Check(CheckCommand::Status) => status(&session, format).await,
        ZosmfCommand::List(ListCommand::Systems) => systems(&session, format).await,
    }
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Fetch version and plugin information from the instance.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List the systems defined to the instance.
    Systems,
}

async fn status(session: &ZosmfSession, format: OutputFormat) -> miette::Result<()> {
    let info = get_zosmf_info(session).await?;
    if format.is_json() {
        return print_json(&info);
    }
    let dash = || "-".to_string();
    println!(
        "Hostname:      {}",
        info.zosmf_hostname.clone().unwrap_or_else(dash)
    );
    println!(
        "Port:          {}",
        info.zosmf_port.clone().unwrap_or_else(dash)
    );
    println!(
        "z/OS version:  {}",
        info.zos_version.clone().unwrap_or_else(dash)
    );
    println!(
        "z/OSMF version: {}",
        info.zosmf_full_version
            .clone()
            .or(info.zosmf_version.clone())
            .unwrap_or_else(dash)
    );
    println!(
        "SAF realm:     {}",
        info.zosmf_saf_realm.clone().unwrap_or_else(dash)
    );
    if let Some(plugins) = &info.plugins {
        if !plugins.is_empty() {
            println!();
            let rows: Vec<Vec<String>> = plugins
                .iter()
                .map(|plugin| {
                    vec![
                        plugin.plugin_default_name.clone().unwrap_or_else(dash),
                        plugin.plugin_version.clone().unwrap_or_else(dash),
                        plugin.plugin_status.clone().unwrap_or_else(dash),
                    ]
                })
                .collect();
            print!("{}", render_table(&["PLUGIN", "VERSION", "STATUS"], &rows));
        }
    }
    Ok(())
}

async fn systems(session: &ZosmfSession, format: OutputFormat) -> miette::Result<()> {
    let response = list_defined_systems(session).await?;
    if format.is_json() {
        return print_json(&response);
    }
    let dash = || "-".to_string();
    let rows: Vec<Vec<String>> = response
        .items
        .iter()
        .map(|system| {
            vec![
                system.system_nickname.clone().unwrap_or_else(dash),
                system.system_name.clone().unwrap_or_else(dash),
                system.sysplex_name.clone().unwrap_or_else(dash),
                system.jes_type.clone().unwrap_or_else(dash),
                system.url.clone().unwrap_or_else(dash),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(&["NICKNAME", "SYSNAME", "SYSPLEX", "JES", "URL"], &rows)
    );
    println!("{} system(s) defined.", response.num_rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ZosmfCommand,
    }

    #[test]
    fn test_check_status_parses() {
        let cli = Harness::try_parse_from(["zosmf", "check", "status"]).unwrap();
        assert!(matches!(cli.command, ZosmfCommand::Check(CheckCommand::Status)));
    }

    #[test]
    fn test_list_systems_parses() {
        let cli = Harness::try_parse_from(["zosmf", "list", "systems"]).unwrap();
        assert!(matches!(cli.command, ZosmfCommand::List(ListCommand::Systems)));
    }
}
