//! The `auth` command tree: trade the configured user and password for
//! a token, revoke one, and change a password over the authentication
//! service.

use crate::config::{prompt_password, ResolvedConnection};
use crate::output::{print_done, print_json, OutputFormat};
use clap::{Args, Subcommand};
use miette::miette;
use zosmf_sdk::auth;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in with user and password and print the issued token.
    Login,
    /// Revoke the configured token.
    Logout,
    /// Change the password of a user.
    ChangePassword(ChangePasswordArgs),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: AuthCommand,
) -> miette::Result<()> {
    match command {
        AuthCommand::Login => login(connection, format).await,
        AuthCommand::Logout => logout(connection, format).await,
        AuthCommand::ChangePassword(args) => change_password(connection, format, args).await,
    }
}

#[derive(Debug, Args)]
pub struct ChangePasswordArgs {
    /// User whose password changes. Defaults to the connection user.
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
    /// Current password. Falls back to the connection password, then
    /// to a prompt.
    #[arg(long, value_name = "PASSWORD")]
    pub old_password: Option<String>,
    /// Replacement password. Prompted for when not given.
    #[arg(long, value_name = "PASSWORD")]
    pub new_password: Option<String>,
}

/// Drop any configured token so the session authenticates with the
/// basic credential.
fn basic_only(connection: &ResolvedConnection) -> ResolvedConnection {
    let mut basic = connection.clone();
    basic.token_type = None;
    basic.token_value = None;
    basic
}

async fn login(connection: &ResolvedConnection, format: OutputFormat) -> miette::Result<()> {
    let basic = basic_only(connection);
    if basic.user.is_none() {
        return Err(miette!(
            "login needs a user; pass --user or configure one in a profile"
        ));
    }
    let session = basic.session()?;
    let token = auth::login(&session).await?;
    if format.is_json() {
        print_json(&serde_json::json!({
            "tokenType": token.token_type,
            "tokenValue": token.token_value,
        }))
    } else {
        println!("Token type:  {}", token.token_type);
        println!("Token value: {}", token.token_value);
        println!();
        println!("Pass the value with --token-value, or store it in a profile, to reuse the session.");
        Ok(())
    }
}

async fn logout(connection: &ResolvedConnection, format: OutputFormat) -> miette::Result<()> {
    if connection.token_value.is_none() {
        return Err(miette!(
            "logout needs the token to revoke; pass --token-value or configure one in a profile"
        ));
    }
    let session = connection.session()?;
    auth::logout(&session).await?;
    print_done(
        format,
        "Logout successful. The token is no longer valid.".to_string(),
    )
}

async fn change_password(
    connection: &ResolvedConnection,
    format: OutputFormat,
    args: ChangePasswordArgs,
) -> miette::Result<()> {
    let user = args
        .user
        .clone()
        .or_else(|| connection.user.clone())
        .ok_or_else(|| {
            miette!("change-password needs a user; pass --user or configure one in a profile")
        })?;
    let old_password = match args.old_password {
        Some(password) => password,
        None => match &connection.password {
            Some(password) => password.clone(),
            None => prompt_password(&format!("Current password for {user}: "))?,
        },
    };
    let new_password = match args.new_password {
        Some(password) => password,
        None => prompt_password(&format!("New password for {user}: "))?,
    };
    let mut basic = basic_only(connection);
    basic.user = Some(user.clone());
    basic.password = Some(old_password.clone());
    let session = basic.session()?;
    auth::change_password(&session, &user, &old_password, &new_password).await?;
    print_done(format, format!("Password changed for {user}."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: AuthCommand,
    }

    #[test]
    fn test_auth_subcommands_parse() {
        assert!(Harness::try_parse_from(["auth", "login"]).is_ok());
        assert!(Harness::try_parse_from(["auth", "logout"]).is_ok());
        let cli = Harness::try_parse_from([
            "auth",
            "change-password",
            "--user",
            "ibmuser",
            "--old-password",
            "old",
            "--new-password",
            "new",
        ])
        .unwrap();
        let AuthCommand::ChangePassword(args) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.user.as_deref(), Some("ibmuser"));
        assert_eq!(args.old_password.as_deref(), Some("old"));
        assert_eq!(args.new_password.as_deref(), Some("new"));
    }

    #[test]
    fn test_basic_only_clears_token_fields() {
        let connection = ResolvedConnection {
            user: Some("ibmuser".to_string()),
            token_type: Some("jwtToken".to_string()),
            token_value: Some("abc".to_string()),
            ..Default::default()
        };
        let basic = basic_only(&connection);
        assert_eq!(basic.user.as_deref(), Some("ibmuser"));
        assert!(basic.token_type.is_none());
        assert!(basic.token_value.is_none());
    }
}
