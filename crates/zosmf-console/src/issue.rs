//! Issue MVS commands through an EMCS console.
//!
//! `PUT /zosmf/restconsoles/consoles/<name>` with `{cmd, sol-key?,
//! system?, async?}`.

use crate::collect;
use crate::types::{
    CollectParms, ConsoleResponse, IssueParms, ZosmfIssueParms, ZosmfIssueResponse,
    DEFAULT_CONSOLE,
};
use reqwest::Method;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

pub(crate) const RESOURCE: &str = "/zosmf/restconsoles/consoles";

/// Console names are 1 to 8 alphanumerics. The default name passes.
pub(crate) fn validate_console_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 8
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ZosmfError::validation(format!(
            "console name \"{name}\" must be 1 to 8 alphanumeric characters"
        )))
    }
}

fn build_zosmf_parms(parms: &IssueParms) -> Result<ZosmfIssueParms> {
    if parms.command.trim().is_empty() {
        return Err(ZosmfError::validation("console command text is required"));
    }
    Ok(ZosmfIssueParms {
        cmd: parms.command.clone(),
        sol_key: parms.solicited_keyword.clone(),
        system: parms.sysplex_system.clone(),
        async_mode: parms.async_mode.then(|| "Y".to_string()),
    })
}

/// Send one command document to a named console and return the raw
/// server response.
pub async fn issue_common(
    session: &ZosmfSession,
    console_name: &str,
    parms: &ZosmfIssueParms,
) -> Result<ZosmfIssueResponse> {
    validate_console_name(console_name)?;
    let resource = format!("{}/{}", RESOURCE, encode_uri_component(console_name));
    tracing::debug!(console = %console_name, cmd = %parms.cmd, "issuing console command");
    session
        .send_json(session.request(Method::PUT, &resource)?.json(parms))
        .await
}

/// Issue a command and fold the immediate response into a
/// [`ConsoleResponse`].
pub async fn issue_command(session: &ZosmfSession, parms: &IssueParms) -> Result<ConsoleResponse> {
    let zosmf_parms = build_zosmf_parms(parms)?;
    let console = parms.console_name.as_deref().unwrap_or(DEFAULT_CONSOLE);
    let zosmf_response = issue_common(session, console, &zosmf_parms).await?;
    let mut response = ConsoleResponse::default();
    response.absorb(zosmf_response);
    Ok(response)
}

/// Issue a command on the default console with no extra parameters.
pub async fn issue_simple(session: &ZosmfSession, command: &str) -> Result<ConsoleResponse> {
    issue_command(
        session,
        &IssueParms {
            command: command.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Issue a command, then collect follow-up solicited messages until
/// the configured attempts run dry. Collection is skipped when the
/// issue returned no response key or already detected the solicited
/// keyword. The key in `collect_parms` is ignored; the one returned by
/// the issue is used.
pub async fn issue_and_collect(
    session: &ZosmfSession,
    issue_parms: &IssueParms,
    collect_parms: &CollectParms,
) -> Result<ConsoleResponse> {
    let mut response = issue_command(session, issue_parms).await?;
    let key = response.last_response_key.clone().unwrap_or_default();
    if !key.is_empty() && !response.keyword_detected {
        let parms = CollectParms {
            command_response_key: key,
            console_name: collect_parms
                .console_name
                .clone()
                .or_else(|| issue_parms.console_name.clone()),
            ..collect_parms.clone()
        };
        collect::collect_into(session, &parms, &mut response).await?;
    }
    Ok(response)
}
