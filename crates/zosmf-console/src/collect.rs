//! Collect solicited messages left on a console after an issue.
//!
//! `GET /zosmf/restconsoles/consoles/<name>/solmsgs/<key>`, repeated
//! until the configured number of consecutive empty fetches.

use crate::issue::{validate_console_name, RESOURCE};
use crate::types::{
    CollectParms, ConsoleResponse, ZosmfIssueResponse, DEFAULT_CONSOLE,
    DEFAULT_FOLLOW_UP_ATTEMPTS,
};
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

/// Fetch one follow-up document for a response key.
pub async fn collect_common(
    session: &ZosmfSession,
    console_name: &str,
    command_response_key: &str,
) -> Result<ZosmfIssueResponse> {
    validate_console_name(console_name)?;
    if command_response_key.trim().is_empty() {
        return Err(ZosmfError::validation("command response key is required"));
    }
    let resource = format!(
        "{}/{}/solmsgs/{}",
        RESOURCE,
        encode_uri_component(console_name),
        encode_uri_component(command_response_key)
    );
    session.get_json(&resource).await
}

/// Collect follow-up messages into a fresh [`ConsoleResponse`].
pub async fn collect_response(
    session: &ZosmfSession,
    parms: &CollectParms,
) -> Result<ConsoleResponse> {
    let mut response = ConsoleResponse::default();
    collect_into(session, parms, &mut response).await?;
    Ok(response)
}

/// Collect follow-up messages into an existing response, for example
/// the one returned by an issue. Every fetched document is recorded;
/// a fetch that carries output resets the countdown of remaining
/// attempts, so collection ends after `follow_up_attempts` consecutive
/// empty fetches. On error the documents collected so far stay in
/// `response`.
pub async fn collect_into(
    session: &ZosmfSession,
    parms: &CollectParms,
    response: &mut ConsoleResponse,
) -> Result<()> {
    let console = parms.console_name.as_deref().unwrap_or(DEFAULT_CONSOLE);
    let attempts = parms
        .follow_up_attempts
        .unwrap_or(DEFAULT_FOLLOW_UP_ATTEMPTS)
        .max(1);
    let key = parms.command_response_key.as_str();
    tracing::debug!(console = %console, %key, attempts, "collecting solicited messages");

    let mut remaining = attempts;
    while remaining > 0 {
        if let Some(pause) = parms.wait_to_collect {
            tokio::time::sleep(pause).await;
        }
        let chunk = collect_common(session, console, key).await?;
        remaining = next_remaining(chunk.has_output(), remaining, attempts);
        response.absorb(chunk);
    }
    Ok(())
}

/// Attempts left after one fetch. Output restarts the countdown, so
/// only consecutive empty fetches drain it.
fn next_remaining(had_output: bool, remaining: u32, attempts: u32) -> u32 {
    if had_output {
        attempts
    } else {
        remaining - 1
    }
}
