//! Send data to a TSO address space and collect its replies.
//!
//! `PUT /zosmf/tsoApp/tso/{servletKey}` carries the input line, and
//! `GET` on the same resource drains queued output until the service
//! reports a prompt.

use crate::start::RESOURCE;
use crate::types::{CollectedResponses, SendResponse, ZosmfTsoResponse};
use reqwest::Method;
use serde_json::json;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

fn servlet_resource(servlet_key: &str) -> Result<String> {
    if servlet_key.trim().is_empty() {
        return Err(ZosmfError::validation("TSO servlet key is required"));
    }
    Ok(format!("{}/{}", RESOURCE, encode_uri_component(servlet_key)))
}

/// Send one line of input to the address space and return the raw
/// server response.
pub async fn send_data_to_tso(
    session: &ZosmfSession,
    servlet_key: &str,
    data: &str,
) -> Result<ZosmfTsoResponse> {
    let resource = servlet_resource(servlet_key)?;
    let body = json!({
        "TSO RESPONSE": { "VERSION": "0100", "DATA": data }
    });
    tracing::debug!(servlet_key, "sending data to TSO");
    session
        .send_json(session.request(Method::PUT, &resource)?.json(&body))
        .await
}

/// Fetch queued output for the address space.
async fn receive(session: &ZosmfSession, servlet_key: &str) -> Result<ZosmfTsoResponse> {
    let resource = servlet_resource(servlet_key)?;
    session.get_json(&resource).await
}

/// Starting from `first`, keep polling the address space until a TSO
/// prompt arrives. Every response document is retained, and message
/// text is concatenated one line per TSO MESSAGE entry.
pub async fn get_all_responses(
    session: &ZosmfSession,
    first: ZosmfTsoResponse,
) -> Result<CollectedResponses> {
    let mut collected = CollectedResponses::default();
    let mut tso = first;
    loop {
        for entry in &tso.tso_data {
            if let Some(message) = &entry.tso_message {
                collected.messages.push_str(&message.data);
                collected.messages.push('\n');
            }
        }
        let done = tso.has_prompt();
        let servlet_key = tso.servlet_key.clone();
        let drained = tso.tso_data.is_empty();
        collected.tsos.push(tso);
        if done {
            collected.prompt_received = true;
            return Ok(collected);
        }
        // No key or no queued output means there is nothing left to poll.
        let Some(key) = servlet_key else {
            return Ok(collected);
        };
        if drained {
            return Ok(collected);
        }
        tso = receive(session, &key).await?;
    }
}

/// Send an input line and collect everything the address space prints
/// back, through the next prompt.
pub async fn send_data_to_tso_collect(
    session: &ZosmfSession,
    servlet_key: &str,
    data: &str,
) -> Result<SendResponse> {
    let put_response = send_data_to_tso(session, servlet_key, data).await?;
    let collected = get_all_responses(session, put_response).await?;
    Ok(SendResponse {
        success: collected.prompt_received,
        zosmf_responses: collected.tsos,
        command_response: collected.messages,
    })
}
