//! Issue a TSO command inside a short-lived address space.

use crate::send::send_data_to_tso_collect;
use crate::start::start_tso;
use crate::stop::stop_tso;
use crate::types::{IssueResponse, StartStopResponse, StartTsoParms};
use zosmf_sdk::{Result, ZosmfError, ZosmfSession};

fn start_ready(start: &StartStopResponse) -> bool {
    start.zosmf_tso_response.has_prompt()
        || start.collected_responses.iter().any(|tso| tso.has_prompt())
}

/// Start an address space, run one command, and stop the address
/// space again, returning everything the command printed.
pub async fn issue_tso_command(
    session: &ZosmfSession,
    account: &str,
    command: &str,
    parms: &StartTsoParms,
) -> Result<IssueResponse> {
    if command.trim().is_empty() {
        return Err(ZosmfError::validation("TSO command text is required"));
    }
    let start_response = start_tso(session, account, parms).await?;
    let Some(servlet_key) = start_response.servlet_key.clone() else {
        let detail = start_response
            .zosmf_tso_response
            .message_text()
            .map(|text| format!(": {text}"))
            .unwrap_or_default();
        return Err(ZosmfError::invalid_response(format!(
            "TSO address space failed to start{detail}"
        )));
    };

    tracing::debug!(servlet_key, command, "issuing TSO command");
    let send_response = send_data_to_tso_collect(session, &servlet_key, command).await?;
    let stop_response = stop_tso(session, &servlet_key).await?;

    Ok(IssueResponse {
        success: send_response.success && stop_response.success,
        start_ready: start_ready(&start_response),
        start_response,
        zosmf_responses: send_response.zosmf_responses,
        command_response: send_response.command_response,
        stop_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use zosmf_sdk::{ZosmfAuth, ZosmfConnection};

    fn session_for(server: &MockServer) -> ZosmfSession {
        ZosmfSession::new(
            ZosmfConnection::from_url(&server.base_url()).unwrap(),
            ZosmfAuth::None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issue_runs_start_send_stop_sequence() {
        let server = MockServer::start_async().await;
        let start = server.mock(|when, then| {
            when.method(POST).path("/zosmf/tsoApp/tso");
            then.status(200).json_body(json!({
                "servletKey": "KEY-9",
                "tsoData": [
                    { "TSO MESSAGE": { "VERSION": "0100", "DATA": "READY" } },
                    { "TSO PROMPT": { "VERSION": "0100", "DATA": "" } }
                ]
            }));
        });
        let send = server.mock(|when, then| {
            when.method(PUT).path("/zosmf/tsoApp/tso/KEY-9");
            then.status(200).json_body(json!({
                "servletKey": "KEY-9",
                "tsoData": [
                    { "TSO MESSAGE": { "VERSION": "0100", "DATA": "IKJ56650I TIME-12:00:00" } },
                    { "TSO PROMPT": { "VERSION": "0100", "DATA": "" } }
                ]
            }));
        });
        let stop = server.mock(|when, then| {
            when.method(DELETE).path("/zosmf/tsoApp/tso/KEY-9");
            then.status(200).json_body(json!({ "servletKey": "KEY-9" }));
        });

        let response = issue_tso_command(
            &session_for(&server),
            "DEFAULT",
            "TIME",
            &StartTsoParms::default(),
        )
        .await
        .unwrap();
        start.assert();
        send.assert();
        stop.assert();
        assert!(response.success);
        assert!(response.start_ready);
        assert_eq!(response.command_response, "IKJ56650I TIME-12:00:00\n");
        assert_eq!(
            response.stop_response.servlet_key.as_deref(),
            Some("KEY-9")
        );
    }

    #[tokio::test]
    async fn test_issue_fails_when_address_space_does_not_start() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/zosmf/tsoApp/tso");
            then.status(200).json_body(json!({
                "ver": "0100",
                "msgData": [{
                    "messageText": "IZUG1126E: z/OSMF is unable to create the address space",
                    "messageId": "IZUG1126E"
                }]
            }));
        });

        let err = issue_tso_command(
            &session_for(&server),
            "DEFAULT",
            "TIME",
            &StartTsoParms::default(),
        )
        .await
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TSO address space failed to start"));
        assert!(message.contains("IZUG1126E"));
    }

    #[tokio::test]
    async fn test_issue_requires_command_text() {
        let server = MockServer::start_async().await;
        let err = issue_tso_command(
            &session_for(&server),
            "DEFAULT",
            "  ",
            &StartTsoParms::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }
}
