//! Start a TSO address space.
//!
//! `POST /zosmf/tsoApp/tso?acct=&proc=&chset=&cpage=&rows=&cols=&rsize=`

use crate::send;
use crate::types::{
    StartStopResponse, StartTsoParms, ZosmfTsoResponse, DEFAULT_CHSET, DEFAULT_COLS,
    DEFAULT_CPAGE, DEFAULT_PROC, DEFAULT_ROWS, DEFAULT_RSIZE,
};
use reqwest::Method;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

pub(crate) const RESOURCE: &str = "/zosmf/tsoApp/tso";

/// Build the start query. Every parameter is always present, unset
/// ones at their default, in the order the service documents them.
fn resources_query(account: &str, parms: &StartTsoParms) -> String {
    format!(
        "{}?acct={}&proc={}&chset={}&cpage={}&rows={}&cols={}&rsize={}",
        RESOURCE,
        encode_uri_component(account),
        encode_uri_component(parms.logon_procedure.as_deref().unwrap_or(DEFAULT_PROC)),
        encode_uri_component(parms.character_set.as_deref().unwrap_or(DEFAULT_CHSET)),
        encode_uri_component(parms.code_page.as_deref().unwrap_or(DEFAULT_CPAGE)),
        parms.rows.unwrap_or(DEFAULT_ROWS),
        parms.columns.unwrap_or(DEFAULT_COLS),
        parms.region_size.unwrap_or(DEFAULT_RSIZE),
    )
}

fn validate_account(account: &str) -> Result<()> {
    if account.trim().is_empty() {
        return Err(ZosmfError::validation("TSO account number is required"));
    }
    Ok(())
}

/// Issue the start request and return the raw server response.
pub async fn start_tso_common(
    session: &ZosmfSession,
    account: &str,
    parms: &StartTsoParms,
) -> Result<ZosmfTsoResponse> {
    validate_account(account)?;
    let resource = resources_query(account, parms);
    tracing::debug!(%account, "starting TSO address space");
    session
        .send_json(session.request(Method::POST, &resource)?)
        .await
}

/// Start an address space and drain its startup messages until the
/// logon prompt arrives.
pub async fn start_tso(
    session: &ZosmfSession,
    account: &str,
    parms: &StartTsoParms,
) -> Result<StartStopResponse> {
    let zosmf_response = start_tso_common(session, account, parms).await?;
    let servlet_key = zosmf_response.servlet_key.clone();

    let mut response = StartStopResponse {
        success: servlet_key.is_some(),
        servlet_key,
        ..Default::default()
    };
    if response.success {
        let collected = send::get_all_responses(session, zosmf_response.clone()).await?;
        response.messages = collected.messages;
        // The first document is the start reply itself; only the
        // follow-ups belong in collected_responses.
        response.collected_responses = collected.tsos.into_iter().skip(1).collect();
    }
    response.zosmf_tso_response = zosmf_response;
    Ok(response)
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

    #[test]
    fn test_query_uses_defaults_in_documented_order() {
        let query = resources_query("DEFAULT", &StartTsoParms::default());
        assert_eq!(
            query,
            "/zosmf/tsoApp/tso?acct=DEFAULT&proc=IZUFPROC&chset=697&cpage=1047&rows=24&cols=80&rsize=4096"
        );
    }

    #[test]
    fn test_query_keeps_caller_overrides() {
        let query = resources_query(
            "ACCT#1",
            &StartTsoParms {
                logon_procedure: Some("MYPROC".to_string()),
                rows: Some(60),
                ..Default::default()
            },
        );
        assert_eq!(
            query,
            "/zosmf/tsoApp/tso?acct=ACCT%231&proc=MYPROC&chset=697&cpage=1047&rows=60&cols=80&rsize=4096"
        );
    }

    #[tokio::test]
    async fn test_start_drains_messages_until_prompt() {
        let server = MockServer::start_async().await;
        let start = server.mock(|when, then| {
            when.method(POST)
                .path("/zosmf/tsoApp/tso")
                .query_param("acct", "DEFAULT")
                .query_param("proc", "IZUFPROC");
            then.status(200).json_body(json!({
                "servletKey": "ZOSMFAD-SYS2-55-aaakaaac",
                "queueID": "4",
                "ver": "0100",
                "reused": false,
                "timeout": false,
                "tsoData": [{
                    "TSO MESSAGE": { "VERSION": "0100", "DATA": "LOGON IN PROGRESS" }
                }]
            }));
        });
        let poll = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/tsoApp/tso/ZOSMFAD-SYS2-55-aaakaaac");
            then.status(200).json_body(json!({
                "servletKey": "ZOSMFAD-SYS2-55-aaakaaac",
                "tsoData": [
                    { "TSO MESSAGE": { "VERSION": "0100", "DATA": "READY" } },
                    { "TSO PROMPT": { "VERSION": "0100", "DATA": "" } }
                ]
            }));
        });

        let response = start_tso(&session_for(&server), "DEFAULT", &StartTsoParms::default())
            .await
            .unwrap();
        start.assert();
        poll.assert();
        assert!(response.success);
        assert_eq!(response.servlet_key.as_deref(), Some("ZOSMFAD-SYS2-55-aaakaaac"));
        assert_eq!(response.messages, "LOGON IN PROGRESS\nREADY\n");
        assert_eq!(response.collected_responses.len(), 1);
    }

    #[tokio::test]
    async fn test_start_without_servlet_key_reports_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/zosmf/tsoApp/tso");
            then.status(200).json_body(json!({
                "ver": "0100",
                "reused": false,
                "timeout": false,
                "msgData": [{ "messageText": "IZUG1112E: unable to allocate", "messageId": "IZUG1112E" }]
            }));
        });

        let response = start_tso(&session_for(&server), "DEFAULT", &StartTsoParms::default())
            .await
            .unwrap();
        assert!(!response.success);
        assert!(response.collected_responses.is_empty());
        assert_eq!(
            response.zosmf_tso_response.message_text(),
            Some("IZUG1112E: unable to allocate")
        );
    }

    #[tokio::test]
    async fn test_start_requires_account() {
        let server = MockServer::start_async().await;
        let err = start_tso(&session_for(&server), " ", &StartTsoParms::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }
}
