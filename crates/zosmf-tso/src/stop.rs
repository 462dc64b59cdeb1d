//! Stop a TSO address space.
//!
//! `DELETE /zosmf/tsoApp/tso/{servletKey}`

use crate::start::RESOURCE;
use crate::types::{StartStopResponse, ZosmfTsoResponse};
use reqwest::Method;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

/// Issue the stop request and return the raw server response.
pub async fn stop_tso_common(
    session: &ZosmfSession,
    servlet_key: &str,
) -> Result<ZosmfTsoResponse> {
    if servlet_key.trim().is_empty() {
        return Err(ZosmfError::validation("TSO servlet key is required"));
    }
    let resource = format!("{}/{}", RESOURCE, encode_uri_component(servlet_key));
    tracing::debug!(servlet_key, "stopping TSO address space");
    session
        .send_json(session.request(Method::DELETE, &resource)?)
        .await
}

/// Stop an address space and report the outcome.
pub async fn stop_tso(session: &ZosmfSession, servlet_key: &str) -> Result<StartStopResponse> {
    let zosmf_response = stop_tso_common(session, servlet_key).await?;
    Ok(StartStopResponse {
        success: true,
        servlet_key: zosmf_response.servlet_key.clone(),
        zosmf_tso_response: zosmf_response,
        ..Default::default()
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
    async fn test_stop_deletes_servlet_resource() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/zosmf/tsoApp/tso/ZOSMFAD-SYS2-55-aaakaaac");
            then.status(200).json_body(json!({
                "servletKey": "ZOSMFAD-SYS2-55-aaakaaac",
                "ver": "0100",
                "reused": false,
                "timeout": false
            }));
        });

        let response = stop_tso(&session_for(&server), "ZOSMFAD-SYS2-55-aaakaaac")
            .await
            .unwrap();
        mock.assert();
        assert!(response.success);
        assert_eq!(response.servlet_key.as_deref(), Some("ZOSMFAD-SYS2-55-aaakaaac"));
    }

    #[tokio::test]
    async fn test_stop_requires_servlet_key() {
        let server = MockServer::start_async().await;
        let err = stop_tso(&session_for(&server), "  ").await.unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }
}
