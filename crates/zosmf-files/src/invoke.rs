//! Client for `PUT /zosmf/restfiles/ams`, which runs IDCAMS access
//! method services control statements.

use crate::util::RESOURCE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use zosmf_sdk::{Result, ZosmfError, ZosmfSession};

/// Longest control statement IDCAMS accepts from this interface.
pub const MAX_AMS_STATEMENT_LENGTH: usize = 255;

#[derive(Serialize)]
struct AmsRequest {
    input: Vec<String>,
}

/// Output of an IDCAMS run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AmsResponse {
    pub rc: i32,
    pub output: Vec<String>,
    #[serde(rename = "JSONversion")]
    pub json_version: Option<u32>,
}

/// Run the given control statements through IDCAMS. Statements are
/// uppercased before submission; each must fit in
/// [`MAX_AMS_STATEMENT_LENGTH`] characters.
pub async fn invoke_ams(session: &ZosmfSession, statements: &[String]) -> Result<AmsResponse> {
    if statements.is_empty() || statements.iter().all(|statement| statement.trim().is_empty()) {
        return Err(ZosmfError::validation(
            "at least one IDCAMS control statement is required",
        ));
    }
    let mut input = Vec::with_capacity(statements.len());
    for (index, statement) in statements.iter().enumerate() {
        if statement.len() > MAX_AMS_STATEMENT_LENGTH {
            return Err(ZosmfError::validation(format!(
                "IDCAMS statement {} is longer than {MAX_AMS_STATEMENT_LENGTH} characters",
                index + 1
            )));
        }
        input.push(statement.to_uppercase());
    }
    tracing::debug!(statements = input.len(), "invoking IDCAMS");
    let builder = session
        .request(Method::PUT, &format!("{RESOURCE}/ams"))?
        .json(&AmsRequest { input });
    let response: AmsResponse = session.send_json(builder).await?;
    tracing::debug!(rc = response.rc, "IDCAMS completed");
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

    #[tokio::test]
    async fn test_invoke_ams_uppercases_statements() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restfiles/ams")
                .json_body(json!({"input": ["DEFINE CLUSTER (NAME('A.B') DUMMY)"]}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"rc": 0, "output": ["IDCAMS  SYSTEM SERVICES"], "JSONversion": 1}));
        });

        let response = invoke_ams(
            &session_for(&server),
            &["define cluster (name('A.B') dummy)".to_string()],
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(response.rc, 0);
        assert_eq!(response.output.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_ams_rejects_long_statement() {
        let server = MockServer::start_async().await;
        let long = "A".repeat(MAX_AMS_STATEMENT_LENGTH + 1);
        let err = invoke_ams(&session_for(&server), &[long]).await.unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
        assert!(err.to_string().contains("longer than 255"));
    }

    #[tokio::test]
    async fn test_invoke_ams_rejects_empty_input() {
        let server = MockServer::start_async().await;
        let err = invoke_ams(&session_for(&server), &[]).await.unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }
}
