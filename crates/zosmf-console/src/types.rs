//! Request and response documents for the console REST service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Console name the server uses when the caller does not name one.
pub const DEFAULT_CONSOLE: &str = "defcn";
/// Follow-up message fetches per collect when no count is configured.
pub const DEFAULT_FOLLOW_UP_ATTEMPTS: u32 = 1;

/// Caller-facing parameters for issuing an MVS console command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueParms {
    /// The MVS command, for example `D IPLINFO`.
    pub command: String,
    /// EMCS console to issue through. Defaults to [`DEFAULT_CONSOLE`].
    pub console_name: Option<String>,
    /// Keyword that marks the solicited portion of the response.
    pub solicited_keyword: Option<String>,
    /// Sysplex member to route the command to.
    pub sysplex_system: Option<String>,
    /// Issue asynchronously. The server acknowledges without waiting
    /// for command output.
    pub async_mode: bool,
}

/// Payload of `PUT /zosmf/restconsoles/consoles/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ZosmfIssueParms {
    pub cmd: String,
    #[serde(rename = "sol-key", skip_serializing_if = "Option::is_none")]
    pub sol_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub async_mode: Option<String>,
}

/// One response document from the console service. Follow-up fetches
/// return the same shape with only `cmd-response` filled in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZosmfIssueResponse {
    #[serde(rename = "cmd-response-key", skip_serializing_if = "Option::is_none")]
    pub cmd_response_key: Option<String>,
    #[serde(rename = "cmd-response-url", skip_serializing_if = "Option::is_none")]
    pub cmd_response_url: Option<String>,
    #[serde(rename = "cmd-response-uri", skip_serializing_if = "Option::is_none")]
    pub cmd_response_uri: Option<String>,
    #[serde(rename = "cmd-response", skip_serializing_if = "Option::is_none")]
    pub cmd_response: Option<String>,
    #[serde(rename = "sol-key-detected", skip_serializing_if = "Option::is_none")]
    pub sol_key_detected: Option<bool>,
}

impl ZosmfIssueResponse {
    /// True when the document carries command output text.
    pub fn has_output(&self) -> bool {
        self.cmd_response.as_deref().is_some_and(|text| !text.is_empty())
    }
}

/// Parameters for collecting solicited messages left on the console.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectParms {
    /// Response key from a previous issue.
    pub command_response_key: String,
    /// EMCS console the command was issued through.
    pub console_name: Option<String>,
    /// Consecutive empty fetches tolerated before giving up. A fetch
    /// that returns output resets the countdown. Defaults to
    /// [`DEFAULT_FOLLOW_UP_ATTEMPTS`].
    pub follow_up_attempts: Option<u32>,
    /// Pause before each follow-up fetch.
    pub wait_to_collect: Option<Duration>,
}

/// Accumulated result of an issue and any follow-up collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsoleResponse {
    /// True once at least one server response has been folded in.
    pub success: bool,
    /// Every raw document received, in arrival order.
    pub zosmf_responses: Vec<ZosmfIssueResponse>,
    /// Command output concatenated across responses, with the
    /// carriage returns the console emits rewritten as newlines.
    pub command_response: String,
    /// Response key of the latest document that carried one. Used for
    /// follow-up collection.
    pub last_response_key: Option<String>,
    /// True once any response reported the solicited keyword.
    pub keyword_detected: bool,
}

impl ConsoleResponse {
    /// Fold one server document into the accumulated response.
    pub(crate) fn absorb(&mut self, zosmf: ZosmfIssueResponse) {
        self.success = true;
        if let Some(text) = zosmf.cmd_response.as_deref() {
            if !text.is_empty() {
                self.command_response.push_str(&text.replace('\r', "\n"));
                if !self.command_response.ends_with('\n') {
                    self.command_response.push('\n');
                }
            }
        }
        if let Some(key) = &zosmf.cmd_response_key {
            self.last_response_key = Some(key.clone());
        }
        if zosmf.sol_key_detected == Some(true) {
            self.keyword_detected = true;
        }
        self.zosmf_responses.push(zosmf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_concatenates_and_normalizes_line_ends() {
        let mut response = ConsoleResponse::default();
        response.absorb(ZosmfIssueResponse {
            cmd_response_key: Some("C1046283".to_string()),
            cmd_response: Some(" IEE254I  09.00.16\r  SYSTEM IPLED".to_string()),
            ..Default::default()
        });
        response.absorb(ZosmfIssueResponse {
            cmd_response: Some("Part two\r  more data\r".to_string()),
            ..Default::default()
        });

        assert!(response.success);
        assert_eq!(response.zosmf_responses.len(), 2);
        assert_eq!(response.last_response_key.as_deref(), Some("C1046283"));
        assert_eq!(
            response.command_response,
            " IEE254I  09.00.16\n  SYSTEM IPLED\nPart two\n  more data\n"
        );
    }

    #[test]
    fn test_absorb_keeps_empty_documents_out_of_the_text() {
        let mut response = ConsoleResponse::default();
        response.absorb(ZosmfIssueResponse {
            cmd_response: Some(String::new()),
            ..Default::default()
        });
        assert!(response.success);
        assert_eq!(response.zosmf_responses.len(), 1);
        assert!(response.command_response.is_empty());
        assert_eq!(response.last_response_key, None);
    }

    #[test]
    fn test_absorb_latches_keyword_detection() {
        let mut response = ConsoleResponse::default();
        response.absorb(ZosmfIssueResponse {
            sol_key_detected: Some(true),
            ..Default::default()
        });
        response.absorb(ZosmfIssueResponse::default());
        assert!(response.keyword_detected);
    }

    #[test]
    fn test_issue_payload_skips_unset_fields() {
        let parms = ZosmfIssueParms {
            cmd: "D IPLINFO".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_string(&parms).unwrap();
        assert_eq!(body, r#"{"cmd":"D IPLINFO"}"#);
    }
}
