//! Request and response documents for the TSO address space service.

use serde::{Deserialize, Serialize};

/// Logon procedure used when the caller does not name one.
pub const DEFAULT_PROC: &str = "IZUFPROC";
/// Default character set (697 is Latin-1 country extended).
pub const DEFAULT_CHSET: &str = "697";
/// Default EBCDIC code page.
pub const DEFAULT_CPAGE: &str = "1047";
pub const DEFAULT_ROWS: u32 = 24;
pub const DEFAULT_COLS: u32 = 80;
/// Default region size in kilobytes.
pub const DEFAULT_RSIZE: u32 = 4096;

/// Address space settings for starting TSO. Unset fields fall back to
/// the documented defaults; the account number is passed separately
/// because it has no default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartTsoParms {
    pub logon_procedure: Option<String>,
    pub character_set: Option<String>,
    pub code_page: Option<String>,
    pub rows: Option<u32>,
    pub columns: Option<u32>,
    /// Region size in kilobytes.
    pub region_size: Option<u32>,
}

/// One TSO data entry. The server keys each entry by its kind, so at
/// most one of the two fields is present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TsoMessages {
    #[serde(rename = "TSO MESSAGE", skip_serializing_if = "Option::is_none")]
    pub tso_message: Option<TsoMessage>,
    #[serde(rename = "TSO PROMPT", skip_serializing_if = "Option::is_none")]
    pub tso_prompt: Option<TsoMessage>,
}

/// Versioned text payload inside a [`TsoMessages`] entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TsoMessage {
    #[serde(rename = "VERSION")]
    pub version: String,
    #[serde(rename = "DATA")]
    pub data: String,
}

/// Diagnostic entry the server attaches to failed TSO requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZosmfMessage {
    #[serde(rename = "messageText", skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "stackTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// One response document from the TSO service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZosmfTsoResponse {
    #[serde(rename = "servletKey", skip_serializing_if = "Option::is_none")]
    pub servlet_key: Option<String>,
    #[serde(rename = "queueID", skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    pub reused: bool,
    pub timeout: bool,
    #[serde(rename = "sessionID", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "tsoData", skip_serializing_if = "Vec::is_empty")]
    pub tso_data: Vec<TsoMessages>,
    #[serde(rename = "msgData", skip_serializing_if = "Vec::is_empty")]
    pub msg_data: Vec<ZosmfMessage>,
}

impl ZosmfTsoResponse {
    /// True when any data entry is a prompt, meaning the address
    /// space is ready for input.
    pub fn has_prompt(&self) -> bool {
        self.tso_data.iter().any(|entry| entry.tso_prompt.is_some())
    }

    /// First diagnostic text, when the server attached any.
    pub fn message_text(&self) -> Option<&str> {
        self.msg_data
            .iter()
            .find_map(|message| message.message_text.as_deref())
    }
}

/// Follow-up documents drained from the address space, with the
/// message text already extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedResponses {
    pub tsos: Vec<ZosmfTsoResponse>,
    /// Concatenated `TSO MESSAGE` text, one line per message.
    pub messages: String,
    /// True when draining ended on a prompt rather than on silence.
    pub prompt_received: bool,
}

/// Outcome of starting or stopping an address space.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartStopResponse {
    /// True when the server handed back a servlet key.
    pub success: bool,
    /// The immediate response to the start or stop request.
    pub zosmf_tso_response: ZosmfTsoResponse,
    /// Follow-up documents drained after a start, until the logon
    /// prompt. Empty for stop.
    pub collected_responses: Vec<ZosmfTsoResponse>,
    pub servlet_key: Option<String>,
    /// Message text drained along with `collected_responses`.
    pub messages: String,
}

/// Outcome of sending data to a running address space and draining
/// the replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendResponse {
    pub success: bool,
    /// Every document received, the reply to the send first.
    pub zosmf_responses: Vec<ZosmfTsoResponse>,
    /// Concatenated message text up to the prompt.
    pub command_response: String,
}

/// Full record of a start, command, stop round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueResponse {
    pub success: bool,
    pub start_response: StartStopResponse,
    /// True when the address space reached its prompt during startup.
    pub start_ready: bool,
    /// Documents received for the command itself.
    pub zosmf_responses: Vec<ZosmfTsoResponse>,
    pub command_response: String,
    pub stop_response: StartStopResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tso_response_wire_shape() {
        let body = json!({
            "servletKey": "ZOSMFAD-SYS2-55-aaakaaac",
            "queueID": "4",
            "ver": "0100",
            "reused": false,
            "timeout": false,
            "sessionID": "0x37",
            "tsoData": [{
                "TSO MESSAGE": {
                    "VERSION": "0100",
                    "DATA": "ZOSMFAD LOGON IN PROGRESS AT 01:12:04 ON JULY 17, 2017"
                }
            }]
        });
        let response: ZosmfTsoResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.servlet_key.as_deref(), Some("ZOSMFAD-SYS2-55-aaakaaac"));
        assert_eq!(response.queue_id.as_deref(), Some("4"));
        assert_eq!(response.session_id.as_deref(), Some("0x37"));
        assert!(!response.has_prompt());
        let message = response.tso_data[0].tso_message.as_ref().unwrap();
        assert!(message.data.contains("LOGON IN PROGRESS"));
    }

    #[test]
    fn test_prompt_entry_is_detected() {
        let body = json!({
            "servletKey": "key",
            "tsoData": [
                { "TSO MESSAGE": { "VERSION": "0100", "DATA": "READY" } },
                { "TSO PROMPT": { "VERSION": "0100", "DATA": "" } }
            ]
        });
        let response: ZosmfTsoResponse = serde_json::from_value(body).unwrap();
        assert!(response.has_prompt());
    }

    #[test]
    fn test_failure_diagnostics_are_exposed() {
        let body = json!({
            "servletKey": "ZOSMFAD-SYS2-55-aaakaaac",
            "ver": "0100",
            "reused": false,
            "timeout": false,
            "msgData": [{
                "messageText": "IZUG1126E: z/OSMF cannot correlate the request",
                "messageId": "IZUG1126E",
                "stackTrace": "Exception error"
            }]
        });
        let response: ZosmfTsoResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            response.message_text(),
            Some("IZUG1126E: z/OSMF cannot correlate the request")
        );
    }
}
