//! Client for the `/zosmf/resttopology/systems` endpoint, which lists
//! the systems defined to the local z/OSMF instance.

use crate::error::Result;
use crate::session::ZosmfSession;
use serde::{Deserialize, Serialize};

const RESOURCE: &str = "/zosmf/resttopology/systems";

/// One system entry from the defined-systems table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinedSystem {
    #[serde(rename = "systemNickName")]
    pub system_nickname: Option<String>,
    #[serde(rename = "systemName")]
    pub system_name: Option<String>,
    #[serde(rename = "groupNames")]
    pub group_names: Option<String>,
    #[serde(rename = "cpcName")]
    pub cpc_name: Option<String>,
    #[serde(rename = "cpcSerial")]
    pub cpc_serial: Option<String>,
    #[serde(rename = "zosVR")]
    pub zos_vr: Option<String>,
    #[serde(rename = "jesType")]
    pub jes_type: Option<String>,
    #[serde(rename = "jesMemberName")]
    pub jes_member_name: Option<String>,
    #[serde(rename = "sysplexName")]
    pub sysplex_name: Option<String>,
    #[serde(rename = "httpProxyName")]
    pub http_proxy_name: Option<String>,
    #[serde(rename = "ftpDestinationName")]
    pub ftp_destination_name: Option<String>,
    pub url: Option<String>,
}

/// Reply shape of the defined-systems endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinedSystemsResponse {
    #[serde(rename = "numRows")]
    pub num_rows: u32,
    pub items: Vec<DefinedSystem>,
}

/// GET `/zosmf/resttopology/systems`.
pub async fn list_defined_systems(session: &ZosmfSession) -> Result<DefinedSystemsResponse> {
    let response: DefinedSystemsResponse = session.get_json(RESOURCE).await?;
    tracing::debug!(systems = response.num_rows, "listed defined systems");
    Ok(response)
}
