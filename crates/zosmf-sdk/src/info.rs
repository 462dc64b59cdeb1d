//! Client for the `/zosmf/info` endpoint.
//!
//! The endpoint reports which z/OSMF and z/OS levels are running and
//! which plugins are configured. It answers without authentication on
//! most installations, which makes it the natural connectivity probe.

use crate::error::Result;
use crate::session::ZosmfSession;
use serde::{Deserialize, Serialize};

const RESOURCE: &str = "/zosmf/info";

/// Identity report for a z/OSMF instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZosmfInfo {
    pub zos_version: Option<String>,
    pub zosmf_port: Option<String>,
    pub zosmf_version: Option<String>,
    pub zosmf_hostname: Option<String>,
    pub zosmf_saf_realm: Option<String>,
    pub zosmf_full_version: Option<String>,
    pub api_version: Option<String>,
    pub plugins: Option<Vec<ZosmfPluginInfo>>,
}

/// One configured z/OSMF plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZosmfPluginInfo {
    #[serde(rename = "pluginVersion")]
    pub plugin_version: Option<String>,
    #[serde(rename = "pluginDefaultName")]
    pub plugin_default_name: Option<String>,
    #[serde(rename = "pluginStatus")]
    pub plugin_status: Option<String>,
}

/// GET `/zosmf/info`.
pub async fn get_zosmf_info(session: &ZosmfSession) -> Result<ZosmfInfo> {
    let info: ZosmfInfo = session.get_json(RESOURCE).await?;
    tracing::debug!(
        version = info.zosmf_version.as_deref().unwrap_or("unknown"),
        "retrieved z/OSMF instance information"
    );
    Ok(info)
}
