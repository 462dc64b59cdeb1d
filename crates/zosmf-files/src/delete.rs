//! Clients for the delete endpoints of the file REST interface.
//!
//! Data sets, USS entries, and z/OS file systems go through plain
//! `DELETE` requests; VSAM clusters are removed with an IDCAMS `DELETE`
//! command through [`invoke_ams`].

use crate::invoke::{invoke_ams, AmsResponse};
use crate::util::{dataset_resource, uss_resource, RESOURCE};
use reqwest::Method;
use zosmf_sdk::{encode_uri_component, headers, Result, ZosmfError, ZosmfSession};

/// Delete a data set, or one copy of it when a volume is given.
pub async fn delete_data_set(
    session: &ZosmfSession,
    data_set_name: &str,
    volume: Option<&str>,
    response_timeout: Option<u32>,
) -> Result<()> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let resource = dataset_resource(data_set_name, volume);
    tracing::debug!(%resource, "deleting data set");
    let mut builder = session.request(Method::DELETE, &resource)?;
    if let Some(timeout) = response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    session.send_discard(builder).await?;
    tracing::info!(data_set = %data_set_name, "data set deleted");
    Ok(())
}

/// Options for removing a VSAM cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteVsamOptions {
    /// Overwrite the cluster's data with binary zeros.
    pub erase: bool,
    /// Delete even if the retention period has not expired.
    pub purge: bool,
}

/// Build the IDCAMS control statements that remove a VSAM cluster.
pub fn vsam_delete_statements(data_set_name: &str, options: DeleteVsamOptions) -> Vec<String> {
    vec![
        "DELETE -".to_string(),
        format!("{data_set_name} -"),
        "CLUSTER -".to_string(),
        format!("{} -", if options.erase { "ERASE" } else { "NOERASE" }),
        if options.purge { "PURGE" } else { "NOPURGE" }.to_string(),
    ]
}

/// Delete a VSAM cluster through IDCAMS.
pub async fn delete_vsam(
    session: &ZosmfSession,
    data_set_name: &str,
    options: DeleteVsamOptions,
) -> Result<AmsResponse> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let statements = vsam_delete_statements(data_set_name, options);
    tracing::debug!(data_set = %data_set_name, erase = options.erase, purge = options.purge, "deleting VSAM cluster");
    invoke_ams(session, &statements).await
}

/// Delete a USS file, or a directory tree when `recursive` is set.
pub async fn delete_uss_file(
    session: &ZosmfSession,
    uss_path: &str,
    recursive: bool,
    response_timeout: Option<u32>,
) -> Result<()> {
    if uss_path.trim().is_empty() {
        return Err(ZosmfError::validation("USS path is required"));
    }
    let resource = uss_resource(uss_path);
    tracing::debug!(%resource, recursive, "deleting USS entry");
    let mut builder = session.request(Method::DELETE, &resource)?;
    if recursive {
        builder = builder.header(headers::X_IBM_OPTION, "recursive");
    }
    if let Some(timeout) = response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    session.send_discard(builder).await?;
    tracing::info!(path = %uss_path, "USS entry deleted");
    Ok(())
}

/// Delete a z/OS file system aggregate.
pub async fn delete_zfs(
    session: &ZosmfSession,
    file_system_name: &str,
    response_timeout: Option<u32>,
) -> Result<()> {
    if file_system_name.trim().is_empty() {
        return Err(ZosmfError::validation("file system name is required"));
    }
    let resource = format!(
        "{RESOURCE}/mfs/zfs/{}",
        encode_uri_component(file_system_name)
    );
    tracing::debug!(%resource, "deleting file system");
    let mut builder = session.request(Method::DELETE, &resource)?;
    if let Some(timeout) = response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    session.send_discard(builder).await?;
    tracing::info!(file_system = %file_system_name, "file system deleted");
    Ok(())
}
