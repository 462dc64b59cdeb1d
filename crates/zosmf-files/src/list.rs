//! Clients for the list endpoints of the file REST interface.
//!
//! * `GET /zosmf/restfiles/ds?dslevel=<pattern>` lists catalog entries
//! * `GET /zosmf/restfiles/ds/<dsn>/member` lists PDS members
//! * `GET /zosmf/restfiles/fs?path=<path>` lists USS directory entries
//! * `GET /zosmf/restfiles/mfs` lists mounted file systems, filtered by
//!   aggregate name or by path

use crate::util::RESOURCE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use zosmf_sdk::{encode_uri_component, headers, Result, ZosmfError, ZosmfSession};

/// How z/OSMF should treat migrated data sets it encounters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigratedRecall {
    /// Recall the data set and wait for it.
    Wait,
    /// Kick off the recall but do not wait.
    NoWait,
    /// Fail the request instead of recalling.
    Error,
}

impl MigratedRecall {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::NoWait => "nowait",
            Self::Error => "error",
        }
    }
}

/// Options shared by the data set and member list operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Include full attributes for each entry.
    pub attributes: bool,
    /// Cap on returned rows; zero or unset means no cap.
    pub max_length: Option<u32>,
    /// Resume listing from this name.
    pub start: Option<String>,
    /// Restrict the catalog search to a volume serial.
    pub volume: Option<String>,
    /// Member name pattern, member lists only.
    pub pattern: Option<String>,
    pub recall: Option<MigratedRecall>,
    pub response_timeout: Option<u32>,
}

fn with_list_headers(
    mut builder: reqwest::RequestBuilder,
    attributes: bool,
    max_length: Option<u32>,
    recall: Option<MigratedRecall>,
    response_timeout: Option<u32>,
) -> reqwest::RequestBuilder {
    if attributes {
        builder = builder.header(headers::X_IBM_ATTRIBUTES, "base");
    }
    if let Some(max) = max_length {
        if max > 0 {
            builder = builder.header(headers::X_IBM_MAX_ITEMS, max.to_string());
        }
    }
    if let Some(recall) = recall {
        builder = builder.header(headers::X_IBM_MIGRATED_RECALL, recall.as_str());
    }
    if let Some(timeout) = response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    builder
}

/// One catalog entry. Attribute values arrive as strings on the wire,
/// including numeric-looking ones such as the block size, and are only
/// present when base attributes were requested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSetEntry {
    pub dsname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blksz: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catnm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsorg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsntp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lrecl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ovf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recfm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vols: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSetList {
    pub items: Vec<DataSetEntry>,
    #[serde(rename = "returnedRows")]
    pub returned_rows: u32,
    #[serde(rename = "totalRows", skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u32>,
    #[serde(rename = "moreRows", skip_serializing_if = "Option::is_none")]
    pub more_rows: Option<bool>,
    #[serde(rename = "JSONversion")]
    pub json_version: i32,
}

/// One PDS member. Statistics fields are only present when the member
/// has ISPF statistics and base attributes were requested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MemberEntry {
    pub member: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vers: Option<u32>,
    #[serde(rename = "mod", skip_serializing_if = "Option::is_none")]
    pub mod_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c4date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m4date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnorc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inorc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnorc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sclm: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MemberList {
    pub items: Vec<MemberEntry>,
    #[serde(rename = "returnedRows")]
    pub returned_rows: u32,
    #[serde(rename = "totalRows", skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u32>,
    #[serde(rename = "moreRows", skip_serializing_if = "Option::is_none")]
    pub more_rows: Option<bool>,
    #[serde(rename = "JSONversion")]
    pub json_version: i32,
}

/// List catalog entries matching a dslevel pattern such as `IBMUSER.**`.
pub async fn list_data_sets(
    session: &ZosmfSession,
    pattern: &str,
    options: &ListOptions,
) -> Result<DataSetList> {
    if pattern.trim().is_empty() {
        return Err(ZosmfError::validation("data set name pattern is required"));
    }
    let mut resource = format!("{RESOURCE}/ds?dslevel={}", encode_uri_component(pattern));
    if let Some(volume) = &options.volume {
        resource.push_str(&format!("&volser={}", encode_uri_component(volume)));
    }
    if let Some(start) = &options.start {
        resource.push_str(&format!("&start={}", encode_uri_component(start)));
    }
    tracing::debug!(%resource, "listing data sets");
    let builder = with_list_headers(
        session.request(Method::GET, &resource)?,
        options.attributes,
        options.max_length,
        options.recall,
        options.response_timeout,
    );
    session.send_json(builder).await
}

/// List the members of a partitioned data set.
pub async fn list_all_members(
    session: &ZosmfSession,
    data_set_name: &str,
    options: &ListOptions,
) -> Result<MemberList> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let mut resource = format!("{RESOURCE}/ds/{}/member", encode_uri_component(data_set_name));
    let mut query = Vec::new();
    if let Some(pattern) = &options.pattern {
        query.push(format!("pattern={}", encode_uri_component(pattern)));
    }
    if let Some(start) = &options.start {
        query.push(format!("start={}", encode_uri_component(start)));
    }
    if !query.is_empty() {
        resource.push('?');
        resource.push_str(&query.join("&"));
    }
    tracing::debug!(%resource, "listing members");
    let builder = with_list_headers(
        session.request(Method::GET, &resource)?,
        options.attributes,
        options.max_length,
        options.recall,
        options.response_timeout,
    );
    session.send_json(builder).await
}

/// Filters for a USS directory listing. The name, group, user, size,
/// mtime, perm, and type filters select entries; depth, filesys, and
/// symlinks refine a selection and require at least one of the former.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UssListOptions {
    pub name: Option<String>,
    pub group: Option<String>,
    pub user: Option<String>,
    /// Size filter such as `+100` for larger-than.
    pub size: Option<String>,
    /// Modification time filter in days, such as `-7` for the last week.
    pub mtime: Option<String>,
    /// Octal permission mask to match.
    pub perm: Option<String>,
    /// Entry type letter: `c`, `d`, `f`, `l`, `p`, or `s`.
    pub entry_type: Option<String>,
    pub depth: Option<u32>,
    /// True crosses into other file systems, false stays on the same one.
    pub filesys: Option<bool>,
    /// True reports symlinks themselves, false follows them.
    pub symlinks: Option<bool>,
    pub max_length: Option<u32>,
    pub response_timeout: Option<u32>,
}

impl UssListOptions {
    fn has_primary_filter(&self) -> bool {
        self.group.is_some()
            || self.user.is_some()
            || self.name.is_some()
            || self.size.is_some()
            || self.mtime.is_some()
            || self.perm.is_some()
            || self.entry_type.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UssEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    /// Link target, reported when symlinks are not followed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UssList {
    pub items: Vec<UssEntry>,
    #[serde(rename = "returnedRows")]
    pub returned_rows: u32,
    #[serde(rename = "totalRows", skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u32>,
    #[serde(rename = "JSONversion")]
    pub json_version: i32,
}

/// List the entries under a USS directory.
pub async fn list_uss_files(
    session: &ZosmfSession,
    path: &str,
    options: &UssListOptions,
) -> Result<UssList> {
    if path.trim().is_empty() {
        return Err(ZosmfError::validation("USS path is required"));
    }
    if (options.depth.is_some() || options.filesys.is_some() || options.symlinks.is_some())
        && !options.has_primary_filter()
    {
        return Err(ZosmfError::validation(
            "depth, filesys, and symlinks require a name, group, user, size, mtime, perm, or type filter",
        ));
    }
    let mut path = path.trim();
    if path.len() > 1 {
        path = path.trim_end_matches('/');
    }

    let mut resource = format!("{RESOURCE}/fs?path={}", encode_uri_component(path));
    let mut push = |key: &str, value: String| {
        resource.push_str(&format!("&{key}={value}"));
    };
    if let Some(group) = &options.group {
        push("group", encode_uri_component(group));
    }
    if let Some(user) = &options.user {
        push("user", encode_uri_component(user));
    }
    if let Some(name) = &options.name {
        push("name", encode_uri_component(name));
    }
    if let Some(size) = &options.size {
        push("size", encode_uri_component(size));
    }
    if let Some(mtime) = &options.mtime {
        push("mtime", encode_uri_component(mtime));
    }
    if let Some(perm) = &options.perm {
        push("perm", encode_uri_component(perm));
    }
    if let Some(entry_type) = &options.entry_type {
        push("type", encode_uri_component(entry_type));
    }
    if let Some(depth) = options.depth {
        push("depth", depth.to_string());
    }
    if let Some(filesys) = options.filesys {
        push("filesys", if filesys { "all" } else { "same" }.to_string());
    }
    if let Some(symlinks) = options.symlinks {
        push("symlinks", if symlinks { "report" } else { "follow" }.to_string());
    }

    tracing::debug!(%resource, "listing USS files");
    let builder = with_list_headers(
        session.request(Method::GET, &resource)?,
        false,
        options.max_length,
        None,
        options.response_timeout,
    );
    session.send_json(builder).await
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZfsListOptions {
    pub max_length: Option<u32>,
    pub response_timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZfsEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fstname: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mode: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fstype: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bsize: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bavail: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readibc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writeibc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diribc: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZfsList {
    pub items: Vec<ZfsEntry>,
    #[serde(rename = "returnedRows")]
    pub returned_rows: u32,
    #[serde(rename = "totalRows", skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u32>,
    #[serde(rename = "JSONversion")]
    pub json_version: i32,
}

/// List mounted file systems, optionally only the named aggregate.
pub async fn list_zfs(
    session: &ZosmfSession,
    file_system_name: Option<&str>,
    options: &ZfsListOptions,
) -> Result<ZfsList> {
    let mut resource = format!("{RESOURCE}/mfs");
    if let Some(name) = file_system_name {
        resource.push_str(&format!("?fsname={}", encode_uri_component(name)));
    }
    tracing::debug!(%resource, "listing file systems");
    let builder = with_list_headers(
        session.request(Method::GET, &resource)?,
        false,
        options.max_length,
        None,
        options.response_timeout,
    );
    session.send_json(builder).await
}

/// List the file systems that serve a USS path.
pub async fn list_zfs_with_path(
    session: &ZosmfSession,
    path: Option<&str>,
    options: &ZfsListOptions,
) -> Result<ZfsList> {
    let mut resource = format!("{RESOURCE}/mfs");
    if let Some(path) = path {
        resource.push_str(&format!("?path={}", encode_uri_component(path)));
    }
    tracing::debug!(%resource, "listing file systems by path");
    let builder = with_list_headers(
        session.request(Method::GET, &resource)?,
        false,
        options.max_length,
        None,
        options.response_timeout,
    );
    session.send_json(builder).await
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
    async fn test_list_data_sets_with_attributes_and_volume() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/ds")
                .query_param("dslevel", "IBMUSER.**")
                .query_param("volser", "VOL001")
                .header(headers::X_IBM_ATTRIBUTES, "base")
                .header(headers::X_IBM_MIGRATED_RECALL, "nowait");
            then.status(200).json_body(json!({
                "items": [
                    {"dsname": "IBMUSER.DATA", "dsorg": "PS", "lrecl": "80", "vol": "VOL001", "migr": "NO"},
                    {"dsname": "IBMUSER.PDS", "dsorg": "PO", "lrecl": "80", "vol": "VOL001", "migr": "NO"}
                ],
                "returnedRows": 2,
                "JSONversion": 1
            }));
        });

        let list = list_data_sets(
            &session_for(&server),
            "IBMUSER.**",
            &ListOptions {
                attributes: true,
                volume: Some("VOL001".to_string()),
                recall: Some(MigratedRecall::NoWait),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(list.returned_rows, 2);
        assert_eq!(list.items[0].dsname, "IBMUSER.DATA");
        assert_eq!(list.items[1].dsorg.as_deref(), Some("PO"));
    }

    #[tokio::test]
    async fn test_list_members_with_pattern_and_start() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/ds/IBMUSER.PDS/member")
                .query_param("pattern", "A*")
                .query_param("start", "AB")
                .header(headers::X_IBM_MAX_ITEMS, "10");
            then.status(200).json_body(json!({
                "items": [{"member": "ABLE", "vers": 1, "mod": 2, "user": "IBMUSER"}],
                "returnedRows": 1,
                "moreRows": true,
                "JSONversion": 1
            }));
        });

        let list = list_all_members(
            &session_for(&server),
            "IBMUSER.PDS",
            &ListOptions {
                pattern: Some("A*".to_string()),
                start: Some("AB".to_string()),
                max_length: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(list.items[0].member, "ABLE");
        assert_eq!(list.items[0].mod_level, Some(2));
        assert_eq!(list.more_rows, Some(true));
    }

    #[tokio::test]
    async fn test_list_uss_files_builds_filter_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/fs")
                .query_param("path", "/u/ibmuser")
                .query_param("name", "*.txt")
                .query_param("depth", "2")
                .query_param("filesys", "same")
                .query_param("symlinks", "report");
            then.status(200).json_body(json!({
                "items": [
                    {"name": "notes.txt", "mode": "-rw-r--r--", "size": 20, "uid": 0,
                     "user": "IBMUSER", "gid": 1, "group": "OMVSGRP", "mtime": "2024-11-24T02:12:04"}
                ],
                "returnedRows": 1,
                "totalRows": 1,
                "JSONversion": 1
            }));
        });

        let list = list_uss_files(
            &session_for(&server),
            "/u/ibmuser/",
            &UssListOptions {
                name: Some("*.txt".to_string()),
                depth: Some(2),
                filesys: Some(false),
                symlinks: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(list.items[0].name, "notes.txt");
        assert_eq!(list.items[0].size, Some(20));
    }

    #[tokio::test]
    async fn test_list_uss_refinements_require_primary_filter() {
        let server = MockServer::start_async().await;
        let err = list_uss_files(
            &session_for(&server),
            "/u/ibmuser",
            &UssListOptions {
                depth: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_zfs_by_name_and_by_path() {
        let server = MockServer::start_async().await;
        let by_name = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/mfs")
                .query_param("fsname", "HLQ.ZFS");
            then.status(200).json_body(json!({
                "items": [{"name": "HLQ.ZFS", "mountpoint": "/u/ibmuser", "fstname": "ZFS",
                           "mode": ["rdonly"], "sysname": "S0W1"}],
                "returnedRows": 1,
                "JSONversion": 1
            }));
        });

        let list = list_zfs(&session_for(&server), Some("HLQ.ZFS"), &ZfsListOptions::default())
            .await
            .unwrap();
        by_name.assert();
        assert_eq!(list.items[0].mountpoint.as_deref(), Some("/u/ibmuser"));

        let by_path = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/mfs")
                .query_param("path", "/u/ibmuser");
            then.status(200).json_body(json!({
                "items": [{"name": "HLQ.ZFS", "mode": []}],
                "returnedRows": 1,
                "JSONversion": 1
            }));
        });
        let list = list_zfs_with_path(&session_for(&server), Some("/u/ibmuser"), &ZfsListOptions::default())
            .await
            .unwrap();
        by_path.assert();
        assert_eq!(list.items[0].name, "HLQ.ZFS");
    }
}
