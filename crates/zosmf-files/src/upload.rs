//! Clients for uploading local content to data sets and USS files.
//!
//! * `PUT /zosmf/restfiles/ds[/-(vol)]/<dsn>` writes data set or member
//!   content
//! * `PUT /zosmf/restfiles/fs/<path>` writes USS file content
//!
//! Directory uploads walk the local tree, create remote directories
//! before their files, and push the files through a bounded pool. Each
//! file's transfer mode is decided per file: an attributes file wins
//! over a file-name map, which wins over the uniform binary flag.

use crate::attributes::{TransferMode, ZosAttributes};
use crate::create::{create_uss, UssType};
use crate::list::{list_uss_files, MigratedRecall, UssListOptions};
use crate::util::{dataset_resource, generate_member_name, uss_resource};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::Method;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use walkdir::{DirEntry, WalkDir};
use zosmf_sdk::{headers, Result, ZosmfError, ZosmfSession};

/// Options for a single upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub binary: bool,
    pub record: bool,
    /// Remote codepage for text transfers, sent as
    /// `X-IBM-Data-Type: text;fileEncoding=<encoding>`.
    pub encoding: Option<String>,
    /// Codepage of the local content, announced as the content type.
    pub local_encoding: Option<String>,
    pub volume: Option<String>,
    pub migrated_recall: Option<MigratedRecall>,
    /// Expected Etag of the current remote content, sent as `If-Match`.
    pub etag: Option<String>,
    pub return_etag: bool,
    pub response_timeout: Option<u32>,
}

/// Etag of the stored content, when one was requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadResponse {
    pub etag: Option<String>,
}

fn apply_upload_headers(
    mut builder: reqwest::RequestBuilder,
    options: &UploadOptions,
) -> reqwest::RequestBuilder {
    if options.binary {
        builder = builder
            .header(headers::X_IBM_DATA_TYPE, "binary")
            .header(CONTENT_TYPE, "application/octet-stream");
    } else if options.record {
        builder = builder.header(headers::X_IBM_DATA_TYPE, "record");
    } else {
        let data_type = match &options.encoding {
            Some(encoding) => format!("text;fileEncoding={encoding}"),
            None => "text".to_string(),
        };
        builder = builder.header(headers::X_IBM_DATA_TYPE, data_type);
        if let Some(local) = &options.local_encoding {
            builder = builder.header(CONTENT_TYPE, local);
        }
    }
    if let Some(recall) = options.migrated_recall {
        builder = builder.header(headers::X_IBM_MIGRATED_RECALL, recall.as_str());
    }
    if let Some(etag) = &options.etag {
        builder = builder.header(IF_MATCH, etag);
    }
    if options.return_etag {
        builder = builder.header(headers::X_IBM_RETURN_ETAG, "true");
    }
    if let Some(timeout) = options.response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    builder
}

async fn finish_upload(
    session: &ZosmfSession,
    builder: reqwest::RequestBuilder,
    options: &UploadOptions,
) -> Result<UploadResponse> {
    let response = session.send(builder).await?;
    let etag = if options.return_etag {
        response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    } else {
        None
    };
    Ok(UploadResponse { etag })
}

/// Write a buffer to a data set or member.
pub async fn upload_buffer_to_data_set(
    session: &ZosmfSession,
    content: Vec<u8>,
    data_set_name: &str,
    options: &UploadOptions,
) -> Result<UploadResponse> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let resource = dataset_resource(data_set_name, options.volume.as_deref());
    tracing::debug!(%resource, bytes = content.len(), "uploading to data set");
    let builder = apply_upload_headers(session.request(Method::PUT, &resource)?, options).body(content);
    finish_upload(session, builder, options).await
}

/// Upload a local file to a data set or member.
pub async fn upload_file_to_data_set(
    session: &ZosmfSession,
    local_file: &Path,
    data_set_name: &str,
    options: &UploadOptions,
) -> Result<UploadResponse> {
    let content = std::fs::read(local_file).map_err(|err| {
        ZosmfError::io(format!("could not read {}", local_file.display()), err)
    })?;
    upload_buffer_to_data_set(session, content, data_set_name, options).await
}

/// Upload each regular file in a directory as a member of a PDS, named
/// by the file's uppercased stem. Returns the member names written.
pub async fn upload_dir_to_pds(
    session: &ZosmfSession,
    local_dir: &Path,
    data_set_name: &str,
    options: &UploadOptions,
) -> Result<Vec<String>> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let mut entries: Vec<_> = std::fs::read_dir(local_dir)
        .and_then(|reader| reader.collect::<std::io::Result<Vec<_>>>())
        .map_err(|err| ZosmfError::io(format!("could not read {}", local_dir.display()), err))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut members = Vec::new();
    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let member = generate_member_name(&path);
        if member.is_empty() {
            tracing::warn!(file = %path.display(), "no usable member name, skipping");
            continue;
        }
        let target = format!("{data_set_name}({member})");
        upload_file_to_data_set(session, &path, &target, options).await?;
        members.push(member);
    }
    tracing::info!(data_set = %data_set_name, members = members.len(), "directory uploaded to PDS");
    Ok(members)
}

/// Write a buffer to a USS file.
pub async fn upload_buffer_to_uss(
    session: &ZosmfSession,
    content: Vec<u8>,
    uss_path: &str,
    options: &UploadOptions,
) -> Result<UploadResponse> {
    if uss_path.trim().is_empty() {
        return Err(ZosmfError::validation("USS path is required"));
    }
    let resource = uss_resource(uss_path);
    tracing::debug!(%resource, bytes = content.len(), "uploading to USS file");
    let builder = apply_upload_headers(session.request(Method::PUT, &resource)?, options).body(content);
    finish_upload(session, builder, options).await
}

/// Upload a local file to a USS file.
pub async fn upload_file_to_uss(
    session: &ZosmfSession,
    local_file: &Path,
    uss_path: &str,
    options: &UploadOptions,
) -> Result<UploadResponse> {
    let content = std::fs::read(local_file).map_err(|err| {
        ZosmfError::io(format!("could not read {}", local_file.display()), err)
    })?;
    upload_buffer_to_uss(session, content, uss_path, options).await
}

/// Uniform binary flag override for an explicit set of file names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilesMap {
    pub binary: bool,
    pub file_names: Vec<String>,
}

/// Options for uploading a directory tree to USS.
#[derive(Debug, Clone, Default)]
pub struct UploadDirOptions {
    pub binary: bool,
    pub recursive: bool,
    /// Also upload dot-prefixed files and directories.
    pub include_hidden: bool,
    pub files_map: Option<FilesMap>,
    pub attributes: Option<ZosAttributes>,
    /// Remote codepage applied uniformly when no attributes file is used.
    pub encoding: Option<String>,
    pub local_encoding: Option<String>,
    /// Concurrent file uploads; 1 when unset, 0 means unbounded.
    pub max_concurrent_requests: Option<usize>,
    pub response_timeout: Option<u32>,
}

/// Per-file record of a directory upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadItemResult {
    pub source: PathBuf,
    pub target: String,
    /// Rendered cause when this file failed.
    pub error: Option<String>,
}

/// Outcome of a directory upload. `success` is true only when every
/// file made it; individual failures are listed in `items`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryUploadOutcome {
    pub success: bool,
    pub items: Vec<UploadItemResult>,
}

async fn uss_directory_exists(session: &ZosmfSession, path: &str) -> bool {
    list_uss_files(session, path, &UssListOptions::default())
        .await
        .is_ok()
}

fn keep_entry(entry: &DirEntry, options: &UploadDirOptions) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !options.include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
        return false;
    }
    if let Some(attributes) = &options.attributes {
        if entry.file_type().is_dir() && !attributes.file_should_be_uploaded(entry.path()) {
            return false;
        }
    }
    true
}

/// Decide how one file transfers, or `None` when it is excluded.
fn resolved_file_options(path: &Path, options: &UploadDirOptions) -> Option<UploadOptions> {
    let mut per_file = UploadOptions {
        response_timeout: options.response_timeout,
        ..UploadOptions::default()
    };
    if let Some(attributes) = &options.attributes {
        if !attributes.file_should_be_uploaded(path) {
            return None;
        }
        per_file.binary = attributes.transfer_mode(path) == TransferMode::Binary;
        let remote = attributes.remote_encoding(path);
        if remote != "binary" {
            per_file.encoding = Some(remote);
        }
        if !per_file.binary {
            per_file.local_encoding = Some(attributes.local_encoding(path));
        }
    } else if let Some(map) = &options.files_map {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        per_file.binary = if map.file_names.iter().any(|mapped| *mapped == name) {
            map.binary
        } else {
            options.binary
        };
        per_file.encoding = options.encoding.clone();
        per_file.local_encoding = options.local_encoding.clone();
    } else {
        per_file.binary = options.binary;
        per_file.encoding = options.encoding.clone();
        per_file.local_encoding = options.local_encoding.clone();
    }
    Some(per_file)
}

fn join_uss(base: &str, relative: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

/// Upload a directory tree to a USS directory, creating the target and
/// any subdirectories that do not exist yet.
pub async fn upload_dir_to_uss(
    session: &ZosmfSession,
    local_dir: &Path,
    uss_dir: &str,
    options: &UploadDirOptions,
) -> Result<DirectoryUploadOutcome> {
    if uss_dir.trim().is_empty() {
        return Err(ZosmfError::validation("USS directory is required"));
    }
    let metadata = std::fs::metadata(local_dir).map_err(|err| {
        ZosmfError::io(format!("could not read {}", local_dir.display()), err)
    })?;
    if !metadata.is_dir() {
        return Err(ZosmfError::validation(format!(
            "{} is not a directory",
            local_dir.display()
        )));
    }

    if !uss_directory_exists(session, uss_dir).await {
        create_uss(session, uss_dir, UssType::Directory, None).await?;
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut directories: Vec<String> = Vec::new();
    let mut files: Vec<(PathBuf, String, UploadOptions)> = Vec::new();
    let walker = WalkDir::new(local_dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter();
    for entry in walker.filter_entry(|entry| keep_entry(entry, options)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let message = format!("could not walk {}", local_dir.display());
                return Err(match err.into_io_error() {
                    Some(io_err) => ZosmfError::io(message, io_err),
                    None => ZosmfError::validation(message),
                });
            }
        };
        let Ok(relative) = entry.path().strip_prefix(local_dir) else {
            continue;
        };
        let target = join_uss(uss_dir, &relative.to_string_lossy());
        if entry.file_type().is_dir() {
            directories.push(target);
        } else if entry.file_type().is_file() {
            match resolved_file_options(entry.path(), options) {
                Some(per_file) => files.push((entry.path().to_path_buf(), target, per_file)),
                None => tracing::debug!(file = %entry.path().display(), "excluded by attributes"),
            }
        }
    }

    for directory in &directories {
        if !uss_directory_exists(session, directory).await {
            create_uss(session, directory, UssType::Directory, None).await?;
        }
    }

    let permits = match options.max_concurrent_requests.unwrap_or(1) {
        0 => Semaphore::MAX_PERMITS,
        bounded => bounded,
    };
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut tasks: JoinSet<UploadItemResult> = JoinSet::new();
    for (source, target, per_file) in files {
        let session = session.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return UploadItemResult {
                        source,
                        target,
                        error: Some("upload pool closed unexpectedly".to_string()),
                    }
                }
            };
            let outcome = upload_file_to_uss(&session, &source, &target, &per_file).await;
            UploadItemResult {
                source,
                target,
                error: outcome.err().map(|err| err.to_string()),
            }
        });
    }

    let mut items = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(item) => items.push(item),
            Err(join_err) => {
                return Err(ZosmfError::invalid_response(format!(
                    "upload task failed: {join_err}"
                )))
            }
        }
    }
    items.sort_by(|a, b| a.source.cmp(&b.source));
    let success = items.iter().all(|item| item.error.is_none());
    tracing::info!(
        directory = %local_dir.display(),
        files = items.len(),
        success,
        "directory upload finished"
    );
    Ok(DirectoryUploadOutcome { success, items })
}
