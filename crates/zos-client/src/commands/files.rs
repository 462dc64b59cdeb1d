//! The `zos-files` command tree: create, upload, download, list, and
//! delete data sets, USS files, and file systems, plus IDCAMS access
//! method services.

use crate::config::ResolvedConnection;
use crate::output::{print_done, print_json, render_table, OutputFormat};
use clap::{Args, Subcommand};
use miette::{miette, IntoDiagnostic, WrapErr};
use std::path::{Path, PathBuf};
use zosmf_files::attributes::{ZosAttributes, DEFAULT_ATTRIBUTES_FILE};
use zosmf_files::create::{
    create_data_set, create_data_set_like, create_uss, create_vsam, create_zfs,
    CreateDataSetOptions, CreateDataSetType, CreateVsamOptions, CreateZfsOptions, UssType,
};
use zosmf_files::delete::{
    delete_data_set, delete_uss_file, delete_vsam, delete_zfs, DeleteVsamOptions,
};
use zosmf_files::download::{
    download_all_members, download_data_set, download_uss_file, DownloadAllMembersOptions,
    DownloadOptions,
};
use zosmf_files::invoke::{invoke_ams, AmsResponse};
use zosmf_files::list::{
    list_all_members, list_data_sets, list_uss_files, list_zfs, list_zfs_with_path, ListOptions,
    MigratedRecall, UssListOptions, ZfsListOptions,
};
use zosmf_files::upload::{
    upload_dir_to_pds, upload_dir_to_uss, upload_file_to_data_set, upload_file_to_uss, FilesMap,
    UploadDirOptions, UploadOptions,
};
use zosmf_sdk::ZosmfSession;

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// Create data sets, VSAM clusters, file systems, and USS entries.
    #[command(subcommand)]
    Create(CreateCommand),
    /// Upload local files and directories to the mainframe.
    #[command(subcommand)]
    Upload(UploadCommand),
    /// Download mainframe content to local files.
    #[command(subcommand)]
    Download(DownloadCommand),
    /// List data sets, members, USS files, and mounted file systems.
    #[command(subcommand)]
    List(ListCommand),
    /// Delete data sets, VSAM clusters, file systems, and USS files.
    #[command(subcommand)]
    Delete(DeleteCommand),
    /// Invoke z/OS utilities.
    #[command(subcommand)]
    Invoke(InvokeCommand),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: FilesCommand,
) -> miette::Result<()> {
    let session = connection.session()?;
    match command {
        FilesCommand::Create(command) => create(&session, format, command).await,
        FilesCommand::Upload(command) => upload(&session, format, command).await,
        FilesCommand::Download(command) => download(&session, format, command).await,
        FilesCommand::List(command) => list(&session, format, command).await,
        FilesCommand::Delete(command) => delete(&session, format, command).await,
        FilesCommand::Invoke(command) => invoke(&session, format, command).await,
    }
}

/// Render an IDCAMS run and fail the command when it ended with a
/// non-zero return code.
fn finish_ams(format: OutputFormat, action: &str, response: AmsResponse) -> miette::Result<()> {
    if format.is_json() {
        print_json(&response)?;
    } else {
        for line in &response.output {
            println!("{line}");
        }
    }
    if response.rc != 0 {
        return Err(miette!(
            "IDCAMS {action} ended with return code {}",
            response.rc
        ));
    }
    Ok(())
}

fn parse_migrated_recall(value: &str) -> miette::Result<MigratedRecall> {
    match value.to_ascii_lowercase().as_str() {
        "wait" => Ok(MigratedRecall::Wait),
        "nowait" => Ok(MigratedRecall::NoWait),
        "error" => Ok(MigratedRecall::Error),
        other => Err(miette!(
            "unknown recall mode '{other}'; use wait, nowait, or error"
        )),
    }
}

// ---------------------------------------------------------------------------
// create

#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Create a partitioned data set.
    #[command(visible_alias = "pds")]
    DataSetPartitioned(AllocateArgs),
    /// Create a physical sequential data set.
    #[command(visible_alias = "ps")]
    DataSetSequential(AllocateArgs),
    /// Create a PDS for binary content.
    #[command(visible_alias = "bin")]
    DataSetBinary(AllocateArgs),
    /// Create a PDS for C source code.
    #[command(visible_alias = "c")]
    DataSetC(AllocateArgs),
    /// Create a classic fixed-block PDS.
    #[command(visible_alias = "classic")]
    DataSetClassic(AllocateArgs),
    /// Define a VSAM cluster through IDCAMS.
    #[command(visible_alias = "vsam")]
    DataSetVsam(CreateVsamArgs),
    /// Create a z/OS file system aggregate.
    #[command(visible_alias = "zfs")]
    ZosFileSystem(CreateZfsArgs),
    /// Create a USS file.
    UssFile(CreateUssArgs),
    /// Create a USS directory.
    #[command(visible_alias = "uss-dir")]
    UssDirectory(CreateUssArgs),
}

/// Allocation attributes shared by the data set create commands.
/// Unset attributes fall back to the defaults of the data set kind.
#[derive(Debug, Clone, Args)]
pub struct AllocateArgs {
    /// Name of the data set to allocate.
    #[arg(value_name = "DSNAME")]
    pub name: String,
    /// Allocation shorthand such as 5CYL or 10TRK.
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,
    /// Volume serial to allocate on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Device type, the UNIT allocation parameter.
    #[arg(long, value_name = "UNIT")]
    pub device_type: Option<String>,
    /// Primary space allocation.
    #[arg(long, value_name = "N")]
    pub primary_space: Option<u64>,
    /// Secondary space allocation.
    #[arg(long, value_name = "N")]
    pub secondary_space: Option<u64>,
    /// Directory blocks for a partitioned allocation.
    #[arg(long, value_name = "N")]
    pub directory_blocks: Option<u64>,
    /// Record format, such as FB or VBA.
    #[arg(long, value_name = "RECFM")]
    pub record_format: Option<String>,
    /// Record length in bytes.
    #[arg(long, value_name = "N")]
    pub record_length: Option<u64>,
    /// Block size in bytes.
    #[arg(long, value_name = "N")]
    pub block_size: Option<u64>,
    /// SMS storage class.
    #[arg(long, value_name = "CLASS")]
    pub storage_class: Option<String>,
    /// SMS management class.
    #[arg(long, value_name = "CLASS")]
    pub management_class: Option<String>,
    /// SMS data class.
    #[arg(long, value_name = "CLASS")]
    pub data_class: Option<String>,
    /// Data set type, such as LIBRARY or PDS.
    #[arg(long, value_name = "DSNTYPE")]
    pub data_set_type: Option<String>,
    /// Allocate with the attributes of this existing data set.
    #[arg(long, value_name = "DSNAME")]
    pub like: Option<String>,
    /// Print the resolved allocation attributes.
    #[arg(long)]
    pub show_attributes: bool,
    /// Seconds z/OSMF may take before giving up on the request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

impl AllocateArgs {
    fn options(&self) -> CreateDataSetOptions {
        CreateDataSetOptions {
            volser: self.volume_serial.clone(),
            unit: self.device_type.clone(),
            primary: self.primary_space,
            secondary: self.secondary_space,
            dirblk: self.directory_blocks,
            recfm: self.record_format.clone(),
            blksize: self.block_size,
            lrecl: self.record_length,
            storclass: self.storage_class.clone(),
            mgntclass: self.management_class.clone(),
            dataclass: self.data_class.clone(),
            dsntype: self.data_set_type.clone(),
            size: self.size.clone(),
            response_timeout: self.response_timeout,
            ..Default::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateVsamArgs {
    /// Name of the cluster to define.
    #[arg(value_name = "DSNAME")]
    pub name: String,
    /// Cluster organization: INDEXED, NONINDEXED, NUMBERED, or LINEAR.
    #[arg(long, value_name = "DSORG")]
    pub data_set_organization: Option<String>,
    /// Allocation shorthand such as 840KB or 10CYL.
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,
    /// Secondary space allocation.
    #[arg(long, value_name = "N")]
    pub secondary_space: Option<u64>,
    /// Days to retain the cluster.
    #[arg(long, value_name = "DAYS", conflicts_with = "retain_to")]
    pub retain_for: Option<i64>,
    /// Expiration date in yyyyddd form.
    #[arg(long, value_name = "DATE")]
    pub retain_to: Option<String>,
    /// Volumes the cluster may span.
    #[arg(long, value_name = "VOLSER")]
    pub volumes: Option<String>,
    /// SMS storage class.
    #[arg(long, value_name = "CLASS")]
    pub storage_class: Option<String>,
    /// SMS management class.
    #[arg(long, value_name = "CLASS")]
    pub management_class: Option<String>,
    /// SMS data class.
    #[arg(long, value_name = "CLASS")]
    pub data_class: Option<String>,
}

impl CreateVsamArgs {
    fn options(&self) -> CreateVsamOptions {
        CreateVsamOptions {
            dsorg: self.data_set_organization.clone(),
            secondary: self.secondary_space,
            retain_for: self.retain_for,
            retain_to: self.retain_to.clone(),
            volumes: self.volumes.clone(),
            storclass: self.storage_class.clone(),
            mgntclass: self.management_class.clone(),
            dataclass: self.data_class.clone(),
            size: self.size.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateZfsArgs {
    /// Name of the aggregate to create.
    #[arg(value_name = "FSNAME")]
    pub name: String,
    /// z/OS user ID or UID that owns the aggregate root.
    #[arg(long, value_name = "OWNER")]
    pub owner: Option<String>,
    /// z/OS group ID or GID of the aggregate root.
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,
    /// Octal permission bits for the aggregate root.
    #[arg(long, value_name = "PERMS", default_value_t = 755)]
    pub perms: u32,
    /// Primary space in cylinders.
    #[arg(long, value_name = "CYLS", default_value_t = 10)]
    pub cyls_pri: u64,
    /// Secondary space in cylinders.
    #[arg(long, value_name = "CYLS", default_value_t = 2)]
    pub cyls_sec: u64,
    /// SMS storage class.
    #[arg(long, value_name = "CLASS")]
    pub storage_class: Option<String>,
    /// SMS management class.
    #[arg(long, value_name = "CLASS")]
    pub management_class: Option<String>,
    /// SMS data class.
    #[arg(long, value_name = "CLASS")]
    pub data_class: Option<String>,
    /// Volumes to allocate on.
    #[arg(long, value_name = "VOLSER", value_delimiter = ',')]
    pub volumes: Vec<String>,
    /// Seconds the aggregate create may run.
    #[arg(long, value_name = "SECONDS", default_value_t = 20)]
    pub timeout: u32,
}

impl CreateZfsArgs {
    fn options(&self) -> CreateZfsOptions {
        CreateZfsOptions {
            owner: self.owner.clone(),
            group: self.group.clone(),
            perms: Some(self.perms),
            cyls_pri: Some(self.cyls_pri),
            cyls_sec: Some(self.cyls_sec),
            storclass: self.storage_class.clone(),
            mgntclass: self.management_class.clone(),
            dataclass: self.data_class.clone(),
            volumes: if self.volumes.is_empty() {
                None
            } else {
                Some(self.volumes.clone())
            },
            timeout: Some(self.timeout),
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateUssArgs {
    /// Absolute USS path to create.
    #[arg(value_name = "PATH")]
    pub path: String,
    /// Symbolic permissions such as rwxr-xr-x.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,
}

async fn create(
    session: &ZosmfSession,
    format: OutputFormat,
    command: CreateCommand,
) -> miette::Result<()> {
    match command {
        CreateCommand::DataSetPartitioned(args) => {
            create_data_set_leaf(session, format, CreateDataSetType::Partitioned, args).await
        }
        CreateCommand::DataSetSequential(args) => {
            create_data_set_leaf(session, format, CreateDataSetType::Sequential, args).await
        }
        CreateCommand::DataSetBinary(args) => {
            create_data_set_leaf(session, format, CreateDataSetType::Binary, args).await
        }
        CreateCommand::DataSetC(args) => {
            create_data_set_leaf(session, format, CreateDataSetType::C, args).await
        }
        CreateCommand::DataSetClassic(args) => {
            create_data_set_leaf(session, format, CreateDataSetType::Classic, args).await
        }
        CreateCommand::DataSetVsam(args) => {
            let response = create_vsam(session, &args.name, args.options()).await?;
            finish_ams(format, "DEFINE", response)
        }
        CreateCommand::ZosFileSystem(args) => {
            create_zfs(session, &args.name, args.options()).await?;
            print_done(format, format!("File system '{}' created.", args.name))
        }
        CreateCommand::UssFile(args) => {
            create_uss(session, &args.path, UssType::File, args.mode.as_deref()).await?;
            print_done(format, format!("USS file '{}' created.", args.path))
        }
        CreateCommand::UssDirectory(args) => {
            create_uss(session, &args.path, UssType::Directory, args.mode.as_deref()).await?;
            print_done(format, format!("USS directory '{}' created.", args.path))
        }
    }
}

async fn create_data_set_leaf(
    session: &ZosmfSession,
    format: OutputFormat,
    data_set_type: CreateDataSetType,
    args: AllocateArgs,
) -> miette::Result<()> {
    let options = args.options();
    let attributes = match &args.like {
        Some(like) => create_data_set_like(session, &args.name, like, options).await?,
        None => create_data_set(session, data_set_type, &args.name, options).await?,
    };
    if format.is_json() {
        print_json(&serde_json::json!({
            "success": true,
            "dataSetName": args.name,
            "attributes": attributes,
        }))
    } else {
        println!("Data set '{}' created.", args.name);
        if args.show_attributes {
            print_json(&attributes)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// upload

#[derive(Debug, Subcommand)]
pub enum UploadCommand {
    /// Upload a local file to a data set or member.
    #[command(visible_alias = "ftds")]
    FileToDataSet(UploadFileToDataSetArgs),
    /// Upload each file of a local directory as a member of a PDS.
    #[command(visible_alias = "dtp")]
    DirToPds(UploadDirToPdsArgs),
    /// Upload a local file to a USS file.
    #[command(visible_alias = "ftu")]
    FileToUss(UploadFileToUssArgs),
    /// Upload a local directory tree to a USS directory.
    #[command(visible_alias = "dtu")]
    DirToUss(UploadDirToUssArgs),
}

/// Content transfer options shared by the upload and download commands.
#[derive(Debug, Clone, Default, Args)]
pub struct TransferArgs {
    /// Transfer the content as-is, without EBCDIC conversion.
    #[arg(long)]
    pub binary: bool,
    /// Transfer preserving record boundaries, without conversion.
    #[arg(long, conflicts_with = "binary")]
    pub record: bool,
    /// Remote codepage for text transfers.
    #[arg(long, value_name = "CODEPAGE")]
    pub encoding: Option<String>,
    /// Codepage of the local content.
    #[arg(long, value_name = "CODEPAGE")]
    pub local_encoding: Option<String>,
    /// Seconds z/OSMF may take before giving up on the request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UploadFileToDataSetArgs {
    /// Local file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Target data set or member, such as A.B.C or A.B.C(MEM).
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Volume the data set resides on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Recall behavior for migrated data sets: wait, nowait, or error.
    #[arg(long, value_name = "MODE")]
    pub migrated_recall: Option<String>,
    /// Upload only if the remote content still carries this Etag.
    #[arg(long, value_name = "ETAG")]
    pub etag: Option<String>,
    /// Report the Etag of the stored content.
    #[arg(long)]
    pub return_etag: bool,
}

#[derive(Debug, Args)]
pub struct UploadDirToPdsArgs {
    /// Local directory whose files become members.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
    /// Target partitioned data set.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Volume the data set resides on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Recall behavior for migrated data sets: wait, nowait, or error.
    #[arg(long, value_name = "MODE")]
    pub migrated_recall: Option<String>,
}

#[derive(Debug, Args)]
pub struct UploadFileToUssArgs {
    /// Local file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Target USS file path.
    #[arg(value_name = "PATH")]
    pub path: String,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Upload only if the remote content still carries this Etag.
    #[arg(long, value_name = "ETAG")]
    pub etag: Option<String>,
    /// Report the Etag of the stored content.
    #[arg(long)]
    pub return_etag: bool,
}

#[derive(Debug, Args)]
pub struct UploadDirToUssArgs {
    /// Local directory to upload.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
    /// Target USS directory path.
    #[arg(value_name = "PATH")]
    pub path: String,
    /// Transfer every file as binary.
    #[arg(long)]
    pub binary: bool,
    /// Also upload the contents of subdirectories.
    #[arg(short, long)]
    pub recursive: bool,
    /// Also upload dot-prefixed files and directories.
    #[arg(long)]
    pub include_hidden: bool,
    /// Comma-separated file names uploaded as binary regardless of --binary.
    #[arg(long, value_name = "LIST", value_delimiter = ',', conflicts_with = "ascii_files")]
    pub binary_files: Vec<String>,
    /// Comma-separated file names uploaded as text regardless of --binary.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub ascii_files: Vec<String>,
    /// Read per-file transfer attributes from this file instead of the
    /// directory's .zosattributes.
    #[arg(long, value_name = "FILE")]
    pub attributes: Option<PathBuf>,
    /// Remote codepage for text transfers.
    #[arg(long, value_name = "CODEPAGE")]
    pub encoding: Option<String>,
    /// Codepage of the local content.
    #[arg(long, value_name = "CODEPAGE")]
    pub local_encoding: Option<String>,
    /// Concurrent file uploads.
    #[arg(long, value_name = "N")]
    pub max_concurrent_requests: Option<usize>,
    /// Seconds z/OSMF may take before giving up on each request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

/// Build the per-file transfer override list. The two flags are
/// mutually exclusive; whichever is given names the exceptions to the
/// directory-wide mode.
fn files_map(binary_files: Vec<String>, ascii_files: Vec<String>) -> Option<FilesMap> {
    if !binary_files.is_empty() {
        Some(FilesMap {
            binary: true,
            file_names: binary_files,
        })
    } else if !ascii_files.is_empty() {
        Some(FilesMap {
            binary: false,
            file_names: ascii_files,
        })
    } else {
        None
    }
}

async fn upload(
    session: &ZosmfSession,
    format: OutputFormat,
    command: UploadCommand,
) -> miette::Result<()> {
    match command {
        UploadCommand::FileToDataSet(args) => {
            let options = UploadOptions {
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                volume: args.volume_serial.clone(),
                migrated_recall: args
                    .migrated_recall
                    .as_deref()
                    .map(parse_migrated_recall)
                    .transpose()?,
                etag: args.etag.clone(),
                return_etag: args.return_etag,
                response_timeout: args.transfer.response_timeout,
            };
            let response =
                upload_file_to_data_set(session, &args.file, &args.data_set, &options).await?;
            if format.is_json() {
                print_json(&response)
            } else {
                println!(
                    "Uploaded '{}' to '{}'.",
                    args.file.display(),
                    args.data_set
                );
                if let Some(etag) = &response.etag {
                    println!("Etag: {etag}");
                }
                Ok(())
            }
        }
        UploadCommand::DirToPds(args) => {
            let options = UploadOptions {
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                volume: args.volume_serial.clone(),
                migrated_recall: args
                    .migrated_recall
                    .as_deref()
                    .map(parse_migrated_recall)
                    .transpose()?,
                response_timeout: args.transfer.response_timeout,
                ..Default::default()
            };
            let members = upload_dir_to_pds(session, &args.dir, &args.data_set, &options).await?;
            if format.is_json() {
                print_json(&serde_json::json!({
                    "success": true,
                    "dataSetName": args.data_set,
                    "members": members,
                }))
            } else {
                println!(
                    "Uploaded {} member(s) to '{}'.",
                    members.len(),
                    args.data_set
                );
                for member in &members {
                    println!("  {member}");
                }
                Ok(())
            }
        }
        UploadCommand::FileToUss(args) => {
            let options = UploadOptions {
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                etag: args.etag.clone(),
                return_etag: args.return_etag,
                response_timeout: args.transfer.response_timeout,
                ..Default::default()
            };
            let response = upload_file_to_uss(session, &args.file, &args.path, &options).await?;
            if format.is_json() {
                print_json(&response)
            } else {
                println!("Uploaded '{}' to '{}'.", args.file.display(), args.path);
                if let Some(etag) = &response.etag {
                    println!("Etag: {etag}");
                }
                Ok(())
            }
        }
        UploadCommand::DirToUss(args) => {
            let attributes = load_upload_attributes(&args)?;
            let options = UploadDirOptions {
                binary: args.binary,
                recursive: args.recursive,
                include_hidden: args.include_hidden,
                files_map: files_map(args.binary_files.clone(), args.ascii_files.clone()),
                attributes,
                encoding: args.encoding.clone(),
                local_encoding: args.local_encoding.clone(),
                max_concurrent_requests: args.max_concurrent_requests,
                response_timeout: args.response_timeout,
            };
            let outcome = upload_dir_to_uss(session, &args.dir, &args.path, &options).await?;
            if format.is_json() {
                print_json(&outcome)?;
            } else {
                let uploaded = outcome
                    .items
                    .iter()
                    .filter(|item| item.error.is_none())
                    .count();
                println!(
                    "Uploaded {uploaded} of {} file(s) to '{}'.",
                    outcome.items.len(),
                    args.path
                );
                for item in &outcome.items {
                    if let Some(error) = &item.error {
                        println!("  failed {}: {error}", item.source.display());
                    }
                }
            }
            if outcome.success {
                Ok(())
            } else {
                Err(miette!("one or more files failed to upload"))
            }
        }
    }
}

/// The explicit attributes file wins; otherwise a `.zosattributes` in
/// the uploaded directory is picked up when present.
fn load_upload_attributes(args: &UploadDirToUssArgs) -> miette::Result<Option<ZosAttributes>> {
    let base_path = args.dir.to_str();
    if let Some(path) = &args.attributes {
        return Ok(Some(ZosAttributes::from_file(path, base_path)?));
    }
    let implied = args.dir.join(DEFAULT_ATTRIBUTES_FILE);
    if implied.is_file() {
        return Ok(Some(ZosAttributes::from_file(&implied, base_path)?));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// download

#[derive(Debug, Subcommand)]
pub enum DownloadCommand {
    /// Download a data set or member to a local file.
    #[command(visible_alias = "ds")]
    DataSet(DownloadDataSetArgs),
    /// Download every member of a PDS into a local directory.
    #[command(visible_alias = "am")]
    AllMembers(DownloadAllMembersArgs),
    /// Download a USS file to a local file.
    #[command(visible_alias = "uf")]
    UssFile(DownloadUssFileArgs),
}

#[derive(Debug, Args)]
pub struct DownloadDataSetArgs {
    /// Data set or member to download.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    /// Local destination file.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Extension for the derived destination.
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Volume the data set resides on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Keep the remote name's letter case in the derived destination.
    #[arg(long)]
    pub preserve_original_letter_case: bool,
    /// Report the Etag of the downloaded content.
    #[arg(long)]
    pub return_etag: bool,
}

#[derive(Debug, Args)]
pub struct DownloadAllMembersArgs {
    /// Partitioned data set to download.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    /// Local directory for the member files.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
    /// Extension for the member files.
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Volume the data set resides on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Keep the remote names' letter case in the derived destinations.
    #[arg(long)]
    pub preserve_original_letter_case: bool,
    /// Stop at the first failed member instead of finishing the rest.
    #[arg(long, value_name = "BOOL")]
    pub fail_fast: Option<bool>,
    /// Concurrent member downloads.
    #[arg(long, value_name = "N")]
    pub max_concurrent_requests: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DownloadUssFileArgs {
    /// USS file to download.
    #[arg(value_name = "PATH")]
    pub path: String,
    /// Local destination file.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Report the Etag of the downloaded content.
    #[arg(long)]
    pub return_etag: bool,
}

async fn download(
    session: &ZosmfSession,
    format: OutputFormat,
    command: DownloadCommand,
) -> miette::Result<()> {
    match command {
        DownloadCommand::DataSet(args) => {
            let options = DownloadOptions {
                file: args.file.clone(),
                extension: args.extension.clone(),
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                volume: args.volume_serial.clone(),
                preserve_original_letter_case: args.preserve_original_letter_case,
                return_etag: args.return_etag,
                response_timeout: args.transfer.response_timeout,
            };
            let downloaded = download_data_set(session, &args.data_set, &options).await?;
            if format.is_json() {
                print_json(&downloaded)
            } else {
                println!(
                    "Downloaded '{}' to '{}'.",
                    args.data_set,
                    downloaded.destination.display()
                );
                if let Some(etag) = &downloaded.etag {
                    println!("Etag: {etag}");
                }
                Ok(())
            }
        }
        DownloadCommand::AllMembers(args) => {
            let options = DownloadAllMembersOptions {
                directory: args.directory.clone(),
                extension: args.extension.clone(),
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                volume: args.volume_serial.clone(),
                preserve_original_letter_case: args.preserve_original_letter_case,
                fail_fast: args.fail_fast,
                max_concurrent_requests: args.max_concurrent_requests,
                response_timeout: args.transfer.response_timeout,
            };
            let outcome = download_all_members(session, &args.data_set, &options).await?;
            if format.is_json() {
                print_json(&outcome)
            } else {
                println!(
                    "Downloaded {} member(s) of '{}' to '{}'.",
                    outcome.downloaded.len(),
                    args.data_set,
                    outcome.destination.display()
                );
                Ok(())
            }
        }
        DownloadCommand::UssFile(args) => {
            let options = DownloadOptions {
                file: args.file.clone(),
                binary: args.transfer.binary,
                record: args.transfer.record,
                encoding: args.transfer.encoding.clone(),
                local_encoding: args.transfer.local_encoding.clone(),
                return_etag: args.return_etag,
                response_timeout: args.transfer.response_timeout,
                ..Default::default()
            };
            let downloaded = download_uss_file(session, &args.path, &options).await?;
            if format.is_json() {
                print_json(&downloaded)
            } else {
                println!(
                    "Downloaded '{}' to '{}'.",
                    args.path,
                    downloaded.destination.display()
                );
                if let Some(etag) = &downloaded.etag {
                    println!("Etag: {etag}");
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// list

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List cataloged data sets matching a pattern.
    #[command(visible_alias = "ds")]
    DataSet(ListDataSetArgs),
    /// List the members of a partitioned data set.
    #[command(visible_alias = "am")]
    AllMembers(ListAllMembersArgs),
    /// List the entries of a USS directory.
    #[command(visible_alias = "uss")]
    UssFiles(ListUssFilesArgs),
    /// List mounted file systems.
    #[command(visible_alias = "zfs")]
    FileSystem(ListFileSystemArgs),
}

#[derive(Debug, Args)]
pub struct ListDataSetArgs {
    /// Catalog search pattern, such as IBMUSER.**.
    #[arg(value_name = "PATTERN")]
    pub pattern: String,
    /// Report full attributes for each entry.
    #[arg(short = 'a', long)]
    pub attributes: bool,
    /// Maximum entries to return.
    #[arg(long, value_name = "N")]
    pub max_length: Option<u32>,
    /// Resume the listing at this name.
    #[arg(long, value_name = "DSNAME")]
    pub start: Option<String>,
    /// Restrict the listing to this volume.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Recall behavior for migrated data sets: wait, nowait, or error.
    #[arg(long, value_name = "MODE")]
    pub migrated_recall: Option<String>,
    /// Seconds z/OSMF may take before giving up on the request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ListAllMembersArgs {
    /// Partitioned data set to list.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    /// Member name pattern, such as A* or *X.
    #[arg(long, value_name = "PATTERN")]
    pub pattern: Option<String>,
    /// Report ISPF statistics for each member.
    #[arg(short = 'a', long)]
    pub attributes: bool,
    /// Maximum entries to return.
    #[arg(long, value_name = "N")]
    pub max_length: Option<u32>,
    /// Resume the listing at this member.
    #[arg(long, value_name = "MEMBER")]
    pub start: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListUssFilesArgs {
    /// USS directory to list.
    #[arg(value_name = "PATH")]
    pub path: String,
    /// File name pattern to match.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
    /// Only entries owned by this group.
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,
    /// Only entries owned by this user.
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
    /// Size filter, such as +100 for larger-than.
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,
    /// Modification time filter in days, such as -7 for the last week.
    #[arg(long, value_name = "DAYS")]
    pub mtime: Option<String>,
    /// Octal permission mask to match.
    #[arg(long, value_name = "PERM")]
    pub perm: Option<String>,
    /// Entry type letter: c, d, f, l, p, or s.
    #[arg(long = "type", value_name = "TYPE")]
    pub entry_type: Option<String>,
    /// Directory depth to descend.
    #[arg(long, value_name = "N")]
    pub depth: Option<u32>,
    /// Cross into other file systems (true) or stay on this one (false).
    #[arg(long, value_name = "BOOL")]
    pub filesys: Option<bool>,
    /// Report symlinks themselves (true) or follow them (false).
    #[arg(long, value_name = "BOOL")]
    pub symlinks: Option<bool>,
    /// Maximum entries to return.
    #[arg(long, value_name = "N")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ListFileSystemArgs {
    /// Only the aggregate with this name.
    #[arg(long, value_name = "FSNAME", conflicts_with = "path")]
    pub fsname: Option<String>,
    /// Only the file system serving this path.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
    /// Maximum entries to return.
    #[arg(long, value_name = "N")]
    pub max_length: Option<u32>,
}

async fn list(
    session: &ZosmfSession,
    format: OutputFormat,
    command: ListCommand,
) -> miette::Result<()> {
    match command {
        ListCommand::DataSet(args) => {
            let options = ListOptions {
                attributes: args.attributes,
                max_length: args.max_length,
                start: args.start.clone(),
                volume: args.volume_serial.clone(),
                recall: args
                    .migrated_recall
                    .as_deref()
                    .map(parse_migrated_recall)
                    .transpose()?,
                response_timeout: args.response_timeout,
                ..Default::default()
            };
            let listing = list_data_sets(session, &args.pattern, &options).await?;
            if format.is_json() {
                return print_json(&listing);
            }
            if args.attributes {
                let rows: Vec<Vec<String>> = listing
                    .items
                    .iter()
                    .map(|entry| {
                        vec![
                            entry.dsname.clone(),
                            entry.dsorg.clone().unwrap_or_else(|| "-".into()),
                            entry.recfm.clone().unwrap_or_else(|| "-".into()),
                            entry.lrecl.clone().unwrap_or_else(|| "-".into()),
                            entry.blksz.clone().unwrap_or_else(|| "-".into()),
                            entry.vol.clone().unwrap_or_else(|| "-".into()),
                        ]
                    })
                    .collect();
                print!(
                    "{}",
                    render_table(&["DSNAME", "DSORG", "RECFM", "LRECL", "BLKSZ", "VOL"], &rows)
                );
            } else {
                for entry in &listing.items {
                    println!("{}", entry.dsname);
                }
            }
            if let Some(total) = listing.total_rows {
                if total > listing.returned_rows {
                    println!("Returned {} of {} entries.", listing.returned_rows, total);
                }
            }
            Ok(())
        }
        ListCommand::AllMembers(args) => {
            let options = ListOptions {
                attributes: args.attributes,
                max_length: args.max_length,
                start: args.start.clone(),
                pattern: args.pattern.clone(),
                ..Default::default()
            };
            let listing = list_all_members(session, &args.data_set, &options).await?;
            if format.is_json() {
                return print_json(&listing);
            }
            if args.attributes {
                let rows: Vec<Vec<String>> = listing
                    .items
                    .iter()
                    .map(|entry| {
                        let changed = match (&entry.m4date, &entry.mtime) {
                            (Some(date), Some(time)) => format!("{date} {time}"),
                            (Some(date), None) => date.clone(),
                            _ => "-".into(),
                        };
                        vec![
                            entry.member.clone(),
                            entry.user.clone().unwrap_or_else(|| "-".into()),
                            changed,
                        ]
                    })
                    .collect();
                print!("{}", render_table(&["MEMBER", "USER", "CHANGED"], &rows));
            } else {
                for entry in &listing.items {
                    println!("{}", entry.member);
                }
            }
            if let Some(total) = listing.total_rows {
                if total > listing.returned_rows {
                    println!("Returned {} of {} entries.", listing.returned_rows, total);
                }
            }
            Ok(())
        }
        ListCommand::UssFiles(args) => {
            let options = UssListOptions {
                name: args.name.clone(),
                group: args.group.clone(),
                user: args.user.clone(),
                size: args.size.clone(),
                mtime: args.mtime.clone(),
                perm: args.perm.clone(),
                entry_type: args.entry_type.clone(),
                depth: args.depth,
                filesys: args.filesys,
                symlinks: args.symlinks,
                max_length: args.max_length,
                ..Default::default()
            };
            let listing = list_uss_files(session, &args.path, &options).await?;
            if format.is_json() {
                return print_json(&listing);
            }
            let rows: Vec<Vec<String>> = listing
                .items
                .iter()
                .map(|entry| {
                    vec![
                        entry.mode.clone().unwrap_or_else(|| "-".into()),
                        entry.user.clone().unwrap_or_else(|| "-".into()),
                        entry.group.clone().unwrap_or_else(|| "-".into()),
                        entry.size.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                        entry.mtime.clone().unwrap_or_else(|| "-".into()),
                        entry.name.clone(),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(&["MODE", "USER", "GROUP", "SIZE", "MTIME", "NAME"], &rows)
            );
            Ok(())
        }
        ListCommand::FileSystem(args) => {
            let options = ZfsListOptions {
                max_length: args.max_length,
                ..Default::default()
            };
            let listing = if args.path.is_some() {
                list_zfs_with_path(session, args.path.as_deref(), &options).await?
            } else {
                list_zfs(session, args.fsname.as_deref(), &options).await?
            };
            if format.is_json() {
                return print_json(&listing);
            }
            let rows: Vec<Vec<String>> = listing
                .items
                .iter()
                .map(|entry| {
                    vec![
                        entry.name.clone(),
                        entry.mountpoint.clone().unwrap_or_else(|| "-".into()),
                    ]
                })
                .collect();
            print!("{}", render_table(&["NAME", "MOUNTPOINT"], &rows));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// delete

#[derive(Debug, Subcommand)]
pub enum DeleteCommand {
    /// Delete a cataloged data set or member.
    #[command(visible_alias = "ds")]
    DataSet(DeleteDataSetArgs),
    /// Delete a VSAM cluster through IDCAMS.
    #[command(visible_alias = "vsam")]
    DataSetVsam(DeleteVsamArgs),
    /// Delete a USS file or directory.
    #[command(visible_alias = "uf")]
    UssFile(DeleteUssFileArgs),
    /// Delete a z/OS file system aggregate.
    #[command(visible_alias = "zfs")]
    ZosFileSystem(DeleteZfsArgs),
}

#[derive(Debug, Args)]
pub struct DeleteDataSetArgs {
    /// Data set or member to delete.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    /// Confirm that the data set should be deleted.
    #[arg(short = 'f', long, required = true)]
    pub for_sure: bool,
    /// Volume the data set resides on.
    #[arg(long, value_name = "VOLSER")]
    pub volume_serial: Option<String>,
    /// Seconds z/OSMF may take before giving up on the request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DeleteVsamArgs {
    /// VSAM cluster to delete.
    #[arg(value_name = "DSNAME")]
    pub data_set: String,
    /// Confirm that the cluster should be deleted.
    #[arg(short = 'f', long, required = true)]
    pub for_sure: bool,
    /// Overwrite the cluster's data with binary zeros.
    #[arg(long)]
    pub erase: bool,
    /// Delete even if the retention period has not expired.
    #[arg(long)]
    pub purge: bool,
}

#[derive(Debug, Args)]
pub struct DeleteUssFileArgs {
    /// USS file or directory to delete.
    #[arg(value_name = "PATH")]
    pub path: String,
    /// Confirm that the file should be deleted.
    #[arg(short = 'f', long, required = true)]
    pub for_sure: bool,
    /// Delete directory contents too.
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Args)]
pub struct DeleteZfsArgs {
    /// Aggregate to delete.
    #[arg(value_name = "FSNAME")]
    pub name: String,
    /// Confirm that the file system should be deleted.
    #[arg(short = 'f', long, required = true)]
    pub for_sure: bool,
    /// Seconds z/OSMF may take before giving up on the request.
    #[arg(long, value_name = "SECONDS")]
    pub response_timeout: Option<u32>,
}

async fn delete(
    session: &ZosmfSession,
    format: OutputFormat,
    command: DeleteCommand,
) -> miette::Result<()> {
    match command {
        DeleteCommand::DataSet(args) => {
            delete_data_set(
                session,
                &args.data_set,
                args.volume_serial.as_deref(),
                args.response_timeout,
            )
            .await?;
            print_done(format, format!("Data set '{}' deleted.", args.data_set))
        }
        DeleteCommand::DataSetVsam(args) => {
            let options = DeleteVsamOptions {
                erase: args.erase,
                purge: args.purge,
            };
            let response = delete_vsam(session, &args.data_set, options).await?;
            finish_ams(format, "DELETE", response)
        }
        DeleteCommand::UssFile(args) => {
            delete_uss_file(session, &args.path, args.recursive, None).await?;
            print_done(format, format!("'{}' deleted.", args.path))
        }
        DeleteCommand::ZosFileSystem(args) => {
            delete_zfs(session, &args.name, args.response_timeout).await?;
            print_done(format, format!("File system '{}' deleted.", args.name))
        }
    }
}

// ---------------------------------------------------------------------------
// invoke

#[derive(Debug, Subcommand)]
pub enum InvokeCommand {
    /// Run IDCAMS access method services control statements.
    Ams(InvokeAmsArgs),
}

#[derive(Debug, Args)]
pub struct InvokeAmsArgs {
    /// Control statements to run.
    #[arg(value_name = "STATEMENT", required_unless_present = "file", conflicts_with = "file")]
    pub statements: Vec<String>,
    /// Read control statements from this file, one per line.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

fn read_statements(path: &Path) -> miette::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read control statements from {}", path.display()))?;
    Ok(contents
        .lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

async fn invoke(
    session: &ZosmfSession,
    format: OutputFormat,
    command: InvokeCommand,
) -> miette::Result<()> {
    match command {
        InvokeCommand::Ams(args) => {
            let statements = match &args.file {
                Some(path) => read_statements(path)?,
                None => args.statements.clone(),
            };
            let response = invoke_ams(session, &statements).await?;
            finish_ams(format, "run", response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: FilesCommand,
    }

    #[test]
    fn test_create_pds_maps_allocation_flags() {
        let cli = Harness::try_parse_from([
            "files",
            "create",
            "pds",
            "IBMUSER.SRC",
            "--size",
            "5CYL",
            "--record-format",
            "FB",
            "--record-length",
            "80",
            "--directory-blocks",
            "10",
            "--volume-serial",
            "STG100",
        ])
        .unwrap();
        let FilesCommand::Create(CreateCommand::DataSetPartitioned(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        assert_eq!(args.name, "IBMUSER.SRC");
        let options = args.options();
        assert_eq!(options.size.as_deref(), Some("5CYL"));
        assert_eq!(options.recfm.as_deref(), Some("FB"));
        assert_eq!(options.lrecl, Some(80));
        assert_eq!(options.dirblk, Some(10));
        assert_eq!(options.volser.as_deref(), Some("STG100"));
        assert_eq!(options.dsorg, None);
    }

    #[test]
    fn test_create_zfs_defaults() {
        let cli =
            Harness::try_parse_from(["files", "create", "zfs", "OMVS.TEST.ZFS"]).unwrap();
        let FilesCommand::Create(CreateCommand::ZosFileSystem(args)) = cli.command else {
            panic!("parsed into the wrong command");
        };
        let options = args.options();
        assert_eq!(options.perms, Some(755));
        assert_eq!(options.cyls_pri, Some(10));
        assert_eq!(options.cyls_sec, Some(2));
        assert_eq!(options.timeout, Some(20));
        assert_eq!(options.volumes, None);
    }

    #[test]
    fn test_delete_requires_for_sure() {
        let result = Harness::try_parse_from(["files", "delete", "ds", "IBMUSER.OLD"]);
        assert!(result.is_err());
        Harness::try_parse_from(["files", "delete", "ds", "IBMUSER.OLD", "-f"]).unwrap();
    }

    #[test]
    fn test_binary_files_conflicts_with_ascii_files() {
        let result = Harness::try_parse_from([
            "files",
            "upload",
            "dtu",
            "./src",
            "/u/ibmuser/src",
            "--binary-files",
            "a.bin",
            "--ascii-files",
            "b.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_files_map_prefers_given_list() {
        let map = files_map(vec!["a.bin".into()], Vec::new()).unwrap();
        assert!(map.binary);
        assert_eq!(map.file_names, vec!["a.bin".to_string()]);

        let map = files_map(Vec::new(), vec!["b.txt".into()]).unwrap();
        assert!(!map.binary);

        assert!(files_map(Vec::new(), Vec::new()).is_none());
    }

    #[test]
    fn test_invoke_ams_statements_conflict_with_file() {
        let result = Harness::try_parse_from([
            "files",
            "invoke",
            "ams",
            "DEFINE CLUSTER (NAME(A.B))",
            "--file",
            "defs.txt",
        ]);
        assert!(result.is_err());
        let result = Harness::try_parse_from(["files", "invoke", "ams"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_statements_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.txt");
        std::fs::write(&path, "DEFINE CLUSTER -\n\n  (NAME(A.B))  \n").unwrap();
        let statements = read_statements(&path).unwrap();
        assert_eq!(
            statements,
            vec!["DEFINE CLUSTER -".to_string(), "  (NAME(A.B))".to_string()]
        );
    }

    #[test]
    fn test_parse_migrated_recall() {
        assert_eq!(parse_migrated_recall("wait").unwrap(), MigratedRecall::Wait);
        assert_eq!(
            parse_migrated_recall("NOWAIT").unwrap(),
            MigratedRecall::NoWait
        );
        assert_eq!(
            parse_migrated_recall("Error").unwrap(),
            MigratedRecall::Error
        );
        assert!(parse_migrated_recall("maybe").is_err());
    }
}
