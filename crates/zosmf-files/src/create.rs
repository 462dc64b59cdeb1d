//! Clients for the create endpoints of the file REST interface.
//!
//! * `POST /zosmf/restfiles/ds/<dsn>` allocates sequential and
//!   partitioned data sets, either from typed defaults or modeled after
//!   an existing data set
//! * VSAM clusters are defined by generating an IDCAMS `DEFINE CLUSTER`
//!   command and running it through [`invoke_ams`]
//! * `POST /zosmf/restfiles/fs/<path>` creates USS files and directories
//! * `POST /zosmf/restfiles/mfs/zfs/<fsname>` creates z/OS file systems

use crate::invoke::{invoke_ams, AmsResponse};
use crate::util::{dataset_resource, uss_resource, RESOURCE};
use reqwest::Method;
use serde::Serialize;
use zosmf_sdk::{encode_uri_component, headers, Result, ZosmfError, ZosmfSession};

/// Largest primary or secondary allocation z/OSMF accepts.
pub const MAX_ALLOC_QUANTITY: u64 = 16_777_215;

/// Bounds for the VSAM `FOR(days)` retention clause.
pub const MIN_RETAIN_DAYS: i64 = 0;
pub const MAX_RETAIN_DAYS: i64 = 93_000;

const VSAM_DSORG_CHOICES: [&str; 9] = [
    "INDEXED",
    "IXD",
    "LINEAR",
    "LIN",
    "NONINDEXED",
    "NIXD",
    "NUMBERED",
    "NUMD",
    "ZFS",
];
const VSAM_ALCUNIT_CHOICES: [&str; 5] = ["CYL", "TRK", "MB", "KB", "REC"];
const DSNTYPE_CHOICES: [&str; 8] = [
    "BASIC", "EXTPREF", "EXTREQ", "HFS", "LARGE", "PDS", "LIBRARY", "PIPE",
];
const RECFM_CHOICES: [&str; 13] = [
    "D", "DB", "DBS", "DS", "F", "FB", "FBS", "FS", "V", "VB", "VBS", "VS", "U",
];
const MAX_ZFS_PERMS: u32 = 777;

/// Data set layout a create request starts from. Each variant carries
/// attribute defaults that caller options are laid over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDataSetType {
    /// A PDS for arbitrary text members.
    Partitioned,
    /// A physical sequential data set.
    Sequential,
    /// A PDS laid out for JCL and similar fixed-block text.
    Classic,
    /// A PDS laid out for C source code.
    C,
    /// A PDS for executables and other binary content.
    Binary,
    /// No defaults; every attribute comes from the caller.
    Blank,
}

impl CreateDataSetType {
    pub fn defaults(self) -> CreateDataSetOptions {
        let mut defaults = CreateDataSetOptions::default();
        match self {
            Self::Partitioned => {
                defaults.alcunit = Some("CYL".to_string());
                defaults.dsorg = Some("PO".to_string());
                defaults.primary = Some(1);
                defaults.dirblk = Some(5);
                defaults.recfm = Some("FB".to_string());
                defaults.blksize = Some(6160);
                defaults.lrecl = Some(80);
            }
            Self::Sequential => {
                defaults.alcunit = Some("CYL".to_string());
                defaults.dsorg = Some("PS".to_string());
                defaults.primary = Some(1);
                defaults.recfm = Some("FB".to_string());
                defaults.blksize = Some(6160);
                defaults.lrecl = Some(80);
            }
            Self::Classic => {
                defaults.alcunit = Some("CYL".to_string());
                defaults.dsorg = Some("PO".to_string());
                defaults.primary = Some(1);
                defaults.recfm = Some("FB".to_string());
                defaults.blksize = Some(6160);
                defaults.lrecl = Some(80);
                defaults.dirblk = Some(25);
            }
            Self::C => {
                defaults.dsorg = Some("PO".to_string());
                defaults.alcunit = Some("CYL".to_string());
                defaults.primary = Some(1);
                defaults.recfm = Some("VB".to_string());
                defaults.blksize = Some(32760);
                defaults.lrecl = Some(260);
                defaults.dirblk = Some(25);
            }
            Self::Binary => {
                defaults.dsorg = Some("PO".to_string());
                defaults.alcunit = Some("CYL".to_string());
                defaults.primary = Some(10);
                defaults.recfm = Some("U".to_string());
                defaults.blksize = Some(27998);
                defaults.lrecl = Some(27998);
                defaults.dirblk = Some(25);
            }
            Self::Blank => {}
        }
        defaults
    }
}

/// Allocation attributes for a data set create request. Field names
/// match the wire form; unset fields stay off the wire entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateDataSetOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsorg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcunit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirblk: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avgblk: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recfm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blksize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lrecl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgntclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsntype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<String>,
    /// Allocation shorthand such as `10CYL`: the letters become
    /// `alcunit`, the digits `primary`. Consumed before the request is
    /// built and never sent on the wire.
    #[serde(skip)]
    pub size: Option<String>,
    /// Forwarded as `X-IBM-Response-Timeout`.
    #[serde(skip)]
    pub response_timeout: Option<u32>,
}

impl CreateDataSetOptions {
    /// Fill unset fields from the type defaults; caller values win.
    fn or_defaults(self, defaults: Self) -> Self {
        Self {
            volser: self.volser.or(defaults.volser),
            unit: self.unit.or(defaults.unit),
            dsorg: self.dsorg.or(defaults.dsorg),
            alcunit: self.alcunit.or(defaults.alcunit),
            primary: self.primary.or(defaults.primary),
            secondary: self.secondary.or(defaults.secondary),
            dirblk: self.dirblk.or(defaults.dirblk),
            avgblk: self.avgblk.or(defaults.avgblk),
            recfm: self.recfm.or(defaults.recfm),
            blksize: self.blksize.or(defaults.blksize),
            lrecl: self.lrecl.or(defaults.lrecl),
            storclass: self.storclass.or(defaults.storclass),
            mgntclass: self.mgntclass.or(defaults.mgntclass),
            dataclass: self.dataclass.or(defaults.dataclass),
            dsntype: self.dsntype.or(defaults.dsntype),
            like: self.like.or(defaults.like),
            size: self.size,
            response_timeout: self.response_timeout,
        }
    }
}

/// Split an allocation shorthand like `640KB` into its unit and count.
pub(crate) fn split_size(size: &str) -> (Option<String>, Option<u64>) {
    let unit: String = size
        .chars()
        .filter(|ch| ch.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    let digits: String = size.chars().filter(|ch| ch.is_ascii_digit()).collect();
    ((!unit.is_empty()).then_some(unit), digits.parse().ok())
}

fn ten_percent(quantity: u64) -> u64 {
    (quantity as f64 * 0.10).round() as u64
}

/// Allocate a data set. Returns the effective attributes that were sent,
/// after defaults, the size shorthand, and corrections were applied.
pub async fn create_data_set(
    session: &ZosmfSession,
    data_set_type: CreateDataSetType,
    data_set_name: &str,
    options: CreateDataSetOptions,
) -> Result<CreateDataSetOptions> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let mut effective = options.or_defaults(data_set_type.defaults());
    if let Some(size) = effective.size.take() {
        let (unit, primary) = split_size(&size);
        if let Some(unit) = unit {
            effective.alcunit = Some(unit);
        }
        if let Some(primary) = primary {
            effective.primary = Some(primary);
            if effective.secondary.is_none() {
                effective.secondary = Some(ten_percent(primary));
            }
        }
    } else if effective.secondary.is_none() {
        match data_set_type {
            CreateDataSetType::Blank => {}
            CreateDataSetType::Binary => effective.secondary = Some(10),
            _ => effective.secondary = Some(1),
        }
    }
    validate_data_set_options(&mut effective)?;

    let mut builder = session
        .request(Method::POST, &dataset_resource(data_set_name, None))?
        .json(&effective);
    if let Some(timeout) = effective.response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    session.send_discard(builder).await?;
    tracing::info!(data_set = %data_set_name, "data set created");
    Ok(effective)
}

/// Allocate a data set with the attributes of an existing one via the
/// `like` keyword. Caller options override the modeled attributes.
pub async fn create_data_set_like(
    session: &ZosmfSession,
    data_set_name: &str,
    like_data_set_name: &str,
    options: CreateDataSetOptions,
) -> Result<CreateDataSetOptions> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    if like_data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("model data set name is required"));
    }
    let mut effective = options;
    effective.like = Some(like_data_set_name.to_string());
    effective.size = None;
    validate_data_set_options(&mut effective)?;

    let mut builder = session
        .request(Method::POST, &dataset_resource(data_set_name, None))?
        .json(&effective);
    if let Some(timeout) = effective.response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }
    session.send_discard(builder).await?;
    tracing::info!(data_set = %data_set_name, like = %like_data_set_name, "data set created");
    Ok(effective)
}

/// Check fields the server would reject and apply the corrections z/OSMF
/// itself would make, so the sent attributes match what gets allocated.
fn validate_data_set_options(options: &mut CreateDataSetOptions) -> Result<()> {
    if let Some(alcunit) = &options.alcunit {
        if !alcunit.eq_ignore_ascii_case("CYL") && !alcunit.eq_ignore_ascii_case("TRK") {
            return Err(ZosmfError::validation(format!(
                "invalid allocation unit '{alcunit}', expected CYL or TRK"
            )));
        }
    }
    if let (Some(blksize), Some(lrecl)) = (options.blksize, options.lrecl) {
        // A block smaller than the record length cannot hold one record.
        if blksize <= lrecl {
            if options.recfm.is_none() {
                options.recfm = Some("FB".to_string());
            }
            let recfm = options.recfm.as_deref().unwrap_or("").to_uppercase();
            options.blksize = Some(match recfm.as_str() {
                "V" | "VB" | "VBS" | "VS" => lrecl + 4,
                _ => lrecl,
            });
        }
    }
    if let Some(dirblk) = options.dirblk {
        let dsorg = options.dsorg.as_deref().unwrap_or("");
        if dsorg.eq_ignore_ascii_case("PS") && dirblk != 0 {
            return Err(ZosmfError::validation(
                "directory blocks cannot be allocated for a sequential data set",
            ));
        }
        if dsorg.eq_ignore_ascii_case("PO") && dirblk == 0 {
            return Err(ZosmfError::validation(
                "a partitioned data set requires directory blocks",
            ));
        }
    }
    if let Some(dsntype) = &options.dsntype {
        if !DSNTYPE_CHOICES
            .iter()
            .any(|choice| choice.eq_ignore_ascii_case(dsntype))
        {
            return Err(ZosmfError::validation(format!(
                "invalid dsntype '{dsntype}'"
            )));
        }
    }
    if let Some(dsorg) = &options.dsorg {
        if !dsorg.eq_ignore_ascii_case("PO") && !dsorg.eq_ignore_ascii_case("PS") {
            return Err(ZosmfError::validation(format!(
                "invalid data set organization '{dsorg}', expected PO or PS"
            )));
        }
    }
    for (name, quantity) in [("primary", options.primary), ("secondary", options.secondary)] {
        if let Some(quantity) = quantity {
            if quantity > MAX_ALLOC_QUANTITY {
                return Err(ZosmfError::validation(format!(
                    "maximum allocation quantity of {MAX_ALLOC_QUANTITY} exceeded for '{name}'"
                )));
            }
        }
    }
    if let Some(recfm) = &options.recfm {
        if !RECFM_CHOICES
            .iter()
            .any(|choice| choice.eq_ignore_ascii_case(recfm))
        {
            return Err(ZosmfError::validation(format!(
                "invalid record format '{recfm}'"
            )));
        }
    }
    Ok(())
}

/// Caller-facing attributes for defining a VSAM cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateVsamOptions {
    pub dsorg: Option<String>,
    pub alcunit: Option<String>,
    pub primary: Option<u64>,
    pub secondary: Option<u64>,
    /// Days to retain the cluster, becomes `FOR(days)`.
    pub retain_for: Option<i64>,
    /// Expiration date `yyyyddd`, becomes `TO(date)`.
    pub retain_to: Option<String>,
    pub volumes: Option<String>,
    pub storclass: Option<String>,
    pub mgntclass: Option<String>,
    pub dataclass: Option<String>,
    /// Allocation shorthand such as `640KB`.
    pub size: Option<String>,
}

/// Fully resolved VSAM attributes, ready to be rendered into IDCAMS
/// control statements.
#[derive(Debug, Clone, PartialEq)]
pub struct VsamAttributes {
    pub dsorg: String,
    pub alcunit: String,
    pub primary: u64,
    pub secondary: u64,
    pub retain_for: Option<i64>,
    pub retain_to: Option<String>,
    pub volumes: Option<String>,
    pub storclass: Option<String>,
    pub mgntclass: Option<String>,
    pub dataclass: Option<String>,
}

/// Apply the size shorthand and defaults, then validate. Defaults are an
/// indexed cluster of 840 kilobytes; a missing secondary quantity becomes
/// ten percent of the primary.
pub fn resolve_vsam_options(mut options: CreateVsamOptions) -> Result<VsamAttributes> {
    if let Some(size) = options.size.take() {
        let (unit, primary) = split_size(&size);
        if let Some(unit) = unit {
            options.alcunit = Some(unit);
        }
        if let Some(primary) = primary {
            options.primary = Some(primary);
        }
    }
    let dsorg = options.dsorg.unwrap_or_else(|| "INDEXED".to_string());
    let alcunit = options.alcunit.unwrap_or_else(|| "KB".to_string());
    let primary = options.primary.unwrap_or(840);
    let secondary = options.secondary.unwrap_or_else(|| ten_percent(primary));

    if !VSAM_DSORG_CHOICES
        .iter()
        .any(|choice| choice.eq_ignore_ascii_case(&dsorg))
    {
        return Err(ZosmfError::validation(format!(
            "invalid VSAM data set organization '{dsorg}'"
        )));
    }
    if !VSAM_ALCUNIT_CHOICES
        .iter()
        .any(|choice| choice.eq_ignore_ascii_case(&alcunit))
    {
        return Err(ZosmfError::validation(format!(
            "invalid VSAM allocation unit '{alcunit}'"
        )));
    }
    for (name, quantity) in [("primary", primary), ("secondary", secondary)] {
        if quantity > MAX_ALLOC_QUANTITY {
            return Err(ZosmfError::validation(format!(
                "maximum allocation quantity of {MAX_ALLOC_QUANTITY} exceeded for '{name}' with value {quantity}"
            )));
        }
    }
    if let Some(days) = options.retain_for {
        if !(MIN_RETAIN_DAYS..=MAX_RETAIN_DAYS).contains(&days) {
            return Err(ZosmfError::validation(format!(
                "retention of {days} days is outside the range {MIN_RETAIN_DAYS} to {MAX_RETAIN_DAYS}"
            )));
        }
    }
    Ok(VsamAttributes {
        dsorg,
        alcunit,
        primary,
        secondary,
        retain_for: options.retain_for,
        retain_to: options.retain_to,
        volumes: options.volumes,
        storclass: options.storclass,
        mgntclass: options.mgntclass,
        dataclass: options.dataclass,
    })
}

/// Render the IDCAMS `DEFINE CLUSTER` command for the given attributes.
/// Optional clauses are emitted only when set.
pub fn vsam_define_statement(data_set_name: &str, attributes: &VsamAttributes) -> String {
    let mut command = String::from("DEFINE CLUSTER -\n(");
    command.push_str(&format!("NAME('{}') -\n", data_set_name.to_uppercase()));
    command.push_str(&format!("{} -\n", attributes.dsorg.to_uppercase()));
    command.push_str(&format!(
        "{}({} {}) -\n",
        attributes.alcunit.to_uppercase(),
        attributes.primary,
        attributes.secondary
    ));
    if let Some(retain_to) = &attributes.retain_to {
        command.push_str(&format!("TO({retain_to}) -\n"));
    }
    if let Some(retain_for) = attributes.retain_for {
        command.push_str(&format!("FOR({retain_for}) -\n"));
    }
    if let Some(volumes) = &attributes.volumes {
        command.push_str(&format!("VOLUMES({}) -\n", volumes.to_uppercase()));
    }
    if let Some(storclass) = &attributes.storclass {
        command.push_str(&format!("STORAGECLASS({storclass}) -\n"));
    }
    if let Some(mgntclass) = &attributes.mgntclass {
        command.push_str(&format!("MANAGEMENTCLASS({mgntclass}) -\n"));
    }
    if let Some(dataclass) = &attributes.dataclass {
        command.push_str(&format!("DATACLASS({dataclass}) -\n"));
    }
    command.push(')');
    command
}

/// Define a VSAM cluster through IDCAMS.
pub async fn create_vsam(
    session: &ZosmfSession,
    data_set_name: &str,
    options: CreateVsamOptions,
) -> Result<AmsResponse> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let attributes = resolve_vsam_options(options)?;
    let statement = vsam_define_statement(data_set_name, &attributes);
    tracing::debug!(command = %statement, "defining VSAM cluster");
    invoke_ams(session, &[statement]).await
}

/// Kind of USS entry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UssType {
    File,
    Directory,
}

impl UssType {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

#[derive(Serialize)]
struct CreateUssRequest<'a> {
    #[serde(rename = "type")]
    entry_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
}

/// Create a USS file or directory, optionally with a symbolic permission
/// string such as `rwxr-xr-x`.
pub async fn create_uss(
    session: &ZosmfSession,
    uss_path: &str,
    entry_type: UssType,
    mode: Option<&str>,
) -> Result<()> {
    if uss_path.trim().is_empty() {
        return Err(ZosmfError::validation("USS path is required"));
    }
    let builder = session
        .request(Method::POST, &uss_resource(uss_path))?
        .json(&CreateUssRequest {
            entry_type: entry_type.as_str(),
            mode,
        });
    session.send_discard(builder).await?;
    tracing::info!(path = %uss_path, kind = entry_type.as_str(), "USS entry created");
    Ok(())
}

/// Attributes for creating a z/OS file system.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateZfsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perms: Option<u32>,
    #[serde(rename = "cylsPri", skip_serializing_if = "Option::is_none")]
    pub cyls_pri: Option<u64>,
    #[serde(rename = "cylsSec", skip_serializing_if = "Option::is_none")]
    pub cyls_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgntclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,
    /// Seconds the aggregate create may run, sent as a query parameter.
    #[serde(skip)]
    pub timeout: Option<u32>,
}

#[derive(Serialize)]
struct CreateZfsRequest<'a> {
    #[serde(flatten)]
    options: &'a CreateZfsOptions,
    #[serde(rename = "JSONversion")]
    json_version: u32,
}

/// Create a z/OS file system aggregate.
pub async fn create_zfs(
    session: &ZosmfSession,
    file_system_name: &str,
    options: CreateZfsOptions,
) -> Result<()> {
    if file_system_name.trim().is_empty() {
        return Err(ZosmfError::validation("file system name is required"));
    }
    let perms = options
        .perms
        .ok_or_else(|| ZosmfError::validation("the 'perms' attribute is required"))?;
    if perms > MAX_ZFS_PERMS {
        return Err(ZosmfError::validation(format!(
            "invalid permissions '{perms}', expected a value up to {MAX_ZFS_PERMS}"
        )));
    }
    for (name, quantity) in [("cyls-pri", options.cyls_pri), ("cyls-sec", options.cyls_sec)] {
        let quantity =
            quantity.ok_or_else(|| ZosmfError::validation(format!("the '{name}' attribute is required")))?;
        if quantity > MAX_ALLOC_QUANTITY {
            return Err(ZosmfError::validation(format!(
                "maximum allocation quantity of {MAX_ALLOC_QUANTITY} exceeded for '{name}' with value {quantity}"
            )));
        }
    }
    let timeout = options
        .timeout
        .ok_or_else(|| ZosmfError::validation("the 'timeout' attribute is required"))?;

    let resource = format!(
        "{RESOURCE}/mfs/zfs/{}?timeout={timeout}",
        encode_uri_component(file_system_name)
    );
    let builder = session
        .request(Method::POST, &resource)?
        .json(&CreateZfsRequest {
            options: &options,
            json_version: 1,
        });
    session.send_discard(builder).await?;
    tracing::info!(file_system = %file_system_name, "z/OS file system created");
    Ok(())
}
