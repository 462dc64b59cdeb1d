//! Names of the `X-IBM-*` headers the z/OSMF REST services understand.
//!
//! Values are built by the service crates; only the names live here so
//! the vocabulary stays in one place.

/// Cross-site request forgery guard. z/OSMF rejects REST calls that do
/// not carry this header; the value is ignored.
pub const X_CSRF_ZOSMF_HEADER: &str = "X-CSRF-ZOSMF-HEADER";

/// Transfer mode for file content: `binary`, `record`, or `text` with an
/// optional `;fileEncoding=<codepage>` suffix.
pub const X_IBM_DATA_TYPE: &str = "X-IBM-Data-Type";

/// `base` requests full attributes on list responses.
pub const X_IBM_ATTRIBUTES: &str = "X-IBM-Attributes";

/// Caps the number of items a list response may return. `0` means all.
pub const X_IBM_MAX_ITEMS: &str = "X-IBM-Max-Items";

/// How to treat migrated data sets: `wait`, `nowait`, or `error`.
pub const X_IBM_MIGRATED_RECALL: &str = "X-IBM-Migrated-Recall";

/// `true` asks the server to return the content ETag on every response,
/// not only for small files.
pub const X_IBM_RETURN_ETAG: &str = "X-IBM-Return-Etag";

/// Seconds z/OSMF should wait for the back end before giving up.
pub const X_IBM_RESPONSE_TIMEOUT: &str = "X-IBM-Response-Timeout";

/// Record subrange of a spool file, formatted as `first-last`.
pub const X_IBM_RECORD_RANGE: &str = "X-IBM-Record-Range";

/// Carries option keywords such as `recursive` for directory deletes.
pub const X_IBM_OPTION: &str = "X-IBM-Option";

/// Internal reader transfer mode for submitted JCL text.
pub const X_IBM_INTRDR_MODE: &str = "X-IBM-Intrdr-Mode";

/// Logical record length of submitted JCL text.
pub const X_IBM_INTRDR_LRECL: &str = "X-IBM-Intrdr-Lrecl";

/// Record format of submitted JCL text, `F` or `V`.
pub const X_IBM_INTRDR_RECFM: &str = "X-IBM-Intrdr-Recfm";

/// Prefix for JCL symbol substitution headers; the symbol name is
/// appended to form the full header name.
pub const X_IBM_JCL_SYMBOL_PREFIX: &str = "X-IBM-JCL-Symbol-";

/// Selects the job modify interface version, `1.0` or `2.0`.
pub const X_IBM_JOB_MODIFY_VERSION: &str = "X-IBM-Job-Modify-Version";
