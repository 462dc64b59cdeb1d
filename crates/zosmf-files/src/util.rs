//! Path and header helpers shared by the file operations.

use std::path::Path;
use zosmf_sdk::{encode_uri_component, headers};

/// Root of the z/OSMF file REST interface.
pub(crate) const RESOURCE: &str = "/zosmf/restfiles";

/// Extension appended to generated download paths.
pub(crate) const DEFAULT_FILE_EXTENSION: &str = "txt";

const MAX_MEMBER_LENGTH: usize = 8;

/// Resource path for a data set, with the optional volume infix that
/// bypasses the catalog: `/ds/-(VOLSER)/DSN`.
pub(crate) fn dataset_resource(data_set_name: &str, volume: Option<&str>) -> String {
    match volume {
        Some(volume) => format!(
            "{RESOURCE}/ds/-({})/{}",
            encode_uri_component(volume),
            encode_uri_component(data_set_name)
        ),
        None => format!("{RESOURCE}/ds/{}", encode_uri_component(data_set_name)),
    }
}

/// Resource path for a USS file or directory. The leading slash is
/// dropped and the rest is encoded as a single component, so separators
/// travel as `%2F`.
pub(crate) fn uss_resource(uss_path: &str) -> String {
    format!("{RESOURCE}/fs/{}", encode_uri_component(sanitize_uss_path(uss_path)))
}

pub(crate) fn sanitize_uss_path(uss_path: &str) -> &str {
    uss_path.trim_start_matches('/')
}

/// Derive a member name from a local file name: drop the extension,
/// uppercase, strip characters a member cannot hold, strip leading
/// digits, and truncate to eight characters.
pub fn generate_member_name(file_name: &Path) -> String {
    let stem = file_name
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .filter(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, '@' | '#' | '$'))
        .collect();
    cleaned
        .trim_start_matches(|ch: char| ch.is_ascii_digit())
        .chars()
        .take(MAX_MEMBER_LENGTH)
        .collect()
}

/// Turn a data set name into the local directory layout used for
/// generated download paths: qualifiers become directories and a member
/// becomes the file name, all lowercased.
pub fn dirs_from_data_set(data_set_name: &str) -> String {
    let mut local = data_set_name.replace('.', "/").to_lowercase();
    if local.contains('(') && local.ends_with(')') {
        local = local.replacen('(', "/", 1);
        local.pop();
    }
    local
}

/// Ensure a non-empty extension starts with a dot.
pub(crate) fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

/// Content transfer headers derived from the binary/record/encoding
/// options, shared by uploads and downloads.
pub(crate) fn data_type_headers(
    binary: bool,
    record: bool,
    encoding: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    if binary {
        out.push((headers::X_IBM_DATA_TYPE, "binary".to_string()));
    } else if record {
        out.push((headers::X_IBM_DATA_TYPE, "record".to_string()));
    } else if let Some(encoding) = encoding {
        out.push((headers::X_IBM_DATA_TYPE, format!("text;fileEncoding={encoding}")));
    }
    out
}
