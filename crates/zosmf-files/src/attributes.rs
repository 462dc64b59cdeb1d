//! Parser for `.zosattributes` files, which control how files under a
//! directory are uploaded to USS: which files to skip, and the local and
//! remote encodings to tag them with.
//!
//! Each non-comment line is `<pattern> -` to skip matching files,
//! `!<pattern>` to re-include files a previous line skipped, or
//! `<pattern> <local encoding> <remote encoding>`. The last matching
//! line wins. A file matched by no line is uploaded with `ISO8859-1` on
//! both sides, which transfers it as binary.

use globset::{Glob, GlobMatcher};
use std::path::Path;
use zosmf_sdk::{Result, ZosmfError};

/// File name conventionally holding upload attributes.
pub const DEFAULT_ATTRIBUTES_FILE: &str = ".zosattributes";

const DEFAULT_ENCODING: &str = "ISO8859-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Binary,
    Text,
}

#[derive(Debug, Clone)]
struct AttributeRule {
    matcher: GlobMatcher,
    /// Patterns without a slash also match on the file name alone.
    basename_match: bool,
    ignore: bool,
    local_encoding: Option<String>,
    remote_encoding: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ZosAttributes {
    rules: Vec<AttributeRule>,
    base_path: Option<String>,
}

impl ZosAttributes {
    /// Parse attribute file contents. Patterns are matched against paths
    /// relative to `base_path` when one is given.
    pub fn parse(contents: &str, base_path: Option<&str>) -> Result<Self> {
        let mut rules = Vec::new();
        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (pattern, ignore, local, remote) = match fields.as_slice() {
                [pattern, "-"] => (*pattern, true, None, None),
                [negated] if negated.starts_with('!') && negated.len() > 1 => {
                    (&negated[1..], false, None, None)
                }
                [pattern, local, remote] => {
                    (*pattern, false, Some(local.to_string()), Some(remote.to_string()))
                }
                _ => {
                    return Err(ZosmfError::validation(format!(
                        "syntax error on line {} of the attributes file, \
                         expected <pattern> <local encoding> <remote encoding>",
                        index + 1
                    )))
                }
            };
            let glob = Glob::new(pattern).map_err(|err| {
                ZosmfError::validation(format!(
                    "invalid pattern '{pattern}' on line {} of the attributes file: {err}",
                    index + 1
                ))
            })?;
            rules.push(AttributeRule {
                matcher: glob.compile_matcher(),
                basename_match: !pattern.contains('/'),
                ignore,
                local_encoding: local,
                remote_encoding: remote,
            });
        }
        Ok(Self {
            rules,
            base_path: base_path.map(str::to_string),
        })
    }

    /// Read and parse an attributes file from disk.
    pub fn from_file(path: &Path, base_path: Option<&str>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            ZosmfError::io(
                format!("could not read attributes file {}", path.display()),
                err,
            )
        })?;
        Self::parse(&contents, base_path)
    }

    fn find_last_match(&self, path: &Path) -> Option<&AttributeRule> {
        let stripped = match &self.base_path {
            Some(base) => path.strip_prefix(base).unwrap_or(path),
            None => path,
        };
        let candidate = stripped.to_string_lossy();
        let basename = stripped.file_name().map(|name| name.to_string_lossy());
        self.rules.iter().rev().find(|rule| {
            if rule.matcher.is_match(candidate.as_ref()) {
                return true;
            }
            match (&basename, rule.basename_match) {
                (Some(name), true) => rule.matcher.is_match(name.as_ref()),
                _ => false,
            }
        })
    }

    pub fn file_should_be_uploaded(&self, path: &Path) -> bool {
        self.find_last_match(path)
            .map(|rule| !rule.ignore)
            .unwrap_or(true)
    }

    /// Binary when the local and remote encodings are the same.
    pub fn transfer_mode(&self, path: &Path) -> TransferMode {
        match self.find_last_match(path) {
            Some(rule) if rule.local_encoding != rule.remote_encoding => TransferMode::Text,
            _ => TransferMode::Binary,
        }
    }

    pub fn remote_encoding(&self, path: &Path) -> String {
        self.find_last_match(path)
            .and_then(|rule| rule.remote_encoding.clone())
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
    }

    pub fn local_encoding(&self, path: &Path) -> String {
        self.find_last_match(path)
            .and_then(|rule| rule.local_encoding.clone())
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
    }
}
