//! Clients for the z/OSMF files REST service.
//!
//! Everything here talks to `/zosmf/restfiles`:
//!
//! * `ds` for data sets and members ([`create`], [`list`], [`download`],
//!   [`upload`], [`delete`])
//! * `fs` for USS files and directories, plus `mfs` for mounted file
//!   systems and zFS aggregates
//! * `ams` for IDCAMS access method services ([`invoke`])
//!
//! Local-to-remote transfer behavior (text or binary, codepages, and
//! ignore rules) can be driven per file by a `.zosattributes` file
//! ([`attributes`]).

#![forbid(unsafe_code)]

pub mod attributes;
pub mod create;
pub mod delete;
pub mod download;
pub mod invoke;
pub mod list;
pub mod upload;
mod util;

pub use util::{dirs_from_data_set, generate_member_name};
