//! Clients for the z/OSMF jobs REST service.
//!
//! Everything here talks to `/zosmf/restjobs/jobs`:
//!
//! * [`submit`] puts JCL from a data set, USS file, local file, or an
//!   in-memory string on the internal reader
//! * [`get`] lists jobs, fetches status, and reads spool files
//! * [`monitor`] polls until a job reaches INPUT, ACTIVE, or OUTPUT
//! * [`download`] writes spool files to a local directory tree
//! * [`search`] scans spool content for a string or regex
//! * [`modify`] cancels, purges, holds, releases, and reclasses jobs

#![forbid(unsafe_code)]

pub mod download;
pub mod get;
pub mod modify;
pub mod monitor;
pub mod search;
pub mod submit;
mod types;

pub use types::{JclSource, Job, JobFeedback, JobFile, JobStatus, SpoolFile};
