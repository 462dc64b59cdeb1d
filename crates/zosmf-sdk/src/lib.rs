//! Core client for the z/OSMF REST services.
//!
//! This crate owns the pieces the service crates share:
//!
//! * [`session`]: connection settings, credentials, and the HTTP client
//!   that signs and sends every request
//! * [`error`]: the common error taxonomy, including the parsed server
//!   error document
//! * [`auth`]: token issue and revocation plus password changes
//! * [`info`] and [`topology`]: instance identity and defined systems
//! * [`headers`]: the `X-IBM-*` header vocabulary
//!
//! Endpoints covered here:
//! * `/zosmf/info`
//! * `/zosmf/resttopology/systems`
//! * `/zosmf/services/authenticate`

#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod headers;
pub mod info;
pub mod session;
pub mod topology;

pub use error::{ApiErrorBody, Result, ZosmfError};
pub use session::{encode_uri_component, Protocol, ZosmfAuth, ZosmfConnection, ZosmfSession};
