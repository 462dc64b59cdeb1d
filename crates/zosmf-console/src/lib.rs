//! Clients for the z/OSMF console REST service.
//!
//! Everything here talks to `/zosmf/restconsoles/consoles`:
//!
//! * [`issue`] puts MVS commands on an EMCS console (default `defcn`)
//! * [`collect`] fetches solicited messages left behind by a command
//!   via `solmsgs/<response key>`

#![forbid(unsafe_code)]

pub mod collect;
pub mod issue;
mod types;

pub use types::{
    CollectParms, ConsoleResponse, IssueParms, ZosmfIssueParms, ZosmfIssueResponse,
    DEFAULT_CONSOLE, DEFAULT_FOLLOW_UP_ATTEMPTS,
};
