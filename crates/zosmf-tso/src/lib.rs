//! TSO address space management over the z/OSMF TSO/E REST services.
//!
//! - [`start`]: `POST /zosmf/tsoApp/tso` to start an address space
//! - [`send`]: `PUT`/`GET /zosmf/tsoApp/tso/{servletKey}` to exchange data
//! - [`stop`]: `DELETE /zosmf/tsoApp/tso/{servletKey}` to stop it
//! - [`issue`]: start, run one command, and stop in a single call

#![forbid(unsafe_code)]

pub mod issue;
pub mod send;
pub mod start;
pub mod stop;

mod types;

pub use types::{
    CollectedResponses, IssueResponse, SendResponse, StartStopResponse, StartTsoParms,
    TsoMessage, TsoMessages, ZosmfMessage, ZosmfTsoResponse, DEFAULT_CHSET, DEFAULT_COLS,
    DEFAULT_CPAGE, DEFAULT_PROC, DEFAULT_ROWS, DEFAULT_RSIZE,
};
