#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Telemetry primitives shared across the Romanizer workspace.
//!
//! Logging setup and request correlation live here so the CLI and the
//! coordination core report through one consistent subscriber.

mod context;
mod error;
mod init;

pub use context::{GlobalContextGuard, current_request_id, with_request_id};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
