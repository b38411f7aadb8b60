#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Coordination core of the Romanizer web client.
//!
//! Layout: `api.rs` (transport trait and mutation requests), `http.rs`
//! (reqwest implementation), `ticker.rs`/`poll.rs` (cancellable repeating
//! task), `content.rs` (sentinel text to readiness), `hydration.rs` and
//! `jobs.rs` (pollers), `selection.rs`, `library.rs`, `bulk.rs` and
//! `mutations.rs` (list-page state and mutations).

pub mod api;
pub mod bulk;
pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod hydration;
pub mod jobs;
pub mod library;
pub mod mutations;
pub mod poll;
pub mod selection;
pub mod ticker;

pub use api::{JobStatusReply, MutationRequest, RomanizerApi, ensure_accepted};
pub use bulk::{AlwaysConfirm, BulkAction, BulkError, BulkMutationReconciler, BulkReport, Confirm};
pub use config::{ClientConfig, ConfigError, HydrationSettings, PrimingSettings};
pub use content::{Readiness, assess};
pub use error::{ClientError, ClientResult};
pub use http::HttpApi;
pub use hydration::{
    ContentSlot, HydrationReport, HydrationSession, HydrationStart, PendingFlags, SessionPhase,
    SlotValue,
};
pub use jobs::{JobProgressPoller, JobReport, JobStatus, PrimingStart, dispatch_priming};
pub use library::{LibraryList, LibraryRow, LibraryView, ListKind};
pub use mutations::{LibraryActions, TrackRemoval};
pub use poll::{PollHandle, PollStep, PollTarget, TickOutcome, spawn_poll_loop};
pub use selection::{SelectionControls, SelectionCoordinator, SelectionError};
pub use ticker::{IntervalTicker, Ticker};
