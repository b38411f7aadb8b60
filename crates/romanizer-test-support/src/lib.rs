#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (payload builders), mocks.rs (scripted API and manual ticker), assert.rs (event assertions).

pub mod assert;
pub mod fixtures;
pub mod mocks;
