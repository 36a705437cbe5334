//! # Street Address Lines
//!
//! `street-address-lines` is a small HTTP resource service for `StreetAddressLine`
//! entities. It exposes three operations under `/api/streetaddresslines`:
//!
//! - `GET /{id}`: fetch a line by key. Keys below `1` are never looked up and answer `404`.
//! - `HEAD /{id}`: always answers `204 No Content` with an empty body.
//! - `POST`: store a line; the repository assigns the key and the response is
//!   `201 Created` with a `Location` pointing at the `GET` endpoint.
//!
//! ## Storage
//!
//! Handlers talk to a generic [`addresses::Repository`] capability. Two
//! implementations ship with the service:
//!
//! 1. **`PostgreSQL`** via `sqlx`, the default when a DSN is configured.
//! 2. **In-memory**, for local development (`--in-memory`) and tests.

pub mod addresses;
pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
