//! Uberport: uberserver SQL dump to Teiserver account export
//!
//! This crate converts a MySQL dump of an uberserver database into the single
//! JSON document consumed by Teiserver's uberserver importer. The conversion is
//! one linear pipeline over an in-memory dump:
//!
//! 1. **Statement extraction** -- Split the dump into statements and index the
//!    `INSERT INTO` ones by table, concatenating repeated inserts
//! 2. **Tuple decoding** -- Tokenize each value list into rows of raw literals,
//!    tracking quote state and parenthesis depth
//! 3. **User building** -- Build the user registry and rename emails that are
//!    shared between accounts to `{username}_{email}`
//! 4. **Linking** -- Attach friends (mutual), ignores, pending friend requests
//!    and verification codes to the users they belong to
//! 5. **Export** -- Write `{users, duplicated_emails}` as JSON
//!
//! Any malformed statement, bad row, duplicate key or dangling user reference
//! aborts the run; no partial document is ever written.
//!
//! # Key Modules
//!
//! - [`statements`] -- Quote-aware statement splitting and INSERT indexing
//! - [`tuples`] -- Value-list tokenizer and literal helpers
//! - [`users`] -- User registry construction and email reconciliation
//! - [`links`] -- Friends, ignores, friend requests and verifications passes
//! - [`pipeline`] -- Stage ordering and progress reporting
//! - [`export`] -- JSON document output
//! - [`dump`] -- Dump loading with optional BZ2 decompression
//! - [`models`] -- Core data types (UserRecord, Registry, OutputDocument)
//! - [`error`] -- Error taxonomy
//! - [`stats`] -- Per-run counters
//! - [`config`] -- Table names and row shapes
//!
//! # Example Usage
//!
//! ```bash
//! # Convert a dump, writing uberserver_export.json in the current directory
//! uberport backup.sql
//!
//! # Compressed dump, custom output path, verbose logging
//! uberport backup.sql.bz2 -o export/uberserver_export.json -v
//! ```

pub mod config;
pub mod dump;
pub mod error;
pub mod export;
pub mod links;
pub mod models;
pub mod pipeline;
pub mod statements;
pub mod stats;
pub mod tuples;
pub mod users;
