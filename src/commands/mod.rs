//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `submit.rs` — submit-arf/submit-oval through the ingestion pipeline.
//! - `archive.rs` — fetch/delete/spool-errors against the storage tiers.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod archive;
pub mod submit;

pub use archive::handle_archive_commands;
pub use submit::handle_submit_commands;
