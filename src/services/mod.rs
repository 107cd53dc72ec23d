//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `pipeline.rs` — ingestion state machine (decompress/reduce/upload/store).
//! - `report_kind.rs` — ARF vs OVAL: parsing and upload resource per kind.
//! - `decompress.rs` — external decompressor over a staged temp file.
//! - `xml.rs` — namespace-agnostic `roxmltree` lookups + parse errors.
//! - `arf.rs` — XCCDF rule catalog and test result from an ARF document.
//! - `reducer.rs` — catalog + results into the flat upload report.
//! - `oval.rs` — OVAL results document into the flat upload report.
//! - `upload.rs` — Foreman HTTP client behind the `Uploader` trait.
//! - `storage.rs` — four-tier archive store keyed by cname/id/date/digest.
//! - `settings.rs` — TOML settings file.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod arf;
pub mod decompress;
pub mod output;
pub mod oval;
pub mod pipeline;
pub mod reducer;
pub mod report_kind;
pub mod settings;
pub mod storage;
pub mod upload;
pub mod xml;
