//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep report/payload structs in one place.
//! - Avoid cyclic imports and duplicated type definitions.
//! - Make JSON wire shapes (upstream body, client payload) explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — archive keys, reduced reports, tier and outcome enums.
//! - `constants.rs` — stable constants (upstream API prefix, client messages).
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! `ArfReport` and `OvalReport` are what Foreman receives. Field names are
//! part of the upstream contract; see `docs/contracts/*`.

pub mod constants;
pub mod models;
