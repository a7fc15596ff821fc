//! campus-core: trust and lifecycle integrity core for the campus platform.
//!
//! Two responsibilities live here. The trust side decides who may hold a
//! valid bearer credential: two-step challenge login, RS256 token pairs
//! carrying a per-user token version, refresh rotation and O(1) mass
//! revocation. The lifecycle side keeps administrative mutations honest:
//! all-or-nothing bulk delete and status transitions with in-transaction
//! audit records, explicit course access grants, and an append-only wiki
//! version ledger.
//!
//! Storage is abstracted behind [`store::CredentialStore`] and
//! [`store::ContentStore`]; [`store::MemoryStore`] is the in-process
//! implementation used by the test suites.

pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
