//! Flow controller scenario tests.
//!
//! - `harness.rs` - Scripted IDX client and response builders
//! - `login.rs`   - Automatic identify/password steps and token exchange
//! - `steps.rs`   - Rendered steps: field edits, selection, retry
//! - `errors.rs`  - Client failures, unsupported steps, state guards

pub(crate) mod harness;
