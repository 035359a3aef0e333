//! `datagov` - government project watcher and meeting tracker
//!
//! This crate mirrors a government open-data companion app: it lists
//! projects and categories from a remote realtime document store, keeps
//! user-created meeting records in a local sqlite database, polls the
//! remote store on a coarse schedule to notify about newly created
//! projects, and hosts a pausable elapsed-time timer service with a
//! persistent notification readout.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Performance
    clippy::inefficient_to_string,
    clippy::needless_pass_by_value,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,

    // Style consistency
    clippy::enum_glob_use,
    clippy::inconsistent_struct_constructor,
    clippy::missing_errors_doc,
)]
#![allow(
    // Pedantic lints that hurt readability here
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

/// Periodic new-project detection: watermark comparison and scheduling
pub mod checker;
/// Command-line surface (subcommands and the interactive agent)
pub mod cli;
/// Configuration loading from config.toml and the environment
pub mod config;
/// Dashboard aggregation over remote and local data
pub mod dashboard;
/// Local sqlite store: meetings table plus named app-state entries
pub mod db;
/// Error and Result types shared across the crate
pub mod errors;
/// Core data models (projects, categories, meetings)
pub mod models;
/// Notification surface (new-project alerts, persistent timer readout)
pub mod notify;
/// Remote realtime document store client and wire coercion
pub mod remote;
/// User preferences (dark-mode flag)
pub mod settings;
/// Timer service state machine and its broadcast
pub mod timer;

pub use errors::{Error, Result};
