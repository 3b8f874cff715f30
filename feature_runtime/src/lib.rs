#![forbid(unsafe_code)]

//! Feature Resolver — Runtime
//!
//! Everything around the pure resolver: rule files on disk, TOML build
//! profiles, verifiable resolution reports, drift between reports and
//! concurrent batch resolution.
//!
//! Resolution semantics live in `feature_resolver`; nothing here changes
//! which flags end up active.

pub mod batch;
pub mod config;
pub mod drift;
pub mod report;
pub mod rule_file;
