//! # petrel-config
//!
//! Configuration layer for Petrel sandboxes.
//!
//! Handles:
//! - **Resources**: typed schema for the five resource kinds and the global
//!   config singleton.
//! - **Store**: YAML file persistence under the config root.
//! - **Resolution**: reference dereferencing and default substitution into
//!   one `EffectiveConfig` per project.
//! - **Validation**: accumulate-and-report semantic checks.
//! - **Credentials**: host-side discovery of agent authentication files.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod credentials;
pub mod resolve;
pub mod resources;
pub mod store;
pub mod validate;
