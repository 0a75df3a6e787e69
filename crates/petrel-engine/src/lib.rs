//! # petrel-engine
//!
//! Deterministic compilation of resolved configuration into container
//! build and run specifications, plus the thin subprocess glue around the
//! Docker and git binaries.
//!
//! - [`image`]: `EffectiveConfig` pieces → [`image::ImageSpec`].
//! - [`dockerfile`]: [`image::ImageSpec`] → Dockerfile text.
//! - [`runspec`]: `EffectiveConfig` → ordered `docker run` argv.
//! - [`docker`]: container queries, build, exec (the only module that
//!   spawns processes, together with [`git`]).
//! - [`git`]: URL classification and cloning.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod docker;
pub mod dockerfile;
pub mod git;
pub mod image;
pub mod runspec;
