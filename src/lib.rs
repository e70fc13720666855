//! # adsync - Addon Working Copy Manager
//!
//! `adsync` is a build-time provisioning tool: given a declarative
//! description of a target application (a source distribution plus a
//! list of auxiliary addon modules), it brings every required source
//! tree to a prescribed revision, under Git, Mercurial, Bazaar,
//! Subversion or a plain local path.
//!
//! The core is the multi-backend convergence layer: one [`Repo`]
//! contract per working copy, implemented by a driver per backend,
//! each shelling out to its VCS tool through a scoped command runner.
//! Convergence is idempotent, never mutates the process-wide working
//! directory, and respects offline mode uniformly across backends.
//!
//! ## Quick Start
//!
//! 1. Create a manifest file (`adsync.yml`):
//!
//! ```yaml
//! application:
//!   vcs: git
//!   url: https://example.com/platform.git
//!   dest: parts/platform
//!   revision: "v2.1"
//! addons:
//!   - "git https://example.com/a.git addons/a v1"
//!   - "hg https://example.com/b addons/b default subdir=modules"
//!   - "local custom/addons"
//! ```
//!
//! 2. Converge everything:
//!
//! ```bash
//! adsync sync
//! ```
//!
//! 3. Inspect and pin:
//!
//! ```bash
//! adsync status
//! adsync freeze
//! ```
//!
//! ## Architecture
//!
//! The crate is organized using clean architecture principles:
//!
//! - [`domain`]: addon specification lines, the provisioning manifest
//!   and the VCS type tag
//! - [`application`]: the addons resolver and the sync/status/freeze
//!   use cases
//! - [`infrastructure`]: the command runner and the per-backend VCS
//!   drivers
//! - [`presentation`]: CLI interface
//! - [`common`]: shared error handling
//!
//! [`Repo`]: infrastructure::vcs::Repo

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::AdsyncError;
pub use crate::common::result::AdsyncResult as Result;
