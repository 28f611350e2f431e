//! layercache
//!
//! A tiered, read-through object cache. A read-only origin sits behind zero
//! or more managed tiers (filesystem, in-memory); reads probe tiers
//! top-down and promote hits into faster tiers in the background. An
//! optional watcher reconciles managed tiers against the origin on a
//! timer.
//!
//! # Modules
//!
//! - [`cache`]: tier storage contract, the in-memory/filesystem/origin
//!   tiers, and the [`cache::Manager`] that ties them together.
//! - [`config`]: CLI/environment configuration.
//! - [`error`]: crate-wide error type.
//! - [`http`]: the HTTP frontend.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{Manager, Object, Store};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
