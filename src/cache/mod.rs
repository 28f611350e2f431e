//! Tiered object cache
//!
//! A read-through cache that fronts a read-only origin with progressively
//! faster managed tiers. The [`Manager`] owns the ordered tier stack and
//! implements promotion, watched-only delete, prefetch, and consistency
//! reconciliation; [`storage::memory::MemoryStore`] is the bounded,
//! frequency-evicted in-memory tier; [`storage::filesystem::FilesystemStore`]
//! is the disk-backed managed tier; [`storage::origin::OriginStore`] is an
//! in-memory mock of the (out of scope) real origin adapter.

pub mod entry;
pub mod manager;
pub mod storage;

pub use entry::Object;
pub use manager::Manager;
pub use storage::Store;
