//! # farmpass-store
//!
//! Local persistence for FarmPass, backed by SQLite.
//!
//! The only durable client state is one authentication session per role
//! domain. [`SessionStore`] is the persistence port the portals are driven
//! through; [`Database`] implements it on disk and [`MemorySessionStore`]
//! in memory.

pub mod database;
pub mod memory;
mod migrations;
pub mod sessions;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use memory::MemorySessionStore;
pub use sessions::SessionStore;
