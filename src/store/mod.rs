mod memory;
mod migrations;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Session;

/// Persistence backend for session records.
///
/// Upserts overwrite by session id; deleting an absent id is a successful
/// no-op. Both operations are idempotent, which is what lets the engine
/// recompute and re-store the same sessions every tick.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn upsert(&self, session: &Session) -> Result<()>;
    async fn delete(&self, session_id: &str) -> Result<()>;
}
