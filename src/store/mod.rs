//! Storage drivers.
//!
//! The [`Store`] trait is the whole persistence surface the repositories
//! compose over: lookups by id, a handful of filtered listings, and writes
//! that keep the reference lists (`User::threads`, `Thread::children`,
//! `Community::members`, ...) consistent with each other.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Community, Thread, User};
use crate::utils::SortOrder;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    /// A write referenced a record that does not exist.
    #[error("{0} does not exist")]
    Missing(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Profile fields written by a user upsert.
#[derive(Debug, Clone)]
pub struct UserUpsert {
    pub auth_id: String,
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct NewThread {
    pub text: String,
    pub author_id: Uuid,
    pub community_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub slug: String,
    pub name: String,
    pub image: String,
    pub bio: String,
    pub created_by: Uuid,
}

/// Filtered, sorted and paginated listing.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Record to leave out of the results (the requesting user).
    pub exclude: Option<Uuid>,
    pub search: String,
    pub sort: SortOrder,
    pub skip: u64,
    pub limit: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---

    /// Insert or update the user identified by `auth_id`, marking it onboarded.
    async fn upsert_user(&self, data: UserUpsert) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>>;
    /// Users for the given ids, in no particular order. Unknown ids are skipped.
    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    /// Matches on username or name. Returns the page and the total match count.
    async fn search_users(&self, query: &SearchQuery) -> StoreResult<(Vec<User>, u64)>;

    // --- Threads ---

    /// Insert a thread and link it to its author, community and parent.
    async fn insert_thread(&self, data: NewThread) -> StoreResult<Thread>;
    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>>;
    /// Threads for the given ids, in no particular order. Unknown ids are skipped.
    async fn get_threads(&self, ids: &[Uuid]) -> StoreResult<Vec<Thread>>;
    /// Top-level threads, newest first.
    async fn list_top_level_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>>;
    async fn count_top_level_threads(&self) -> StoreResult<u64>;
    /// Every thread (top-level or reply) written by the author.
    async fn get_threads_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Thread>>;
    /// Remove the threads and every reference to them. Returns how many were removed.
    async fn delete_threads(&self, ids: &[Uuid]) -> StoreResult<u64>;

    // --- Communities ---

    /// Insert a community with its creator as the first member.
    async fn insert_community(&self, data: NewCommunity) -> StoreResult<Community>;
    async fn get_community(&self, id: Uuid) -> StoreResult<Option<Community>>;
    async fn get_community_by_slug(&self, slug: &str) -> StoreResult<Option<Community>>;
    async fn get_communities(&self, ids: &[Uuid]) -> StoreResult<Vec<Community>>;
    /// Matches on slug or name. Returns the page and the total match count.
    async fn search_communities(&self, query: &SearchQuery) -> StoreResult<(Vec<Community>, u64)>;
    /// Returns false when the user already was a member.
    async fn add_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    /// Returns false when the user was not a member.
    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}
