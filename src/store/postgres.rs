use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{NewCommunity, NewThread, SearchQuery, Store, StoreError, StoreResult, UserUpsert};
use crate::models::{Community, Thread, User};

// Reference lists are derived from the foreign keys rather than stored, so
// every SELECT rebuilds them with ARRAY subqueries.

const USER_SELECT: &str = r#"
    SELECT u.id, u.auth_id, u.username, u.name, u.bio, u.image, u.onboarded, u.created_at,
        ARRAY(
            SELECT t.id FROM threads t
            WHERE t.author_id = u.id AND t.parent_id IS NULL
            ORDER BY t.created_at, t.id
        ) AS threads,
        ARRAY(
            SELECT m.community_id FROM community_members m
            WHERE m.user_id = u.id
            ORDER BY m.joined_at
        ) AS communities
    FROM users u
"#;

const THREAD_SELECT: &str = r#"
    SELECT t.id, t.text, t.author_id, t.community_id, t.parent_id, t.created_at,
        ARRAY(
            SELECT c.id FROM threads c
            WHERE c.parent_id = t.id
            ORDER BY c.created_at, c.id
        ) AS children
    FROM threads t
"#;

const COMMUNITY_SELECT: &str = r#"
    SELECT c.id, c.slug, c.name, c.image, c.bio, c.created_by, c.created_at,
        ARRAY(
            SELECT t.id FROM threads t
            WHERE t.community_id = c.id AND t.parent_id IS NULL
            ORDER BY t.created_at, t.id
        ) AS threads,
        ARRAY(
            SELECT m.user_id FROM community_members m
            WHERE m.community_id = c.id
            ORDER BY m.joined_at
        ) AS members
    FROM communities c
"#;

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Database connection pool established");
        Ok(Self::new(pool))
    }

    /// Apply the schema in `migrations/`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// Turn unique violations into [`StoreError::Conflict`].
fn conflict_or(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(message());
        }
        if db.is_foreign_key_violation() {
            return StoreError::Missing(db.constraint().unwrap_or("referenced record").to_string());
        }
    }
    StoreError::Database(e)
}

/// LIMIT/OFFSET binds are BIGINT; values past `i64::MAX` clamp to it.
fn bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Escape LIKE wildcards and wrap for a substring match.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, data: UserUpsert) -> StoreResult<User> {
        let username = data.username.clone();
        sqlx::query(
            r#"
            INSERT INTO users (id, auth_id, username, name, bio, image, onboarded)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (auth_id) DO UPDATE SET
                username = EXCLUDED.username,
                name = EXCLUDED.name,
                bio = EXCLUDED.bio,
                image = EXCLUDED.image,
                onboarded = TRUE
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.auth_id)
        .bind(&data.username)
        .bind(&data.name)
        .bind(&data.bio)
        .bind(&data.image)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("username '{}' is already taken", username)))?;

        self.get_user_by_auth_id(&data.auth_id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("user {}", data.auth_id)))
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.auth_id = $1", USER_SELECT))
            .bind(auth_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = ANY($1)", USER_SELECT))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn search_users(&self, query: &SearchQuery) -> StoreResult<(Vec<User>, u64)> {
        let filter = r#"
            WHERE ($1::uuid IS NULL OR u.id <> $1)
              AND ($2 = '' OR u.username ILIKE $3 OR u.name ILIKE $3)
        "#;
        let search = query.search.trim();
        let pattern = like_pattern(search);

        let users = sqlx::query_as::<_, User>(&format!(
            "{} {} ORDER BY u.created_at {} LIMIT $4 OFFSET $5",
            USER_SELECT,
            filter,
            query.sort.as_sql()
        ))
        .bind(query.exclude)
        .bind(search)
        .bind(&pattern)
        .bind(bigint(query.limit))
        .bind(bigint(query.skip))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users u {}", filter))
            .bind(query.exclude)
            .bind(search)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total as u64))
    }

    async fn insert_thread(&self, data: NewThread) -> StoreResult<Thread> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO threads (id, text, author_id, community_id, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&data.text)
        .bind(data.author_id)
        .bind(data.community_id)
        .bind(data.parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("thread {} already exists", id)))?;

        self.get_thread(id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("thread {}", id)))
    }

    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>> {
        let thread = sqlx::query_as::<_, Thread>(&format!("{} WHERE t.id = $1", THREAD_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(thread)
    }

    async fn get_threads(&self, ids: &[Uuid]) -> StoreResult<Vec<Thread>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let threads = sqlx::query_as::<_, Thread>(&format!("{} WHERE t.id = ANY($1)", THREAD_SELECT))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(threads)
    }

    async fn list_top_level_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>> {
        let threads = sqlx::query_as::<_, Thread>(&format!(
            "{} WHERE t.parent_id IS NULL ORDER BY t.created_at DESC, t.id DESC LIMIT $1 OFFSET $2",
            THREAD_SELECT
        ))
        .bind(bigint(limit))
        .bind(bigint(skip))
        .fetch_all(&self.pool)
        .await?;
        Ok(threads)
    }

    async fn count_top_level_threads(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE parent_id IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn get_threads_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Thread>> {
        let threads = sqlx::query_as::<_, Thread>(&format!(
            "{} WHERE t.author_id = $1 ORDER BY t.created_at",
            THREAD_SELECT
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(threads)
    }

    async fn delete_threads(&self, ids: &[Uuid]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        // parent_id cascades, so descendants not listed here go too.
        let result = sqlx::query("DELETE FROM threads WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_community(&self, data: NewCommunity) -> StoreResult<Community> {
        let id = Uuid::new_v4();
        let slug = data.slug.clone();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO communities (id, slug, name, image, bio, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&data.slug)
        .bind(&data.name)
        .bind(&data.image)
        .bind(&data.bio)
        .bind(data.created_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, || format!("community '{}' already exists", slug)))?;

        sqlx::query("INSERT INTO community_members (community_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(data.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_community(id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("community {}", id)))
    }

    async fn get_community(&self, id: Uuid) -> StoreResult<Option<Community>> {
        let community =
            sqlx::query_as::<_, Community>(&format!("{} WHERE c.id = $1", COMMUNITY_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(community)
    }

    async fn get_community_by_slug(&self, slug: &str) -> StoreResult<Option<Community>> {
        let community =
            sqlx::query_as::<_, Community>(&format!("{} WHERE c.slug = $1", COMMUNITY_SELECT))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(community)
    }

    async fn get_communities(&self, ids: &[Uuid]) -> StoreResult<Vec<Community>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let communities =
            sqlx::query_as::<_, Community>(&format!("{} WHERE c.id = ANY($1)", COMMUNITY_SELECT))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(communities)
    }

    async fn search_communities(&self, query: &SearchQuery) -> StoreResult<(Vec<Community>, u64)> {
        let filter = r#"
            WHERE ($1::uuid IS NULL OR c.id <> $1)
              AND ($2 = '' OR c.slug ILIKE $3 OR c.name ILIKE $3)
        "#;
        let search = query.search.trim();
        let pattern = like_pattern(search);

        let communities = sqlx::query_as::<_, Community>(&format!(
            "{} {} ORDER BY c.created_at {} LIMIT $4 OFFSET $5",
            COMMUNITY_SELECT,
            filter,
            query.sort.as_sql()
        ))
        .bind(query.exclude)
        .bind(search)
        .bind(&pattern)
        .bind(bigint(query.limit))
        .bind(bigint(query.skip))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM communities c {}", filter))
                .bind(query.exclude)
                .bind(search)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        Ok((communities, total as u64))
    }

    async fn add_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO community_members (community_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (community_id, user_id) DO NOTHING
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("user {} is already a member", user_id)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM community_members WHERE community_id = $1 AND user_id = $2")
                .bind(community_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
