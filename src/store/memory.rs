use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewCommunity, NewThread, SearchQuery, Store, StoreError, StoreResult, UserUpsert};
use crate::models::{Community, Thread, User};
use crate::utils::{matches_search, SortOrder};

/// In-process store used by the test suite and for local runs without Postgres.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    threads: HashMap<Uuid, Thread>,
    communities: HashMap<Uuid, Community>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    // Strictly increasing so that newest-first ordering is total.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a thread verbatim, bypassing all linking. Lets tests build
    /// corrupt trees that the public API cannot produce.
    #[cfg(test)]
    pub(crate) async fn put_raw_thread(&self, thread: Thread) {
        self.inner.write().await.threads.insert(thread.id, thread);
    }
}

fn paginate<T>(mut items: Vec<T>, query: &SearchQuery) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page = items
        .drain(..)
        .skip(query.skip as usize)
        .take(query.limit as usize)
        .collect();
    (page, total)
}

fn sort_by_created<T>(items: &mut [T], order: SortOrder, created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| created_at(item));
    if order == SortOrder::Desc {
        items.reverse();
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, data: UserUpsert) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .users
            .values()
            .any(|u| u.username == data.username && u.auth_id != data.auth_id);
        if taken {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                data.username
            )));
        }

        let existing = inner
            .users
            .values()
            .find(|u| u.auth_id == data.auth_id)
            .map(|u| u.id);

        let user = match existing {
            Some(id) => {
                let user = inner
                    .users
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::Missing(format!("user {}", id)))?;
                user.username = data.username;
                user.name = data.name;
                user.bio = data.bio;
                user.image = data.image;
                user.onboarded = true;
                user.clone()
            }
            None => {
                let created_at = inner.next_timestamp();
                let user = User {
                    id: Uuid::new_v4(),
                    auth_id: data.auth_id,
                    username: data.username,
                    name: data.name,
                    bio: data.bio,
                    image: data.image,
                    onboarded: true,
                    threads: Vec::new(),
                    communities: Vec::new(),
                    created_at,
                };
                inner.users.insert(user.id, user.clone());
                user
            }
        };
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.auth_id == auth_id).cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn search_users(&self, query: &SearchQuery) -> StoreResult<(Vec<User>, u64)> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| Some(u.id) != query.exclude)
            .filter(|u| matches_search(&query.search, &[&u.username, &u.name]))
            .cloned()
            .collect();
        sort_by_created(&mut users, query.sort, |u| u.created_at);
        Ok(paginate(users, query))
    }

    async fn insert_thread(&self, data: NewThread) -> StoreResult<Thread> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&data.author_id) {
            return Err(StoreError::Missing(format!("user {}", data.author_id)));
        }
        if let Some(parent_id) = data.parent_id {
            if !inner.threads.contains_key(&parent_id) {
                return Err(StoreError::Missing(format!("thread {}", parent_id)));
            }
        }
        if let Some(community_id) = data.community_id {
            if !inner.communities.contains_key(&community_id) {
                return Err(StoreError::Missing(format!("community {}", community_id)));
            }
        }

        let created_at = inner.next_timestamp();
        let thread = Thread {
            id: Uuid::new_v4(),
            text: data.text,
            author_id: data.author_id,
            community_id: data.community_id,
            parent_id: data.parent_id,
            children: Vec::new(),
            created_at,
        };

        match thread.parent_id {
            Some(parent_id) => {
                if let Some(parent) = inner.threads.get_mut(&parent_id) {
                    parent.children.push(thread.id);
                }
            }
            None => {
                if let Some(author) = inner.users.get_mut(&thread.author_id) {
                    author.threads.push(thread.id);
                }
                if let Some(community_id) = thread.community_id {
                    if let Some(community) = inner.communities.get_mut(&community_id) {
                        community.threads.push(thread.id);
                    }
                }
            }
        }

        inner.threads.insert(thread.id, thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>> {
        Ok(self.inner.read().await.threads.get(&id).cloned())
    }

    async fn get_threads(&self, ids: &[Uuid]) -> StoreResult<Vec<Thread>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.threads.get(id).cloned()).collect())
    }

    async fn list_top_level_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>> {
        let inner = self.inner.read().await;
        let mut threads: Vec<Thread> = inner
            .threads
            .values()
            .filter(|t| t.is_top_level())
            .cloned()
            .collect();
        sort_by_created(&mut threads, SortOrder::Desc, |t| t.created_at);
        Ok(threads
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_top_level_threads(&self) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.threads.values().filter(|t| t.is_top_level()).count() as u64)
    }

    async fn get_threads_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Thread>> {
        let inner = self.inner.read().await;
        Ok(inner
            .threads
            .values()
            .filter(|t| t.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn delete_threads(&self, ids: &[Uuid]) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let doomed: HashSet<Uuid> = ids.iter().copied().collect();

        let mut removed = 0;
        for id in &doomed {
            if inner.threads.remove(id).is_some() {
                removed += 1;
            }
        }

        for user in inner.users.values_mut() {
            user.threads.retain(|id| !doomed.contains(id));
        }
        for community in inner.communities.values_mut() {
            community.threads.retain(|id| !doomed.contains(id));
        }
        for thread in inner.threads.values_mut() {
            thread.children.retain(|id| !doomed.contains(id));
        }

        Ok(removed)
    }

    async fn insert_community(&self, data: NewCommunity) -> StoreResult<Community> {
        let mut inner = self.inner.write().await;

        if inner.communities.values().any(|c| c.slug == data.slug) {
            return Err(StoreError::Conflict(format!(
                "community '{}' already exists",
                data.slug
            )));
        }
        if !inner.users.contains_key(&data.created_by) {
            return Err(StoreError::Missing(format!("user {}", data.created_by)));
        }

        let created_at = inner.next_timestamp();
        let community = Community {
            id: Uuid::new_v4(),
            slug: data.slug,
            name: data.name,
            image: data.image,
            bio: data.bio,
            created_by: data.created_by,
            threads: Vec::new(),
            members: vec![data.created_by],
            created_at,
        };

        if let Some(creator) = inner.users.get_mut(&data.created_by) {
            creator.communities.push(community.id);
        }
        inner.communities.insert(community.id, community.clone());
        Ok(community)
    }

    async fn get_community(&self, id: Uuid) -> StoreResult<Option<Community>> {
        Ok(self.inner.read().await.communities.get(&id).cloned())
    }

    async fn get_community_by_slug(&self, slug: &str) -> StoreResult<Option<Community>> {
        let inner = self.inner.read().await;
        Ok(inner.communities.values().find(|c| c.slug == slug).cloned())
    }

    async fn get_communities(&self, ids: &[Uuid]) -> StoreResult<Vec<Community>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.communities.get(id).cloned())
            .collect())
    }

    async fn search_communities(&self, query: &SearchQuery) -> StoreResult<(Vec<Community>, u64)> {
        let inner = self.inner.read().await;
        let mut communities: Vec<Community> = inner
            .communities
            .values()
            .filter(|c| Some(c.id) != query.exclude)
            .filter(|c| matches_search(&query.search, &[&c.slug, &c.name]))
            .cloned()
            .collect();
        sort_by_created(&mut communities, query.sort, |c| c.created_at);
        Ok(paginate(communities, query))
    }

    async fn add_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::Missing(format!("user {}", user_id)));
        }
        let community = inner
            .communities
            .get_mut(&community_id)
            .ok_or_else(|| StoreError::Missing(format!("community {}", community_id)))?;
        if community.members.contains(&user_id) {
            return Ok(false);
        }
        community.members.push(user_id);
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.communities.push(community_id);
        }
        Ok(true)
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let community = inner
            .communities
            .get_mut(&community_id)
            .ok_or_else(|| StoreError::Missing(format!("community {}", community_id)))?;
        let before = community.members.len();
        community.members.retain(|id| *id != user_id);
        if community.members.len() == before {
            return Ok(false);
        }
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.communities.retain(|id| *id != community_id);
        }
        Ok(true)
    }
}
