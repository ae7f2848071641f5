use std::collections::HashSet;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::populate::populate_threads;
use super::{validate_text, RepositoryError, RepositoryResult, StoreContext};
use crate::constants::{FEED_REPLY_DEPTH, MAX_THREAD_TEXT_LENGTH, THREAD_DETAIL_REPLY_DEPTH};
use crate::models::{Page, Thread, ThreadView};
use crate::store::{NewThread, Store};
use crate::utils::PageParams;

// Input data for creating a new top-level thread
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateThreadData {
    pub text: String,
    #[serde(default)]
    pub community_id: Option<Uuid>,
}

// Input data for replying to a thread (parent comes from the path)
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentData {
    pub text: String,
}

/// Inserts a new top-level thread and links it to its author and community.
pub async fn create_thread(
    store: &dyn Store,
    author_id: Uuid,
    thread_data: CreateThreadData,
) -> RepositoryResult<Thread> {
    const CONTEXT: &str = "Error creating thread";
    let text = validate_text("Thread text", &thread_data.text, MAX_THREAD_TEXT_LENGTH)?;

    if store.get_user(author_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("User"));
    }
    if let Some(community_id) = thread_data.community_id {
        if store.get_community(community_id).await.context(CONTEXT)?.is_none() {
            return Err(RepositoryError::NotFound("Community"));
        }
    }

    let thread = store
        .insert_thread(NewThread {
            text,
            author_id,
            community_id: thread_data.community_id,
            parent_id: None,
        })
        .await
        .context(CONTEXT)?;

    debug!(thread_id = %thread.id, author_id = %author_id, community_id = ?thread.community_id, "Inserted thread");
    Ok(thread)
}

/// Top-level threads, newest first, each with its direct replies.
pub async fn fetch_threads(
    store: &dyn Store,
    pagination: &PageParams,
) -> RepositoryResult<Page<ThreadView>> {
    const CONTEXT: &str = "Error fetching threads";
    let skip = pagination.skip();

    let (threads, total) = futures::try_join!(
        store.list_top_level_threads(skip, pagination.page_size()),
        store.count_top_level_threads(),
    )
    .context(CONTEXT)?;

    let returned = threads.len();
    let items = populate_threads(store, threads, FEED_REPLY_DEPTH)
        .await
        .context(CONTEXT)?;

    Ok(Page {
        items,
        is_next: pagination.is_next(total, returned),
    })
}

/// A single thread with replies two levels deep.
pub async fn fetch_thread_by_id(store: &dyn Store, thread_id: Uuid) -> RepositoryResult<ThreadView> {
    const CONTEXT: &str = "Error fetching thread";
    let thread = store
        .get_thread(thread_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Thread"))?;

    populate_threads(store, vec![thread], THREAD_DETAIL_REPLY_DEPTH)
        .await
        .context(CONTEXT)?
        .pop()
        .ok_or(RepositoryError::NotFound("Thread"))
}

/// Inserts a reply and appends it to the parent's children.
pub async fn add_comment_to_thread(
    store: &dyn Store,
    parent_id: Uuid,
    author_id: Uuid,
    comment_data: CreateCommentData,
) -> RepositoryResult<Thread> {
    const CONTEXT: &str = "Error adding comment to thread";
    let text = validate_text("Comment text", &comment_data.text, MAX_THREAD_TEXT_LENGTH)?;

    if store.get_thread(parent_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("Thread"));
    }
    if store.get_user(author_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("User"));
    }

    let comment = store
        .insert_thread(NewThread {
            text,
            author_id,
            community_id: None,
            parent_id: Some(parent_id),
        })
        .await
        .context(CONTEXT)?;

    debug!(comment_id = %comment.id, parent_id = %parent_id, author_id = %author_id, "Inserted comment");
    Ok(comment)
}

/// Every descendant of a thread, level by level.
///
/// The replies of all threads on one level are fetched concurrently. Threads
/// already seen are skipped, so a corrupt parent/child cycle ends the walk.
pub async fn fetch_all_child_threads(
    store: &dyn Store,
    thread_id: Uuid,
) -> RepositoryResult<Vec<Thread>> {
    const CONTEXT: &str = "Error fetching child threads";
    let root = store
        .get_thread(thread_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Thread"))?;

    let mut visited: HashSet<Uuid> = HashSet::from([root.id]);
    let mut descendants = Vec::new();
    let mut level = vec![root];

    while !level.is_empty() {
        let batches = try_join_all(level.iter().map(|thread| {
            let ids: Vec<Uuid> = thread
                .children
                .iter()
                .filter(|id| !visited.contains(*id))
                .copied()
                .collect();
            async move { store.get_threads(&ids).await }
        }))
        .await
        .context(CONTEXT)?;

        let mut next = Vec::new();
        for thread in batches.into_iter().flatten() {
            if visited.insert(thread.id) {
                next.push(thread.clone());
                descendants.push(thread);
            }
        }
        level = next;
    }

    Ok(descendants)
}

/// Deletes a thread and its whole reply tree. Only the author may do this.
/// Returns the number of threads removed.
pub async fn delete_thread(
    store: &dyn Store,
    thread_id: Uuid,
    requester_id: Uuid,
) -> RepositoryResult<u64> {
    const CONTEXT: &str = "Error deleting thread";
    let thread = store
        .get_thread(thread_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Thread"))?;

    if thread.author_id != requester_id {
        return Err(RepositoryError::Forbidden(
            "You can only delete your own threads.".to_string(),
        ));
    }

    let mut ids = vec![thread.id];
    ids.extend(
        fetch_all_child_threads(store, thread_id)
            .await?
            .into_iter()
            .map(|t| t.id),
    );

    let removed = store.delete_threads(&ids).await.context(CONTEXT)?;
    info!(thread_id = %thread_id, removed, "Deleted thread with replies");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::store::{MemoryStore, UserUpsert};
    use chrono::Utc;

    async fn user(store: &MemoryStore, auth_id: &str) -> User {
        store
            .upsert_user(UserUpsert {
                auth_id: auth_id.to_string(),
                username: auth_id.to_string(),
                name: auth_id.to_string(),
                bio: String::new(),
                image: String::new(),
            })
            .await
            .unwrap()
    }

    async fn reply(store: &MemoryStore, parent: Uuid, author: Uuid, text: &str) -> Thread {
        add_comment_to_thread(store, parent, author, CreateCommentData { text: text.into() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn descendants_cover_every_level() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let root = create_thread(
            &store,
            alice.id,
            CreateThreadData { text: "root".into(), community_id: None },
        )
        .await
        .unwrap();
        let a = reply(&store, root.id, alice.id, "a").await;
        let b = reply(&store, root.id, alice.id, "b").await;
        let a1 = reply(&store, a.id, alice.id, "a1").await;
        let a1x = reply(&store, a1.id, alice.id, "a1x").await;

        let found: HashSet<Uuid> = fetch_all_child_threads(&store, root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(found, HashSet::from([a.id, b.id, a1.id, a1x.id]));

        let leaf = fetch_all_child_threads(&store, a1x.id).await.unwrap();
        assert!(leaf.is_empty());
    }

    #[tokio::test]
    async fn descendants_terminate_on_cycle() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let root = create_thread(
            &store,
            alice.id,
            CreateThreadData { text: "root".into(), community_id: None },
        )
        .await
        .unwrap();

        // child lists root as its own child
        let child_id = Uuid::new_v4();
        store
            .put_raw_thread(Thread {
                id: child_id,
                text: "loop".into(),
                author_id: alice.id,
                community_id: None,
                parent_id: Some(root.id),
                children: vec![root.id, child_id],
                created_at: Utc::now(),
            })
            .await;
        let mut corrupted = root.clone();
        corrupted.children = vec![child_id];
        store.put_raw_thread(corrupted).await;

        let found = fetch_all_child_threads(&store, root.id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, child_id);
    }

    #[tokio::test]
    async fn delete_requires_author_and_removes_subtree() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let root = create_thread(
            &store,
            alice.id,
            CreateThreadData { text: "root".into(), community_id: None },
        )
        .await
        .unwrap();
        let r1 = reply(&store, root.id, bob.id, "r1").await;
        reply(&store, r1.id, alice.id, "r2").await;

        let err = delete_thread(&store, root.id, bob.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Forbidden(_)));

        assert_eq!(delete_thread(&store, root.id, alice.id).await.unwrap(), 3);
        assert!(store.get_threads_by_author(alice.id).await.unwrap().is_empty());
        assert!(store.get_threads_by_author(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_thread_rejects_unknown_community() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let err = create_thread(
            &store,
            alice.id,
            CreateThreadData { text: "hello".into(), community_id: Some(Uuid::new_v4()) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound("Community")));
    }
}
