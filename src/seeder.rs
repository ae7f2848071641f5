use tracing::info;
use uuid::Uuid;

use crate::models::{Thread, User};
use crate::repositories::{
    community_repository::{self, CreateCommunityData},
    thread_repository::{self, CreateCommentData, CreateThreadData},
    user_repository::{self, UpdateUserData},
    RepositoryResult, StoreContext,
};
use crate::store::Store;

async fn ensure_user(store: &dyn Store, auth_id: &str, username: &str, name: &str) -> RepositoryResult<User> {
    let user = user_repository::update_user(
        store,
        auth_id,
        UpdateUserData {
            username: username.to_string(),
            name: name.to_string(),
            bio: format!("Hi, I'm {}.", name),
            image: format!("/assets/avatars/{}.png", username),
        },
    )
    .await?;
    info!(username = %user.username, user_id = %user.id, "Ensured user");
    Ok(user)
}

/// The author's thread with this parent and text, created if absent.
async fn ensure_thread(
    store: &dyn Store,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    community_id: Option<Uuid>,
    text: &str,
) -> RepositoryResult<Thread> {
    let existing = store
        .get_threads_by_author(author_id)
        .await
        .context("Error seeding threads")?
        .into_iter()
        .find(|t| t.parent_id == parent_id && t.text == text);
    if let Some(thread) = existing {
        return Ok(thread);
    }

    match parent_id {
        Some(parent_id) => {
            thread_repository::add_comment_to_thread(
                store,
                parent_id,
                author_id,
                CreateCommentData { text: text.to_string() },
            )
            .await
        }
        None => {
            thread_repository::create_thread(
                store,
                author_id,
                CreateThreadData { text: text.to_string(), community_id },
            )
            .await
        }
    }
}

/// Seed the store with demo users, a community and a small thread tree.
///
/// Safe to run more than once: users are upserted, the community is looked
/// up by slug, and each thread is looked up by author, parent and text.
pub async fn seed_database(store: &dyn Store) -> RepositoryResult<()> {
    info!("Seeding users...");
    let ada = ensure_user(store, "seed_ada", "ada", "Ada Lovelace").await?;
    let grace = ensure_user(store, "seed_grace", "grace", "Grace Hopper").await?;
    let alan = ensure_user(store, "seed_alan", "alan", "Alan Turing").await?;

    info!("Seeding communities...");
    let community = match store
        .get_community_by_slug("computing")
        .await
        .context("Error seeding community")?
    {
        Some(existing) => existing,
        None => {
            community_repository::create_community(
                store,
                ada.id,
                CreateCommunityData {
                    slug: "computing".to_string(),
                    name: "Computing".to_string(),
                    image: "/assets/communities/computing.png".to_string(),
                    bio: "Engines, compilers and machines that think.".to_string(),
                },
            )
            .await?
        }
    };
    community_repository::add_member_to_community(store, community.id, grace.id).await?;
    info!(community_id = %community.id, "Ensured 'computing' community");

    info!("Seeding threads...");
    let root = ensure_thread(
        store,
        ada.id,
        None,
        Some(community.id),
        "The engine might compose elaborate pieces of music.",
    )
    .await?;
    let reply = ensure_thread(
        store,
        grace.id,
        Some(root.id),
        None,
        "Only once someone writes the compiler for it.",
    )
    .await?;
    ensure_thread(
        store,
        alan.id,
        Some(reply.id),
        None,
        "Can machines think? Let's play a game.",
    )
    .await?;
    ensure_thread(
        store,
        alan.id,
        None,
        None,
        "We can only see a short distance ahead.",
    )
    .await?;

    info!("Seeding completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let store = MemoryStore::new();
        seed_database(&store).await.unwrap();
        seed_database(&store).await.unwrap();

        assert_eq!(store.count_top_level_threads().await.unwrap(), 2);
        let community = store.get_community_by_slug("computing").await.unwrap().unwrap();
        assert_eq!(community.members.len(), 2);
        assert_eq!(community.threads.len(), 1);
    }

    #[tokio::test]
    async fn reseeding_restores_only_deleted_threads() {
        let store = MemoryStore::new();
        seed_database(&store).await.unwrap();

        let ada = store.get_user_by_auth_id("seed_ada").await.unwrap().unwrap();
        thread_repository::delete_thread(&store, ada.threads[0], ada.id)
            .await
            .unwrap();
        assert_eq!(store.count_top_level_threads().await.unwrap(), 1);

        seed_database(&store).await.unwrap();

        let alan = store.get_user_by_auth_id("seed_alan").await.unwrap().unwrap();
        assert_eq!(alan.threads.len(), 1);
        assert_eq!(store.count_top_level_threads().await.unwrap(), 2);
        let ada = store.get_user_by_auth_id("seed_ada").await.unwrap().unwrap();
        let root = store.get_thread(ada.threads[0]).await.unwrap().unwrap();
        assert_eq!(root.children.len(), 1);
        let reply = store.get_thread(root.children[0]).await.unwrap().unwrap();
        assert_eq!(reply.children.len(), 1);
    }
}
