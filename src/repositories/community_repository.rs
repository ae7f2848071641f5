use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::populate::{author_summaries, ordered, populate_threads};
use super::{validate_text, RepositoryError, RepositoryResult, StoreContext};
use crate::constants::{FEED_REPLY_DEPTH, MAX_BIO_LENGTH, MAX_COMMUNITY_NAME_LENGTH, MAX_USERNAME_LENGTH};
use crate::models::{Community, CommunityDetails, Page, ThreadView};
use crate::store::{NewCommunity, SearchQuery, Store};
use crate::utils::SearchParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityData {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub bio: String,
}

/// Inserts a community; the creator becomes its first member.
pub async fn create_community(
    store: &dyn Store,
    created_by: Uuid,
    community_data: CreateCommunityData,
) -> RepositoryResult<Community> {
    let slug = validate_text("Slug", &community_data.slug, MAX_USERNAME_LENGTH)?.to_lowercase();
    if slug.chars().any(char::is_whitespace) {
        return Err(RepositoryError::Validation(
            "Slug cannot contain whitespace".to_string(),
        ));
    }
    let name = validate_text("Name", &community_data.name, MAX_COMMUNITY_NAME_LENGTH)?;
    if community_data.bio.chars().count() > MAX_BIO_LENGTH {
        return Err(RepositoryError::Validation(format!(
            "Bio exceeds maximum length of {} characters",
            MAX_BIO_LENGTH
        )));
    }

    let community = store
        .insert_community(NewCommunity {
            slug,
            name,
            image: community_data.image.trim().to_string(),
            bio: community_data.bio.trim().to_string(),
            created_by,
        })
        .await
        .context("Error creating community")?;

    info!(community_id = %community.id, slug = %community.slug, created_by = %created_by, "Created community");
    Ok(community)
}

/// The community with its creator and members resolved.
pub async fn fetch_community_details(
    store: &dyn Store,
    community_id: Uuid,
) -> RepositoryResult<CommunityDetails> {
    const CONTEXT: &str = "Error fetching community details";
    let community = store
        .get_community(community_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Community"))?;

    let mut ids = community.members.clone();
    if !ids.contains(&community.created_by) {
        ids.push(community.created_by);
    }
    let authors = author_summaries(store, &ids).await.context(CONTEXT)?;

    let creator = authors
        .get(&community.created_by)
        .cloned()
        .ok_or(RepositoryError::NotFound("Community creator"))?;

    Ok(CommunityDetails {
        member_summaries: ordered(&community.members, &authors),
        creator,
        community,
    })
}

/// Searches communities by slug or name.
pub async fn fetch_communities(
    store: &dyn Store,
    params: &SearchParams,
) -> RepositoryResult<Page<Community>> {
    let page = params.page();
    let query = SearchQuery {
        exclude: None,
        search: params.search.clone(),
        sort: params.sort,
        skip: page.skip(),
        limit: page.page_size(),
    };

    let (communities, total) = store
        .search_communities(&query)
        .await
        .context("Error fetching communities")?;

    Ok(Page {
        is_next: page.is_next(total, communities.len()),
        items: communities,
    })
}

/// Threads posted in a community, newest first, each with its direct replies.
pub async fn fetch_community_threads(
    store: &dyn Store,
    community_id: Uuid,
) -> RepositoryResult<Vec<ThreadView>> {
    const CONTEXT: &str = "Error fetching community threads";
    let community = store
        .get_community(community_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Community"))?;

    let mut threads = store.get_threads(&community.threads).await.context(CONTEXT)?;
    threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    populate_threads(store, threads, FEED_REPLY_DEPTH)
        .await
        .context(CONTEXT)
}

/// Adds the user to the community. Joining twice is a no-op.
pub async fn add_member_to_community(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
) -> RepositoryResult<Community> {
    const CONTEXT: &str = "Error adding member to community";
    if store.get_community(community_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("Community"));
    }
    if store.get_user(user_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("User"));
    }

    if store.add_member(community_id, user_id).await.context(CONTEXT)? {
        info!(community_id = %community_id, user_id = %user_id, "Added community member");
    }

    store
        .get_community(community_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Community"))
}

/// Removes the user from the community.
pub async fn remove_user_from_community(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
) -> RepositoryResult<Community> {
    const CONTEXT: &str = "Error removing user from community";
    if store.get_community(community_id).await.context(CONTEXT)?.is_none() {
        return Err(RepositoryError::NotFound("Community"));
    }

    if !store.remove_member(community_id, user_id).await.context(CONTEXT)? {
        return Err(RepositoryError::NotFound("Community member"));
    }
    info!(community_id = %community_id, user_id = %user_id, "Removed community member");

    store
        .get_community(community_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("Community"))
}
