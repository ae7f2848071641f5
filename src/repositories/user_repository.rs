use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::populate::{community_summaries, ordered, populate_threads};
use super::{validate_text, RepositoryError, RepositoryResult, StoreContext};
use crate::constants::{FEED_REPLY_DEPTH, MAX_BIO_LENGTH, MAX_NAME_LENGTH, MAX_USERNAME_LENGTH};
use crate::models::{AuthorSummary, Page, ThreadView, User, UserProfile, UserThreads};
use crate::store::{SearchQuery, Store, UserUpsert};
use crate::utils::SearchParams;

// Profile fields sent from the onboarding / edit-profile form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserData {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image: String,
}

fn normalize_username(username: &str) -> RepositoryResult<String> {
    let username = validate_text("Username", username, MAX_USERNAME_LENGTH)?.to_lowercase();
    if username.chars().any(char::is_whitespace) {
        return Err(RepositoryError::Validation(
            "Username cannot contain whitespace".to_string(),
        ));
    }
    Ok(username)
}

/// Creates or updates the user with this external id and marks it onboarded.
/// Usernames are stored lowercase.
pub async fn update_user(
    store: &dyn Store,
    auth_id: &str,
    user_data: UpdateUserData,
) -> RepositoryResult<User> {
    let username = normalize_username(&user_data.username)?;
    let name = validate_text("Name", &user_data.name, MAX_NAME_LENGTH)?;
    let bio = user_data.bio.trim().to_string();
    if bio.chars().count() > MAX_BIO_LENGTH {
        return Err(RepositoryError::Validation(format!(
            "Bio exceeds maximum length of {} characters",
            MAX_BIO_LENGTH
        )));
    }

    let user = store
        .upsert_user(UserUpsert {
            auth_id: auth_id.to_string(),
            username,
            name,
            bio,
            image: user_data.image.trim().to_string(),
        })
        .await
        .context("Failed to create/update user")?;

    info!(user_id = %user.id, username = %user.username, "Upserted user");
    Ok(user)
}

/// Looks a user up by external id, with its communities resolved.
pub async fn fetch_user(store: &dyn Store, auth_id: &str) -> RepositoryResult<UserProfile> {
    const CONTEXT: &str = "Failed to fetch user";
    let user = store
        .get_user_by_auth_id(auth_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("User"))?;

    let communities = community_summaries(store, &user.communities)
        .await
        .context(CONTEXT)?;

    Ok(UserProfile {
        community_summaries: ordered(&user.communities, &communities),
        user,
    })
}

/// The user's top-level threads, newest first, each with its direct replies.
pub async fn fetch_user_threads(store: &dyn Store, auth_id: &str) -> RepositoryResult<UserThreads> {
    const CONTEXT: &str = "Failed to fetch user threads";
    let user = store
        .get_user_by_auth_id(auth_id)
        .await
        .context(CONTEXT)?
        .ok_or(RepositoryError::NotFound("User"))?;

    let mut threads = store.get_threads(&user.threads).await.context(CONTEXT)?;
    threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let threads = populate_threads(store, threads, FEED_REPLY_DEPTH)
        .await
        .context(CONTEXT)?;

    Ok(UserThreads {
        user: AuthorSummary::from(&user),
        threads,
    })
}

/// Searches users by username or name, leaving out the requesting user.
pub async fn fetch_users(
    store: &dyn Store,
    current_user_id: Uuid,
    params: &SearchParams,
) -> RepositoryResult<Page<AuthorSummary>> {
    let page = params.page();
    let query = SearchQuery {
        exclude: Some(current_user_id),
        search: params.search.clone(),
        sort: params.sort,
        skip: page.skip(),
        limit: page.page_size(),
    };

    let (users, total) = store
        .search_users(&query)
        .await
        .context("Failed to fetch users")?;

    Ok(Page {
        is_next: page.is_next(total, users.len()),
        items: users.iter().map(AuthorSummary::from).collect(),
    })
}

/// Replies other users left on any of this user's threads, newest first.
pub async fn get_activity(store: &dyn Store, user_id: Uuid) -> RepositoryResult<Vec<ThreadView>> {
    const CONTEXT: &str = "Failed to fetch activity";
    let authored = store
        .get_threads_by_author(user_id)
        .await
        .context(CONTEXT)?;

    let reply_ids: Vec<Uuid> = authored
        .iter()
        .flat_map(|t| t.children.iter().copied())
        .collect();

    let mut replies: Vec<_> = store
        .get_threads(&reply_ids)
        .await
        .context(CONTEXT)?
        .into_iter()
        .filter(|t| t.author_id != user_id)
        .collect();
    replies.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    populate_threads(store, replies, 0).await.context(CONTEXT)
}
