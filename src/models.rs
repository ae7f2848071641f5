use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. `auth_id` is the id issued by the external identity
/// provider; `id` is ours and is what threads and communities reference.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub auth_id: String,
    pub username: String, // Always lowercase
    pub name: String,
    pub bio: String,
    pub image: String,
    pub onboarded: bool,
    /// Top-level threads authored by this user.
    pub threads: Vec<Uuid>,
    pub communities: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A post or a reply. Replies carry `parent_id`; top-level threads don't.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Thread {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub community_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    /// Direct replies, oldest first.
    pub children: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Community {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub image: String,
    pub bio: String,
    pub created_by: Uuid,
    pub threads: Vec<Uuid>,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Populated views ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub auth_id: String,
    pub username: String,
    pub name: String,
    pub image: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            auth_id: user.auth_id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommunitySummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub image: String,
}

impl From<&Community> for CommunitySummary {
    fn from(community: &Community) -> Self {
        Self {
            id: community.id,
            slug: community.slug.clone(),
            name: community.name.clone(),
            image: community.image.clone(),
        }
    }
}

/// A thread with its references resolved, as rendered by a thread card.
///
/// `children` is only filled down to the depth the fetching operation asks
/// for; `reply_count` is always the number of direct replies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub id: Uuid,
    pub text: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub community: Option<CommunitySummary>,
    pub reply_count: usize,
    #[serde(default)]
    pub children: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub community_summaries: Vec<CommunitySummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserThreads {
    pub user: AuthorSummary,
    pub threads: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommunityDetails {
    #[serde(flatten)]
    pub community: Community,
    pub creator: AuthorSummary,
    pub member_summaries: Vec<AuthorSummary>,
}

/// One page of results plus whether another page follows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub is_next: bool,
}

/// Represents server information.
#[derive(Serialize, Deserialize, Debug)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}
