//! Resolution of stored references into view models.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{AuthorSummary, CommunitySummary, Thread, ThreadView};
use crate::store::{Store, StoreError, StoreResult};

/// Resolve authors and communities for `roots`, and load their replies
/// `depth` levels down (0 = no replies, 1 = direct replies, ...).
///
/// One store round trip per level for the replies, then authors and
/// communities for the whole tree are fetched together.
pub(crate) async fn populate_threads(
    store: &dyn Store,
    roots: Vec<Thread>,
    depth: usize,
) -> StoreResult<Vec<ThreadView>> {
    let mut known: HashMap<Uuid, Thread> = roots.iter().map(|t| (t.id, t.clone())).collect();

    let mut frontier: Vec<Uuid> = roots.iter().flat_map(|t| t.children.iter().copied()).collect();
    for _ in 0..depth {
        frontier.retain(|id| !known.contains_key(id));
        if frontier.is_empty() {
            break;
        }
        let fetched = store.get_threads(&frontier).await?;
        frontier = fetched
            .iter()
            .flat_map(|t| t.children.iter().copied())
            .collect();
        known.extend(fetched.into_iter().map(|t| (t.id, t)));
    }

    let author_ids: Vec<Uuid> = unique(known.values().map(|t| t.author_id));
    let community_ids: Vec<Uuid> = unique(known.values().filter_map(|t| t.community_id));

    let (authors, communities) = futures::try_join!(
        author_summaries(store, &author_ids),
        community_summaries(store, &community_ids),
    )?;

    let lookup = Lookup {
        threads: &known,
        authors: &authors,
        communities: &communities,
    };
    roots.iter().map(|t| lookup.build(t, depth)).collect()
}

pub(crate) async fn author_summaries(
    store: &dyn Store,
    ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, AuthorSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = store.get_users(ids).await?;
    Ok(users.iter().map(|u| (u.id, AuthorSummary::from(u))).collect())
}

pub(crate) async fn community_summaries(
    store: &dyn Store,
    ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, CommunitySummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let communities = store.get_communities(ids).await?;
    Ok(communities
        .iter()
        .map(|c| (c.id, CommunitySummary::from(c)))
        .collect())
}

/// Summaries in the order of `ids`, skipping unknown ones.
pub(crate) fn ordered<T: Clone>(ids: &[Uuid], map: &HashMap<Uuid, T>) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

struct Lookup<'a> {
    threads: &'a HashMap<Uuid, Thread>,
    authors: &'a HashMap<Uuid, AuthorSummary>,
    communities: &'a HashMap<Uuid, CommunitySummary>,
}

impl Lookup<'_> {
    fn build(&self, thread: &Thread, depth: usize) -> StoreResult<ThreadView> {
        let author = self
            .authors
            .get(&thread.author_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::Missing(format!("author {} of thread {}", thread.author_id, thread.id))
            })?;

        let community = thread
            .community_id
            .and_then(|id| self.communities.get(&id).cloned());

        let children = if depth == 0 {
            Vec::new()
        } else {
            thread
                .children
                .iter()
                .filter_map(|id| self.threads.get(id))
                .map(|child| self.build(child, depth - 1))
                .collect::<StoreResult<Vec<_>>>()?
        };

        Ok(ThreadView {
            id: thread.id,
            text: thread.text.clone(),
            parent_id: thread.parent_id,
            created_at: thread.created_at,
            author,
            community,
            reply_count: thread.children.len(),
            children,
        })
    }
}
