pub const MAX_THREAD_TEXT_LENGTH: usize = 5000;
pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MAX_NAME_LENGTH: usize = 60;
pub const MAX_BIO_LENGTH: usize = 1000;
pub const MAX_COMMUNITY_NAME_LENGTH: usize = 60;

/// Replies loaded below each thread in a feed page.
pub const FEED_REPLY_DEPTH: usize = 1;
/// Replies loaded below a thread on its own page (children and grandchildren).
pub const THREAD_DETAIL_REPLY_DEPTH: usize = 2;
