use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a repository's `owner/name`. Fixed width,
/// collision-resistant, and safe to drop into a whitespace-delimited file.
pub fn repo_key(name_with_owner: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name_with_owner.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One line of the cache store: the per-repository summary that staleness
/// detection compares against and the walker replaces wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    /// Total commits on the default branch, the staleness proxy.
    pub total_commits: u64,
    /// Commits attributed to the tracked identity.
    pub my_commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl CacheRecord {
    pub fn zeroed(key: String) -> Self {
        Self {
            key,
            total_commits: 0,
            my_commits: 0,
            lines_added: 0,
            lines_deleted: 0,
        }
    }
}

/// What one repository listing entry carries: identity plus the cheap
/// signals the rest of the pipeline wants (stars for the profile summary,
/// commit total for staleness). `total_commits` is `None` when the default
/// branch ref is absent, i.e. an empty repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOverview {
    pub name_with_owner: String,
    pub stars: u64,
    pub total_commits: Option<u64>,
}

/// Result of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_net: i64,
    /// True only when nothing had to be rebuilt or re-walked.
    pub fully_cached: bool,
}

/// A commit as the history walker sees it. `author_id` is the opaque
/// account identifier; `None` for commits whose author has no resolvable
/// account (deleted users), which never count toward the tracked identity.
#[derive(Debug, Clone)]
pub struct PageCommit {
    pub author_id: Option<String>,
    pub additions: u64,
    pub deletions: u64,
}

/// One page of a repository's commit history.
#[derive(Debug, Clone)]
pub struct CommitPage {
    pub commits: Vec<PageCommit>,
    pub end_cursor: Option<String>,
    pub has_next: bool,
}

/// Identity bootstrap result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Per-query-kind API call counters. An explicit accumulator owned by the
/// client rather than process-global state.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ApiTally {
    pub user: u32,
    pub followers: u32,
    pub repo_list: u32,
    pub commit_total: u32,
    pub commit_page: u32,
}

impl ApiTally {
    pub fn total(&self) -> u32 {
        self.user + self.followers + self.repo_list + self.commit_total + self.commit_page
    }
}

/// Totals read from the static archived/deleted-repository supplement.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveTotals {
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_net: i64,
    pub commits: u64,
    pub repos: u64,
}

/// Aggregate profile numbers, ready for printing or SVG rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub login: String,
    pub generated_at: DateTime<Utc>,
    pub account_age: String,
    pub commits: u64,
    pub stars: u64,
    pub repos: u64,
    pub contributed_repos: u64,
    pub followers: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_net: i64,
    pub fully_cached: bool,
}
