use crate::error::{GhtallyError, Result};
use crate::model::{ApiTally, CommitPage, PageCommit, RepoOverview, UserProfile};
use crate::sync::HistorySource;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const CALL_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 4;
const BACKOFF_BASE_MS: u64 = 500;

/// Repositories the tracked identity owns or contributes to.
pub const ALL_AFFILIATIONS: &[&str] = &["OWNER", "COLLABORATOR", "ORGANIZATION_MEMBER"];
pub const OWNER_ONLY: &[&str] = &["OWNER"];

// Larger pages 502 on big accounts, smaller ones burn the rate limit.
const REPO_PAGE_SIZE: u32 = 60;
const COMMIT_PAGE_SIZE: u32 = 100;

/// Blocking GraphQL client for the GitHub v4 API. Transient transport
/// failures and 5xx responses are retried with exponential backoff; 401 and
/// 403 are surfaced immediately as distinct errors so callers can tell a
/// credential problem from a rate limit.
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    token: String,
    login: String,
    /// Commit totals observed by the repository listing, so the per-repo
    /// staleness signal usually costs no extra round trip.
    known_totals: HashMap<String, Option<u64>>,
    pub tally: ApiTally,
}

impl GitHubClient {
    pub fn new(login: &str, token: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(CALL_TIMEOUT)
            .user_agent(concat!("ghtally/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            token: token.to_string(),
            login: login.to_string(),
            known_totals: HashMap::new(),
            tally: ApiTally::default(),
        })
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Account id and creation date for the tracked login. The id is the
    /// opaque identifier commit authorship is matched against.
    pub fn user_profile(&mut self) -> Result<UserProfile> {
        self.tally.user += 1;
        let data: UserData = self.graphql(USER_QUERY, json!({ "login": self.login }))?;
        Ok(UserProfile {
            id: data.user.id,
            created_at: data.user.created_at,
        })
    }

    pub fn follower_count(&mut self) -> Result<u64> {
        self.tally.followers += 1;
        let data: FollowerData = self.graphql(FOLLOWERS_QUERY, json!({ "login": self.login }))?;
        Ok(data.user.followers.total_count)
    }

    /// Every repository visible under `affiliations`, in server order, with
    /// star and commit-total signals. Paginated at 60 per page.
    pub fn repositories(&mut self, affiliations: &[&str]) -> Result<Vec<RepoOverview>> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            self.tally.repo_list += 1;
            let data: RepoListData = self.graphql(
                REPO_LIST_QUERY,
                json!({
                    "owner_affiliation": affiliations,
                    "login": self.login,
                    "cursor": cursor,
                    "page_size": REPO_PAGE_SIZE,
                }),
            )?;
            let page = data.user.repositories;
            for edge in page.edges {
                let node = edge.node;
                let total = node
                    .default_branch_ref
                    .and_then(|r| r.target)
                    .and_then(|t| t.history)
                    .map(|h| h.total_count);
                self.known_totals
                    .insert(node.name_with_owner.clone(), total);
                out.push(RepoOverview {
                    name_with_owner: node.name_with_owner,
                    stars: node.stargazer_count,
                    total_commits: total,
                });
            }
            match (page.page_info.has_next_page, page.page_info.end_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(out)
    }

    /// POST one GraphQL document, retrying transport failures and 5xx up to
    /// `MAX_ATTEMPTS` times with exponential backoff.
    fn graphql<T: DeserializeOwned>(&self, query: &'static str, variables: Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let mut attempt = 0;
        loop {
            attempt += 1;
            let retryable = match self
                .http
                .post(GRAPHQL_ENDPOINT)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let envelope: Envelope<T> = resp.json()?;
                        if let Some(errors) = envelope.errors {
                            if !errors.is_empty() {
                                let joined = errors
                                    .iter()
                                    .map(|e| e.message.as_str())
                                    .collect::<Vec<_>>()
                                    .join("; ");
                                return Err(GhtallyError::Graphql(joined));
                            }
                        }
                        return envelope
                            .data
                            .ok_or_else(|| GhtallyError::Graphql("response carried no data".into()));
                    }
                    let code = status.as_u16();
                    let text = resp.text().unwrap_or_default();
                    match code {
                        401 => {
                            return Err(GhtallyError::Unauthorized {
                                endpoint: GRAPHQL_ENDPOINT,
                            })
                        }
                        403 => return Err(GhtallyError::RateLimited(text)),
                        c if (500..600).contains(&c) => GhtallyError::Api {
                            status: c,
                            body: text,
                        },
                        c => {
                            return Err(GhtallyError::Api {
                                status: c,
                                body: text,
                            })
                        }
                    }
                }
                Err(e) => GhtallyError::Http(e),
            };
            if attempt >= MAX_ATTEMPTS {
                return Err(retryable);
            }
            thread::sleep(Duration::from_millis(BACKOFF_BASE_MS << (attempt - 1)));
        }
    }
}

fn split_repo_name(name_with_owner: &str) -> Result<(&str, &str)> {
    name_with_owner
        .split_once('/')
        .ok_or_else(|| GhtallyError::InvalidRepoName(name_with_owner.to_string()))
}

impl HistorySource for GitHubClient {
    fn commit_total(&mut self, name_with_owner: &str) -> Result<Option<u64>> {
        if let Some(&total) = self.known_totals.get(name_with_owner) {
            return Ok(total);
        }
        let (owner, name) = split_repo_name(name_with_owner)?;
        self.tally.commit_total += 1;
        let data: RepoData<TotalBranchRef> =
            self.graphql(COMMIT_TOTAL_QUERY, json!({ "owner": owner, "name": name }))?;
        let total = data
            .repository
            .and_then(|r| r.default_branch_ref)
            .and_then(|r| r.target)
            .and_then(|t| t.history)
            .map(|h| h.total_count);
        self.known_totals
            .insert(name_with_owner.to_string(), total);
        Ok(total)
    }

    fn commit_page(
        &mut self,
        name_with_owner: &str,
        cursor: Option<&str>,
    ) -> Result<CommitPage> {
        let (owner, name) = split_repo_name(name_with_owner)?;
        self.tally.commit_page += 1;
        let data: RepoData<PageBranchRef> = self.graphql(
            COMMIT_PAGE_QUERY,
            json!({
                "owner": owner,
                "name": name,
                "cursor": cursor,
                "page_size": COMMIT_PAGE_SIZE,
            }),
        )?;
        let history = data
            .repository
            .and_then(|r| r.default_branch_ref)
            .and_then(|r| r.target)
            .and_then(|t| t.history);
        let Some(history) = history else {
            // Branch ref vanished between the staleness check and the walk;
            // treat as an empty history rather than an error.
            return Ok(CommitPage {
                commits: Vec::new(),
                end_cursor: None,
                has_next: false,
            });
        };
        Ok(CommitPage {
            commits: history
                .edges
                .into_iter()
                .map(|edge| PageCommit {
                    author_id: edge.node.author.and_then(|a| a.user).map(|u| u.id),
                    additions: edge.node.additions,
                    deletions: edge.node.deletions,
                })
                .collect(),
            end_cursor: history.page_info.end_cursor,
            has_next: history.page_info.has_next_page,
        })
    }
}

const USER_QUERY: &str = r#"
query ($login: String!) {
    user(login: $login) {
        id
        createdAt
    }
}"#;

const FOLLOWERS_QUERY: &str = r#"
query ($login: String!) {
    user(login: $login) {
        followers {
            totalCount
        }
    }
}"#;

const REPO_LIST_QUERY: &str = r#"
query ($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String, $page_size: Int!) {
    user(login: $login) {
        repositories(first: $page_size, after: $cursor, ownerAffiliations: $owner_affiliation) {
            edges {
                node {
                    nameWithOwner
                    stargazerCount
                    defaultBranchRef {
                        target {
                            ... on Commit {
                                history {
                                    totalCount
                                }
                            }
                        }
                    }
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}"#;

const COMMIT_TOTAL_QUERY: &str = r#"
query ($owner: String!, $name: String!) {
    repository(owner: $owner, name: $name) {
        defaultBranchRef {
            target {
                ... on Commit {
                    history {
                        totalCount
                    }
                }
            }
        }
    }
}"#;

const COMMIT_PAGE_QUERY: &str = r#"
query ($owner: String!, $name: String!, $cursor: String, $page_size: Int!) {
    repository(owner: $owner, name: $name) {
        defaultBranchRef {
            target {
                ... on Commit {
                    history(first: $page_size, after: $cursor) {
                        edges {
                            node {
                                additions
                                deletions
                                author {
                                    user {
                                        id
                                    }
                                }
                            }
                        }
                        pageInfo {
                            endCursor
                            hasNextPage
                        }
                    }
                }
            }
        }
    }
}"#;

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlErrorItem>>,
}

#[derive(Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

#[derive(Deserialize)]
struct UserData {
    user: UserNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    id: String,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct FollowerData {
    user: FollowerUser,
}

#[derive(Deserialize)]
struct FollowerUser {
    followers: TotalCount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

#[derive(Deserialize)]
struct RepoListData {
    user: RepoListUser,
}

#[derive(Deserialize)]
struct RepoListUser {
    repositories: RepoConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoConnection {
    edges: Vec<RepoEdge>,
    page_info: PageInfoDto,
}

#[derive(Deserialize)]
struct RepoEdge {
    node: RepoNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoNode {
    name_with_owner: String,
    stargazer_count: u64,
    default_branch_ref: Option<TotalBranchRef>,
}

#[derive(Deserialize)]
struct RepoData<R> {
    repository: Option<RepoBranch<R>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoBranch<R> {
    default_branch_ref: Option<R>,
}

#[derive(Deserialize)]
struct TotalBranchRef {
    target: Option<TotalTarget>,
}

#[derive(Deserialize)]
struct TotalTarget {
    history: Option<TotalCount>,
}

#[derive(Deserialize)]
struct PageBranchRef {
    target: Option<PageTarget>,
}

#[derive(Deserialize)]
struct PageTarget {
    history: Option<HistoryPage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPage {
    edges: Vec<HistoryEdge>,
    page_info: PageInfoDto,
}

#[derive(Deserialize)]
struct HistoryEdge {
    node: HistoryNode,
}

#[derive(Deserialize)]
struct HistoryNode {
    additions: u64,
    deletions: u64,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    user: Option<AuthorUser>,
}

#[derive(Deserialize)]
struct AuthorUser {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfoDto {
    end_cursor: Option<String>,
    has_next_page: bool,
}
