use thiserror::Error;

pub type Result<T> = std::result::Result<T, GhtallyError>;

#[derive(Error, Debug)]
pub enum GhtallyError {
    #[error("No access token: set ACCESS_TOKEN (or GITHUB_TOKEN) or pass --token")]
    MissingToken,
    #[error("No user login: set USER_NAME or pass --user")]
    MissingUser,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("401 Unauthorized from {endpoint}: check the access token and its permissions")]
    Unauthorized { endpoint: &'static str },
    #[error("403 Forbidden: API rate limit or anti-abuse trigger, try again later ({0})")]
    RateLimited(String),
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("GraphQL error: {0}")]
    Graphql(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Svg template error: {0}")]
    Svg(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid repository name (expected owner/name): {0}")]
    InvalidRepoName(String),
}
