use crate::error::{GhtallyError, Result};
use anyhow::Result as AnyResult;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghtally")]
#[command(about = "Incremental lines-of-code statistics for a GitHub identity")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "USER_NAME", help = "GitHub login to track")]
    pub user: Option<String>,

    #[arg(
        long,
        env = "ACCESS_TOKEN",
        hide_env_values = true,
        help = "Personal access token with repository read permissions"
    )]
    pub token: Option<String>,

    #[arg(long, help = "Directory holding the cache store")]
    pub cache: Option<PathBuf>,
}

impl CommonArgs {
    pub fn login(&self) -> Result<String> {
        self.user.clone().ok_or(GhtallyError::MissingUser)
    }

    pub fn token(&self) -> Result<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .ok_or(GhtallyError::MissingToken)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache.clone().unwrap_or_else(|| PathBuf::from("cache"))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring the lines-of-code cache up to date and print the totals
    Sync {
        #[arg(long, help = "Discard the cache and recompute every repository")]
        force: bool,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Full profile statistics with per-phase timing
    Stats {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Write fresh statistics into SVG template files
    Render {
        #[arg(required = true, help = "SVG templates to update in place")]
        templates: Vec<PathBuf>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> AnyResult<()> {
        match self.command {
            Commands::Sync { force, json } => crate::sync::exec(self.common, force, json),
            Commands::Stats { json } => crate::stats::exec(self.common, json),
            Commands::Render { templates } => crate::svg::exec(self.common, templates),
        }
    }
}
