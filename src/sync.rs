use crate::cli::CommonArgs;
use crate::error::Result;
use crate::github::{GitHubClient, ALL_AFFILIATIONS};
use crate::model::{repo_key, CacheRecord, CommitPage, SyncOutcome};
use crate::store::CacheStore;
use crate::util::group_digits;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// The seam between the sync engine and the remote history source. The
/// GitHub client implements it for real; tests drive the engine with an
/// in-memory fake.
pub trait HistorySource {
    /// Cheap staleness signal: total commits on the default branch, or
    /// `None` when the branch ref is absent (empty repository).
    fn commit_total(&mut self, name_with_owner: &str) -> Result<Option<u64>>;

    /// One page of commit history, up to 100 commits, following the opaque
    /// cursor from the previous page.
    fn commit_page(&mut self, name_with_owner: &str, cursor: Option<&str>)
        -> Result<CommitPage>;
}

#[derive(Debug, Default)]
struct RepoTotals {
    my_commits: u64,
    lines_added: u64,
    lines_deleted: u64,
}

pub struct Syncer<'a, S: HistorySource> {
    source: &'a mut S,
    store: &'a CacheStore,
    owner_id: String,
    progress: bool,
}

impl<'a, S: HistorySource> Syncer<'a, S> {
    pub fn new(source: &'a mut S, store: &'a CacheStore, owner_id: impl Into<String>) -> Self {
        Self {
            source,
            store,
            owner_id: owner_id.into(),
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Reconcile the store against `repos` and bring every stale record up
    /// to date. Any fatal remote failure aborts the whole pass after the
    /// crash guard has saved the records finalized so far; the repository
    /// being walked at that moment keeps its pre-walk record, never a
    /// partial sum.
    pub fn sync(&mut self, repos: &[String], force: bool) -> Result<SyncOutcome> {
        let (header, mut records) = self.store.load()?;
        let mut fully_cached = true;

        // Skeleton rebuild: repo set changed shape, or the caller forced it.
        // Persisted before any staleness check so a crash mid-pass can never
        // resurrect records for repositories that left the set.
        if records.len() != repos.len() || force {
            fully_cached = false;
            records = repos
                .iter()
                .map(|name| CacheRecord::zeroed(repo_key(name)))
                .collect();
            self.store.write(&header, &records)?;
        }

        let slot_by_key: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();

        let pb = if self.progress {
            let pb = ProgressBar::new(repos.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        for name in repos {
            pb.set_message(name.clone());
            let key = repo_key(name);
            let Some(&slot) = slot_by_key.get(&key) else {
                // Structural inconsistency between the store and the input;
                // skip the repository rather than crash. The next rebuild
                // heals it.
                eprintln!("warning: no cache record for {name}; skipping (run with --force to rebuild)");
                pb.inc(1);
                continue;
            };

            let total = match self.source.commit_total(name) {
                Ok(total) => total,
                Err(e) => {
                    pb.abandon();
                    self.store.persist_partial(&header, &records);
                    return Err(e);
                }
            };

            match total {
                None => {
                    // Branch ref absent: an empty repository sums to zero.
                    let zero = CacheRecord::zeroed(key);
                    if records[slot] != zero {
                        fully_cached = false;
                        records[slot] = zero;
                    }
                }
                Some(n) if n == records[slot].total_commits => {
                    // Cache hit; the stored summary is still valid.
                }
                Some(n) => {
                    fully_cached = false;
                    let totals = match self.walk(name) {
                        Ok(totals) => totals,
                        Err(e) => {
                            pb.abandon();
                            self.store.persist_partial(&header, &records);
                            return Err(e);
                        }
                    };
                    records[slot] = CacheRecord {
                        key,
                        total_commits: n,
                        my_commits: totals.my_commits,
                        lines_added: totals.lines_added,
                        lines_deleted: totals.lines_deleted,
                    };
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.store.write(&header, &records)?;

        let lines_added: u64 = records.iter().map(|r| r.lines_added).sum();
        let lines_deleted: u64 = records.iter().map(|r| r.lines_deleted).sum();
        Ok(SyncOutcome {
            lines_added,
            lines_deleted,
            lines_net: lines_added as i64 - lines_deleted as i64,
            fully_cached,
        })
    }

    /// Drain every page of `name`'s history, keeping only commits authored
    /// by the tracked identity. Iterative on purpose: page counts are
    /// unbounded.
    fn walk(&mut self, name: &str) -> Result<RepoTotals> {
        let mut totals = RepoTotals::default();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.source.commit_page(name, cursor.as_deref())?;
            for commit in &page.commits {
                if commit.author_id.as_deref() == Some(self.owner_id.as_str()) {
                    totals.my_commits += 1;
                    totals.lines_added += commit.additions;
                    totals.lines_deleted += commit.deletions;
                }
            }
            if page.commits.is_empty() || !page.has_next {
                break;
            }
            match page.end_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }
        Ok(totals)
    }
}

/// Sum of commits attributed to the tracked identity across all stored
/// records.
pub fn total_authored_commits(store: &CacheStore) -> Result<u64> {
    let (_, records) = store.load()?;
    Ok(records.iter().map(|r| r.my_commits).sum())
}

pub fn exec(common: CommonArgs, force: bool, json: bool) -> anyhow::Result<()> {
    let login = common.login()?;
    let token = common.token()?;
    let mut client =
        GitHubClient::new(&login, &token).context("Failed to build the GitHub client")?;

    let profile = client
        .user_profile()
        .context("Failed to look up the user's account id")?;
    let repos = client
        .repositories(ALL_AFFILIATIONS)
        .context("Failed to list repositories")?;
    let names: Vec<String> = repos.iter().map(|r| r.name_with_owner.clone()).collect();

    let store = CacheStore::for_login(common.cache_dir(), &login)
        .context("Failed to open the cache store")?;
    let outcome = Syncer::new(&mut client, &store, profile.id)
        .with_progress(!json)
        .sync(&names, force)
        .context("Sync pass failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        use console::style;
        println!("{}", style("Sync summary").bold());
        println!("{}", "─".repeat(40));
        println!("Repositories:  {}", style(names.len()).cyan());
        println!(
            "Lines added:   {}",
            style(group_digits(outcome.lines_added)).green()
        );
        println!(
            "Lines deleted: {}",
            style(group_digits(outcome.lines_deleted)).red()
        );
        println!("Net lines:     {}", style(group_digits(outcome.lines_net)).cyan());
        if outcome.fully_cached {
            println!("Cache:         {}", style("fully cached").dim());
        } else {
            println!("Cache:         {}", style("refreshed").yellow());
        }
    }

    Ok(())
}
