use crate::archive::read_archive;
use crate::cli::CommonArgs;
use crate::github::{GitHubClient, ALL_AFFILIATIONS, OWNER_ONLY};
use crate::model::{ApiTally, ProfileStats};
use crate::store::CacheStore;
use crate::sync::{total_authored_commits, Syncer};
use crate::util::{age_text, group_digits};
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::path::Path;
use std::time::{Duration, Instant};

pub struct Collected {
    pub stats: ProfileStats,
    pub timings: Vec<(&'static str, Duration)>,
}

/// Run the full profile refresh: identity bootstrap, repository listings,
/// cache sync, follower count, archive supplement. Each phase is timed so
/// the summary can show where a slow run spent its budget.
pub fn collect(
    client: &mut GitHubClient,
    cache_dir: &Path,
    progress: bool,
) -> anyhow::Result<Collected> {
    let mut timings: Vec<(&'static str, Duration)> = Vec::new();

    let profile = timed(&mut timings, "account data", || {
        client.user_profile().context("Failed to look up the user")
    })?;
    let account_age = age_text(profile.created_at.date_naive(), Utc::now().date_naive());

    let owned = timed(&mut timings, "owned repositories", || {
        client
            .repositories(OWNER_ONLY)
            .context("Failed to list owned repositories")
    })?;
    let contributed = timed(&mut timings, "all repositories", || {
        client
            .repositories(ALL_AFFILIATIONS)
            .context("Failed to list contributed repositories")
    })?;
    let stars: u64 = owned.iter().map(|r| r.stars).sum();

    let store = CacheStore::for_login(cache_dir, client.login())
        .context("Failed to open the cache store")?;
    let names: Vec<String> = contributed
        .iter()
        .map(|r| r.name_with_owner.clone())
        .collect();
    let owner_id = profile.id.clone();
    let outcome = timed(&mut timings, "lines of code", || {
        Syncer::new(&mut *client, &store, owner_id)
            .with_progress(progress)
            .sync(&names, false)
            .context("Sync pass failed")
    })?;
    let commits = timed(&mut timings, "commit total", || {
        total_authored_commits(&store).context("Failed to sum cached commits")
    })?;

    let followers = timed(&mut timings, "followers", || {
        client.follower_count().context("Failed to count followers")
    })?;

    let archive = timed(&mut timings, "archive", || {
        read_archive(cache_dir).context("Failed to read the repository archive")
    })?;

    let lines_added = outcome.lines_added + archive.lines_added;
    let lines_deleted = outcome.lines_deleted + archive.lines_deleted;
    let stats = ProfileStats {
        login: client.login().to_string(),
        generated_at: Utc::now(),
        account_age,
        commits: commits + archive.commits,
        stars,
        repos: owned.len() as u64,
        contributed_repos: contributed.len() as u64 + archive.repos,
        followers,
        lines_added,
        lines_deleted,
        lines_net: lines_added as i64 - lines_deleted as i64,
        fully_cached: outcome.fully_cached,
    };

    Ok(Collected { stats, timings })
}

fn timed<T, F>(
    timings: &mut Vec<(&'static str, Duration)>,
    label: &'static str,
    f: F,
) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let start = Instant::now();
    let out = f()?;
    timings.push((label, start.elapsed()));
    Ok(out)
}

pub fn exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let login = common.login()?;
    let token = common.token()?;
    let mut client =
        GitHubClient::new(&login, &token).context("Failed to build the GitHub client")?;

    let collected = collect(&mut client, &common.cache_dir(), !json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collected.stats)?);
        return Ok(());
    }

    print_timings(&collected.timings, &client.tally);
    println!();
    print_summary(&collected.stats);
    Ok(())
}

fn print_timings(timings: &[(&'static str, Duration)], tally: &ApiTally) {
    println!("{}", style("Calculation times:").bold());
    let mut total = Duration::ZERO;
    for (label, duration) in timings {
        total += *duration;
        println!("   {:<20}{:>12}", format!("{label}:"), fmt_duration(*duration));
    }
    println!("   {:<20}{:>12}", "total:", fmt_duration(total));
    println!("{} {:>3}", style("Total API calls:").bold(), tally.total());
    println!("   {:<20}{:>6}", "user:", tally.user);
    println!("   {:<20}{:>6}", "followers:", tally.followers);
    println!("   {:<20}{:>6}", "repo list:", tally.repo_list);
    println!("   {:<20}{:>6}", "commit total:", tally.commit_total);
    println!("   {:<20}{:>6}", "commit pages:", tally.commit_page);
}

fn fmt_duration(d: Duration) -> String {
    if d.as_secs_f64() > 1.0 {
        format!("{:.4} s", d.as_secs_f64())
    } else {
        format!("{:.4} ms", d.as_secs_f64() * 1000.0)
    }
}

fn print_summary(stats: &ProfileStats) {
    println!("{}", style(&stats.login).bold());
    println!("{}", "─".repeat(40));
    println!("Account age:   {}", stats.account_age);
    println!("Commits:       {}", style(group_digits(stats.commits)).cyan());
    println!("Stars:         {}", style(group_digits(stats.stars)).yellow());
    println!(
        "Repositories:  {} owned, {} contributed",
        group_digits(stats.repos),
        group_digits(stats.contributed_repos)
    );
    println!("Followers:     {}", group_digits(stats.followers));
    println!(
        "Lines of code: {} ({} {})",
        style(group_digits(stats.lines_net)).cyan(),
        style(format!("+{}", group_digits(stats.lines_added))).green(),
        style(format!("-{}", group_digits(stats.lines_deleted))).red()
    );
    if stats.fully_cached {
        println!("Cache:         {}", style("fully cached").dim());
    } else {
        println!("Cache:         {}", style("refreshed").yellow());
    }
}
