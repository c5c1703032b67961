use crate::cli::CommonArgs;
use crate::error::{GhtallyError, Result};
use crate::github::GitHubClient;
use crate::model::ProfileStats;
use crate::util::group_digits;
use anyhow::Context;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub fn exec(common: CommonArgs, templates: Vec<PathBuf>) -> anyhow::Result<()> {
    let login = common.login()?;
    let token = common.token()?;
    let mut client =
        GitHubClient::new(&login, &token).context("Failed to build the GitHub client")?;

    let collected = crate::stats::collect(&mut client, &common.cache_dir(), true)?;
    for template in &templates {
        render_svg(template, &collected.stats)
            .with_context(|| format!("Failed to render {}", template.display()))?;
        println!("updated {}", template.display());
    }
    Ok(())
}

/// Update a stats SVG template in place. The templates are fixed documents
/// whose dynamic values live in `<tspan id="...">` elements, each paired
/// with a `<tspan id="..._dots">` run of dots that keeps the right-hand
/// column aligned regardless of the value's width.
pub fn render_svg<P: AsRef<Path>>(path: P, stats: &ProfileStats) -> Result<()> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        GhtallyError::Svg(format!("cannot read template {}: {e}", path.display()))
    })?;
    let updated = apply_stats(&content, stats)?;
    fs::write(path, updated)?;
    Ok(())
}

/// Substitute every stats field into `svg`, returning the rewritten
/// document. Justification widths match the stock templates.
pub fn apply_stats(svg: &str, stats: &ProfileStats) -> Result<String> {
    let fields: [(&str, String, usize); 9] = [
        ("age_data", stats.account_age.clone(), 0),
        ("commit_data", group_digits(stats.commits), 22),
        ("star_data", group_digits(stats.stars), 14),
        ("repo_data", group_digits(stats.repos), 6),
        ("contrib_data", group_digits(stats.contributed_repos), 0),
        ("follower_data", group_digits(stats.followers), 10),
        ("loc_data", group_digits(stats.lines_net), 9),
        ("loc_add", group_digits(stats.lines_added), 0),
        ("loc_del", group_digits(stats.lines_deleted), 7),
    ];

    let mut out = svg.to_string();
    for (id, text, width) in fields {
        out = set_element_text(&out, id, &text)?;
        let dots_id = format!("{id}_dots");
        out = set_element_text(&out, &dots_id, &dot_run(width, text.chars().count()))?;
    }
    Ok(out)
}

/// Replace the text content of the first `<tspan>` carrying `id`. A missing
/// element is tolerated: templates are free to omit fields they don't show.
fn set_element_text(svg: &str, id: &str, text: &str) -> Result<String> {
    let pattern = format!(r#"(<tspan[^>]*\bid="{id}"[^>]*>)[^<]*(</tspan>)"#);
    let re = Regex::new(&pattern)
        .map_err(|e| GhtallyError::Svg(format!("bad element pattern for {id}: {e}")))?;
    Ok(re
        .replacen(svg, 1, format!("${{1}}{text}${{2}}").as_str())
        .into_owned())
}

/// Dot padding that fills `width` minus the rendered value. Short gaps get
/// bare spacing, longer ones a spaced dot run, matching the templates'
/// hand-tuned look.
fn dot_run(width: usize, text_len: usize) -> String {
    match width.saturating_sub(text_len) {
        0 => String::new(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => format!(" {} ", ".".repeat(n)),
    }
}
