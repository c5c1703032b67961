use crate::error::{GhtallyError, Result};
use crate::model::ArchiveTotals;
use std::fs;
use std::path::Path;

/// Hand-maintained supplement for repositories that were deleted upstream
/// but whose last-known numbers should still count. Same record layout as
/// the cache store, bracketed by a free-text header and a footer whose last
/// line carries a trailing commit total.
pub const ARCHIVE_FILE: &str = "repository_archive.txt";

const ARCHIVE_HEADER_LINES: usize = 7;
const ARCHIVE_FOOTER_LINES: usize = 3;

/// Read and sum the archive supplement under `cache_dir`. A missing file is
/// not an error: there is simply nothing to add.
pub fn read_archive<P: AsRef<Path>>(cache_dir: P) -> Result<ArchiveTotals> {
    let path = cache_dir.as_ref().join(ARCHIVE_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ArchiveTotals::default())
        }
        Err(e) => return Err(e.into()),
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < ARCHIVE_HEADER_LINES + ARCHIVE_FOOTER_LINES {
        return Err(GhtallyError::Archive(format!(
            "{}: too short to hold a header and footer",
            path.display()
        )));
    }

    let records = &lines[ARCHIVE_HEADER_LINES..lines.len() - ARCHIVE_FOOTER_LINES];
    let mut totals = ArchiveTotals {
        repos: records.len() as u64,
        ..ArchiveTotals::default()
    };
    for (idx, line) in records.iter().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(GhtallyError::Archive(format!(
                "{}:{}: expected 5 fields, found {}",
                path.display(),
                ARCHIVE_HEADER_LINES + idx + 1,
                fields.len()
            )));
        }
        if let Ok(commits) = fields[2].parse::<u64>() {
            totals.commits += commits;
        }
        totals.lines_added += fields[3].parse::<u64>().unwrap_or(0);
        totals.lines_deleted += fields[4].parse::<u64>().unwrap_or(0);
    }

    // The footer's closing line embeds a commit count for contributions the
    // record lines cannot express, with punctuation after the number.
    if let Some(last) = lines.last() {
        if let Some(token) = last.split_whitespace().nth(4) {
            let digits = token.trim_end_matches(|c: char| !c.is_ascii_digit());
            totals.commits += digits.parse::<u64>().unwrap_or(0);
        }
    }

    totals.lines_net = totals.lines_added as i64 - totals.lines_deleted as i64;
    Ok(totals)
}
