use crate::error::{GhtallyError, Result};
use crate::model::CacheRecord;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Number of free-text header lines at the top of every store file. The
/// block is opaque: preserved byte-for-byte across rewrites, never parsed.
pub const HEADER_LINES: usize = 7;

const DEFAULT_HEADER_LINE: &str =
    "# This line is a comment block. Write whatever you want here.";

/// Flat-file record store, one file per tracked identity. All rewrites go
/// through a temp file in the same directory followed by a single atomic
/// rename, so a reader never observes a half-written file.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Store for `login`, named from the login's digest so distinct
    /// identities never collide in a shared cache directory.
    pub fn for_login<P: AsRef<Path>>(cache_dir: P, login: &str) -> Result<Self> {
        fs::create_dir_all(cache_dir.as_ref())?;
        let mut hasher = Sha256::new();
        hasher.update(login.as_bytes());
        let path = cache_dir
            .as_ref()
            .join(format!("{:x}.txt", hasher.finalize()));
        Ok(Self { path })
    }

    /// Open a store at an exact path (tests, archive tooling).
    pub fn at_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the header block and all well-formed records. A missing file is
    /// created with the default header and no records. Malformed record
    /// lines are reported and dropped; the resulting count mismatch makes
    /// the synchronizer rebuild the skeleton on the same pass.
    pub fn load(&self) -> Result<(Vec<String>, Vec<CacheRecord>)> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let header: Vec<String> = (0..HEADER_LINES)
                    .map(|_| DEFAULT_HEADER_LINE.to_string())
                    .collect();
                self.write(&header, &[])?;
                return Ok((header, Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = content.lines().collect();
        let header: Vec<String> = lines
            .iter()
            .take(HEADER_LINES)
            .map(|l| l.to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, line) in lines.iter().enumerate().skip(HEADER_LINES) {
            match parse_record(line) {
                Some(record) => records.push(record),
                None => {
                    eprintln!(
                        "warning: {}:{}: malformed cache record, dropping it",
                        self.path.display(),
                        idx + 1
                    );
                }
            }
        }

        Ok((header, records))
    }

    /// Atomically replace the store with `header` + `records`.
    pub fn write(&self, header: &[String], records: &[CacheRecord]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(render(header, records).as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| GhtallyError::Cache(format!("atomic replace failed: {e}")))?;
        Ok(())
    }

    /// Crash guard: called from failure paths with whatever records were
    /// finalized before the failure. Tries the atomic path first, then a
    /// plain overwrite; reports the outcome and never raises, so the
    /// original failure stays the one the caller sees.
    pub fn persist_partial(&self, header: &[String], records: &[CacheRecord]) {
        match self.write(header, records) {
            Ok(()) => {
                eprintln!(
                    "sync aborted; partial progress saved to {}",
                    self.path.display()
                );
            }
            Err(atomic_err) => match fs::write(&self.path, render(header, records)) {
                Ok(()) => {
                    eprintln!(
                        "sync aborted; partial progress saved to {} without atomic replace ({atomic_err})",
                        self.path.display()
                    );
                }
                Err(e) => {
                    eprintln!(
                        "sync aborted and the cache at {} could not be saved: {e}",
                        self.path.display()
                    );
                }
            },
        }
    }
}

fn render(header: &[String], records: &[CacheRecord]) -> String {
    let mut out = String::new();
    for line in header {
        out.push_str(line);
        out.push('\n');
    }
    for r in records {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            r.key, r.total_commits, r.my_commits, r.lines_added, r.lines_deleted
        ));
    }
    out
}

fn parse_record(line: &str) -> Option<CacheRecord> {
    let mut fields = line.split_whitespace();
    let key = fields.next()?.to_string();
    let total_commits = fields.next()?.parse().ok()?;
    let my_commits = fields.next()?.parse().ok()?;
    let lines_added = fields.next()?.parse().ok()?;
    let lines_deleted = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(CacheRecord {
        key,
        total_commits,
        my_commits,
        lines_added,
        lines_deleted,
    })
}
