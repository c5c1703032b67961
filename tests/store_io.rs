use ghtally::model::{repo_key, CacheRecord};
use ghtally::store::{CacheStore, HEADER_LINES};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn record(name: &str, total: u64, mine: u64, added: u64, deleted: u64) -> CacheRecord {
    CacheRecord {
        key: repo_key(name),
        total_commits: total,
        my_commits: mine,
        lines_added: added,
        lines_deleted: deleted,
    }
}

#[test]
fn missing_file_is_created_with_default_header() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));

    let (header, records) = store.load().unwrap();
    assert_eq!(header.len(), HEADER_LINES);
    assert!(records.is_empty());
    assert!(store.path().exists());

    // A second load sees exactly what the first one created.
    let (header_again, _) = store.load().unwrap();
    assert_eq!(header, header_again);
}

#[test]
fn roundtrip_preserves_header_bytes_and_records() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));
    let header: Vec<String> = vec![
        "╔═ lines-of-code cache ═╗".to_string(),
        "".to_string(),
        "  free text, any shape   ".to_string(),
        "tabs\tand trailing spaces  ".to_string(),
        "4".to_string(),
        "5".to_string(),
        "6".to_string(),
    ];
    let records = vec![record("me/a", 12, 4, 100, 30), record("me/b", 1, 0, 0, 0)];

    store.write(&header, &records).unwrap();
    let (header_after, records_after) = store.load().unwrap();

    assert_eq!(header_after, header);
    assert_eq!(records_after, records);
}

#[test]
fn record_lines_use_the_fixed_field_order() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));
    let header: Vec<String> = (0..HEADER_LINES).map(|_| "#".to_string()).collect();
    store.write(&header, &[record("me/a", 12, 4, 100, 30)]).unwrap();

    let content = fs::read_to_string(store.path()).unwrap();
    let line = content.lines().nth(HEADER_LINES).unwrap();
    assert_eq!(line, format!("{} 12 4 100 30", repo_key("me/a")));
}

#[test]
fn malformed_record_lines_are_dropped() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));
    let mut content = String::new();
    for _ in 0..HEADER_LINES {
        content.push_str("# header\n");
    }
    content.push_str(&format!("{} 3 2 10 5\n", repo_key("me/a")));
    content.push_str("not a record at all\n");
    content.push_str(&format!("{} 1 1 oops 0\n", repo_key("me/b")));
    content.push_str(&format!("{} 1 1 2 3 extra\n", repo_key("me/c")));
    fs::write(store.path(), content).unwrap();

    let (_, records) = store.load().unwrap();
    assert_eq!(records, vec![record("me/a", 3, 2, 10, 5)]);
}

#[test]
fn write_leaves_no_stray_temp_files() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));
    let header: Vec<String> = (0..HEADER_LINES).map(|_| "#".to_string()).collect();
    store.write(&header, &[record("me/a", 1, 1, 1, 1)]).unwrap();
    store.write(&header, &[record("me/a", 2, 2, 2, 2)]).unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("store.txt")]);
}

#[test]
fn persist_partial_saves_without_erroring() {
    let dir = tempdir().unwrap();
    let store = CacheStore::at_path(dir.path().join("store.txt"));
    let header: Vec<String> = (0..HEADER_LINES).map(|_| "#".to_string()).collect();
    store.write(&header, &[record("me/a", 5, 5, 5, 5)]).unwrap();

    store.persist_partial(&header, &[record("me/a", 9, 9, 9, 9)]);

    let (_, records) = store.load().unwrap();
    assert_eq!(records, vec![record("me/a", 9, 9, 9, 9)]);
}

#[test]
fn for_login_derives_distinct_paths_per_identity() {
    let dir = tempdir().unwrap();
    let a = CacheStore::for_login(dir.path(), "alice").unwrap();
    let b = CacheStore::for_login(dir.path(), "bob").unwrap();
    assert_ne!(a.path(), b.path());
    assert!(a.path().extension().is_some_and(|e| e == "txt"));
    // Deterministic: the same login always maps to the same file.
    let a_again = CacheStore::for_login(dir.path(), "alice").unwrap();
    assert_eq!(a.path(), a_again.path());
}
