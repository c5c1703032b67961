use chrono::{NaiveDate, Utc};
use ghtally::archive::{read_archive, ARCHIVE_FILE};
use ghtally::model::ProfileStats;
use ghtally::svg::apply_stats;
use ghtally::util::{age_text, calendar_span, group_digits};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn stats() -> ProfileStats {
    ProfileStats {
        login: "octocat".to_string(),
        generated_at: Utc::now(),
        account_age: "3 years, 1 month, 12 days".to_string(),
        commits: 1234,
        stars: 56,
        repos: 9,
        contributed_repos: 21,
        followers: 7,
        lines_added: 120_000,
        lines_deleted: 20_000,
        lines_net: 100_000,
        fully_cached: true,
    }
}

const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
<text>
<tspan id="age_data">??</tspan>
<tspan id="commit_data_dots"> .... </tspan><tspan id="commit_data" class="value">0</tspan>
<tspan id="star_data_dots"></tspan><tspan id="star_data">0</tspan>
<tspan id="repo_data_dots"></tspan><tspan id="repo_data">0</tspan>
<tspan id="contrib_data">0</tspan>
<tspan id="follower_data_dots"></tspan><tspan id="follower_data">0</tspan>
<tspan id="loc_data_dots"></tspan><tspan id="loc_data">0</tspan>
<tspan id="loc_add">0</tspan>, <tspan id="loc_del_dots"></tspan><tspan id="loc_del">0</tspan>
</text>
</svg>"#;

#[test]
fn svg_values_are_substituted_with_grouping() {
    let out = apply_stats(TEMPLATE, &stats()).unwrap();
    assert!(out.contains(r#"<tspan id="age_data">3 years, 1 month, 12 days</tspan>"#));
    assert!(out.contains(r#"<tspan id="commit_data" class="value">1,234</tspan>"#));
    assert!(out.contains(r#"<tspan id="star_data">56</tspan>"#));
    assert!(out.contains(r#"<tspan id="loc_data">100,000</tspan>"#));
    assert!(out.contains(r#"<tspan id="loc_add">120,000</tspan>"#));
    assert!(out.contains(r#"<tspan id="loc_del">20,000</tspan>"#));
}

#[test]
fn svg_dot_runs_justify_to_template_widths() {
    let out = apply_stats(TEMPLATE, &stats()).unwrap();
    // commit column is 22 wide; "1,234" leaves 17 dots, space-padded.
    assert!(out.contains(&format!(
        r#"<tspan id="commit_data_dots"> {} </tspan>"#,
        ".".repeat(17)
    )));
    // follower column is 10 wide; "7" leaves 9 dots.
    assert!(out.contains(&format!(
        r#"<tspan id="follower_data_dots"> {} </tspan>"#,
        ".".repeat(9)
    )));
    // loc_del column is 7 wide; "20,000" leaves a single space.
    assert!(out.contains(r#"<tspan id="loc_del_dots"> </tspan>"#));
}

#[test]
fn svg_missing_elements_are_tolerated() {
    let sparse = r#"<svg><tspan id="loc_data">0</tspan></svg>"#;
    let out = apply_stats(sparse, &stats()).unwrap();
    assert_eq!(out, r#"<svg><tspan id="loc_data">100,000</tspan></svg>"#);
}

#[test]
fn digit_grouping() {
    assert_eq!(group_digits(0u64), "0");
    assert_eq!(group_digits(999u64), "999");
    assert_eq!(group_digits(1000u64), "1,000");
    assert_eq!(group_digits(1_234_567u64), "1,234,567");
    assert_eq!(group_digits(-1_234i64), "-1,234");
}

#[test]
fn calendar_span_borrows_across_month_and_year() {
    let from = NaiveDate::from_ymd_opt(2019, 11, 3).unwrap();
    assert_eq!(
        calendar_span(from, NaiveDate::from_ymd_opt(2022, 11, 3).unwrap()),
        (3, 0, 0)
    );
    assert_eq!(
        calendar_span(from, NaiveDate::from_ymd_opt(2022, 11, 2).unwrap()),
        (2, 11, 30)
    );
    assert_eq!(
        calendar_span(from, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        (0, 1, 29)
    );
}

#[test]
fn age_text_marks_the_anniversary() {
    let from = NaiveDate::from_ymd_opt(2019, 11, 3).unwrap();
    let to = NaiveDate::from_ymd_opt(2022, 11, 3).unwrap();
    assert_eq!(age_text(from, to), "3 years, 0 months, 0 days 🎂");
    let plain = age_text(from, NaiveDate::from_ymd_opt(2022, 12, 4).unwrap());
    assert_eq!(plain, "3 years, 1 month, 1 day");
}

#[test]
fn archive_sums_records_and_footer_commits() {
    let dir = tempdir().unwrap();
    let mut content = String::new();
    for i in 0..7 {
        content.push_str(&format!("archive header {i}\n"));
    }
    content.push_str("hash1 40 12 1000 400\n");
    content.push_str("hash2 9 3 50 20\n");
    content.push_str("footer line one\n");
    content.push_str("footer line two\n");
    content.push_str("grand total commit count: 17,\n");
    fs::write(dir.path().join(ARCHIVE_FILE), content).unwrap();

    let totals = read_archive(dir.path()).unwrap();
    assert_eq!(totals.repos, 2);
    assert_eq!(totals.lines_added, 1050);
    assert_eq!(totals.lines_deleted, 420);
    assert_eq!(totals.lines_net, 630);
    assert_eq!(totals.commits, 12 + 3 + 17);
}

#[test]
fn missing_archive_contributes_nothing() {
    let dir = tempdir().unwrap();
    let totals = read_archive(dir.path()).unwrap();
    assert_eq!(totals, ghtally::model::ArchiveTotals::default());
}
