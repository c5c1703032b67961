use chrono::{Datelike, NaiveDate};

/// "s" when a count doesn't read as singular.
pub fn plural(count: u32) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Thousands-separated decimal rendering, e.g. 1234567 -> "1,234,567".
pub fn group_digits<N: Into<i128>>(n: N) -> String {
    let n = n.into();
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    if n < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    if first > 0 {
        out.push_str(&digits[..first]);
    }
    for (i, chunk) in digits.as_bytes()[first..].chunks(3).enumerate() {
        if first > 0 || i > 0 {
            out.push(',');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
    }
    out
}

/// Calendar span between two dates as whole (years, months, days), the way
/// a person would state an age.
pub fn calendar_span(from: NaiveDate, to: NaiveDate) -> (u32, u32, u32) {
    if to <= from {
        return (0, 0, 0);
    }
    let mut years = to.year() - from.year();
    let mut months = to.month() as i32 - from.month() as i32;
    let mut days = to.day() as i32 - from.day() as i32;
    if days < 0 {
        months -= 1;
        let (py, pm) = if to.month() == 1 {
            (to.year() - 1, 12)
        } else {
            (to.year(), to.month() - 1)
        };
        days += days_in_month(py, pm) as i32;
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }
    (years.max(0) as u32, months as u32, days as u32)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// "X years, Y months, Z days" since `from`, with a cake on the exact
/// anniversary.
pub fn age_text(from: NaiveDate, to: NaiveDate) -> String {
    let (years, months, days) = calendar_span(from, to);
    let cake = if months == 0 && days == 0 && years > 0 {
        " 🎂"
    } else {
        ""
    };
    format!(
        "{} year{}, {} month{}, {} day{}{}",
        years,
        plural(years),
        months,
        plural(months),
        days,
        plural(days),
        cake
    )
}
