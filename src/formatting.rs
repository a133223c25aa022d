use chrono::{DateTime, Datelike, Local, Months, NaiveDate, TimeZone, Utc};

/// Search list dates, e.g. "Mar 4, '24".
pub const SEARCH_DATE_PATTERN: &str = "%b %-d, '%y";
/// Detail screen dates, e.g. "Mar 4, 2024 at 09:15".
pub const DETAIL_DATE_PATTERN: &str = "%b %-d, %Y at %H:%M";

/// Formats epoch seconds with a strftime pattern in the system time zone.
pub fn format_epoch(epoch_sec: i64, pattern: &str) -> String {
    format_epoch_in(epoch_sec, pattern, &Local)
}

pub fn format_epoch_in<Tz>(epoch_sec: i64, pattern: &str, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match zone.timestamp_opt(epoch_sec, 0).earliest() {
        Some(moment) => moment.format(pattern).to_string(),
        None => String::new(),
    }
}

/// "3 years, 2 months ago" style age of a timestamp relative to now.
pub fn time_ago(epoch_sec: i64) -> String {
    time_ago_at(epoch_sec, Local::now(), 2)
}

pub fn time_ago_at<Tz: TimeZone>(epoch_sec: i64, now: DateTime<Tz>, max_parts: usize) -> String {
    let zone = now.timezone();
    let Some(then) = zone.timestamp_opt(epoch_sec, 0).earliest() else {
        return "just now".to_string();
    };
    if then >= now {
        return "just now".to_string();
    }

    let (years, months, days) = calendar_period(then.date_naive(), now.date_naive());
    let mut parts = Vec::new();
    if years > 0 {
        parts.push(plural(years as i64, "year"));
    }
    if months > 0 && parts.len() < max_parts {
        parts.push(plural(months as i64, "month"));
    }
    if parts.is_empty() && days > 0 {
        parts.push(plural(days as i64, "day"));
    }
    if !parts.is_empty() {
        parts.truncate(max_parts);
        return format!("{} ago", parts.join(", "));
    }

    let elapsed = now.with_timezone(&Utc) - then.with_timezone(&Utc);
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes() % 60;
    if hours >= 1 {
        parts.push(plural(hours, "hour"));
        if minutes > 0 && parts.len() < max_parts {
            parts.push(plural(minutes, "minute"));
        }
        return format!("{} ago", parts.join(", "));
    }
    if elapsed.num_minutes() >= 1 {
        return format!("{} ago", plural(elapsed.num_minutes(), "minute"));
    }
    "just now".to_string()
}

/// Years, months and days between two dates, `start <= end`, counting whole
/// calendar months first and the remaining days after.
fn calendar_period(start: NaiveDate, end: NaiveDate) -> (u32, u32, u32) {
    let mut total_months =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut days = end.day() as i64 - start.day() as i64;
    if total_months > 0 && days < 0 {
        total_months -= 1;
        let anchor = start
            .checked_add_months(Months::new(total_months as u32))
            .unwrap_or(start);
        days = (end - anchor).num_days();
    }
    let total_months = total_months.max(0) as u32;
    (total_months / 12, total_months % 12, days.max(0) as u32)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Groups digits with commas: 1234567 -> "1,234,567".
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Short counts: 950 -> "950", 1500 -> "1.5k", 2000000 -> "2m".
pub fn format_compact(value: i64) -> String {
    if value >= 1_000_000 {
        format!("{}m", one_decimal_or_int(value as f64 / 1_000_000.0))
    } else if value >= 1_000 {
        format!("{}k", one_decimal_or_int(value as f64 / 1_000.0))
    } else {
        format_thousands(value)
    }
}

fn one_decimal_or_int(value: f64) -> String {
    let scaled = (value * 10.0).round() as i64;
    if scaled % 10 == 0 {
        format!("{}", scaled / 10)
    } else {
        format!("{:.1}", scaled as f64 / 10.0)
    }
}

pub fn format_votes(score: i32) -> String {
    if score == 1 || score == -1 {
        format!("{} vote", score)
    } else {
        format!("{} votes", score)
    }
}

pub fn format_views(views: i32) -> String {
    if views == 1 {
        "1 view".to_string()
    } else {
        format!("{} views", format_compact(views as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn patterns_format_in_zone() {
        let moment = utc(2024, 3, 4, 9, 15).timestamp();
        assert_eq!(format_epoch_in(moment, SEARCH_DATE_PATTERN, &Utc), "Mar 4, '24");
        assert_eq!(format_epoch_in(moment, DETAIL_DATE_PATTERN, &Utc), "Mar 4, 2024 at 09:15");
    }

    #[test]
    fn time_ago_future_and_recent() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(time_ago_at((now + Duration::minutes(5)).timestamp(), now, 2), "just now");
        assert_eq!(time_ago_at((now - Duration::seconds(30)).timestamp(), now, 2), "just now");
        assert_eq!(time_ago_at((now - Duration::minutes(1)).timestamp(), now, 2), "1 minute ago");
        assert_eq!(time_ago_at((now - Duration::minutes(42)).timestamp(), now, 2), "42 minutes ago");
    }

    #[test]
    fn time_ago_hours_and_minutes() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(time_ago_at(utc(2024, 6, 1, 9, 30).timestamp(), now, 2), "2 hours, 30 minutes ago");
        assert_eq!(time_ago_at(utc(2024, 6, 1, 11, 0).timestamp(), now, 2), "1 hour ago");
        assert_eq!(time_ago_at(utc(2024, 6, 1, 9, 30).timestamp(), now, 1), "2 hours ago");
    }

    #[test]
    fn time_ago_calendar_parts() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(time_ago_at(utc(2024, 5, 29, 12, 0).timestamp(), now, 2), "3 days ago");
        assert_eq!(time_ago_at(utc(2024, 4, 1, 12, 0).timestamp(), now, 2), "2 months ago");
        assert_eq!(time_ago_at(utc(2021, 3, 15, 12, 0).timestamp(), now, 2), "3 years, 2 months ago");
        assert_eq!(time_ago_at(utc(2021, 3, 15, 12, 0).timestamp(), now, 1), "3 years ago");
        // Days are dropped once a larger unit is present
        assert_eq!(time_ago_at(utc(2023, 5, 20, 12, 0).timestamp(), now, 2), "1 year ago");
    }

    #[test]
    fn calendar_period_borrows_month() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(calendar_period(start, end), (0, 1, 1));
    }

    #[test]
    fn numbers() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-12345), "-12,345");
        assert_eq!(format_compact(950), "950");
        assert_eq!(format_compact(1500), "1.5k");
        assert_eq!(format_compact(2000), "2k");
        assert_eq!(format_compact(2_000_000), "2m");
        assert_eq!(format_votes(1), "1 vote");
        assert_eq!(format_votes(12), "12 votes");
        assert_eq!(format_views(1), "1 view");
        assert_eq!(format_views(12_300), "12.3k views");
    }
}
