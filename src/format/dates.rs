use chrono::{DateTime, NaiveDateTime, Utc};

/// Renders an ISO 8601 timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
/// Input that does not parse is returned unchanged.
pub fn format_timestamp(timestamp: &str) -> String {
    const OUTPUT: &str = "%Y-%m-%d %H:%M:%S UTC";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.with_timezone(&Utc).format(OUTPUT).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(OUTPUT).to_string();
    }
    timestamp.to_string()
}

/// Vikunja reports unset dates as the zero time `0001-01-01T00:00:00Z`.
pub fn is_unset_date(timestamp: &str) -> bool {
    timestamp.is_empty() || timestamp.starts_with("0001-01-01")
}

const WEEKDAYS: [(&str, &str); 7] = [
    ("MO", "Mon"),
    ("TU", "Tue"),
    ("WE", "Wed"),
    ("TH", "Thu"),
    ("FR", "Fri"),
    ("SA", "Sat"),
    ("SU", "Sun"),
];

/// Describes an RFC 5545 RRULE in words, e.g. `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,FR`
/// becomes "Every 2 weeks on Mon, Fri". Unknown frequencies come back verbatim.
pub fn format_rrule(rrule: &str) -> String {
    if rrule.trim().is_empty() {
        return String::new();
    }

    let mut freq = String::new();
    let mut interval: u32 = 1;
    let mut by_day = None;
    let mut by_month_day = None;

    for part in rrule.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => freq = value.trim().to_ascii_uppercase(),
            "INTERVAL" => match value.trim().parse() {
                Ok(n) => interval = n,
                Err(_) => return rrule.to_string(),
            },
            "BYDAY" => by_day = Some(value.trim()),
            "BYMONTHDAY" => by_month_day = Some(value.trim()),
            _ => {}
        }
    }

    let (singular, plural) = match freq.as_str() {
        "DAILY" => ("day", "days"),
        "WEEKLY" => ("week", "weeks"),
        "MONTHLY" => ("month", "months"),
        "YEARLY" => ("year", "years"),
        _ => return rrule.to_string(),
    };

    let mut description = if interval == 1 {
        format!("Every {}", singular)
    } else {
        format!("Every {} {}", interval, plural)
    };

    if freq == "WEEKLY"
        && let Some(days) = by_day
    {
        let names: Vec<&str> = days
            .split(',')
            .map(|code| {
                WEEKDAYS
                    .iter()
                    .find(|(abbr, _)| abbr.eq_ignore_ascii_case(code.trim()))
                    .map(|(_, name)| *name)
                    .unwrap_or(code)
            })
            .collect();
        description.push_str(&format!(" on {}", names.join(", ")));
    }

    if freq == "MONTHLY"
        && let Some(day) = by_month_day
    {
        description.push_str(&format!(" on day {}", day));
    }

    description
}
